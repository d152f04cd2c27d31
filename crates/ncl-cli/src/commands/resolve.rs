use colored::Colorize;

use super::{LedgerArgs, find_id};

pub fn run(args: &LedgerArgs, id: &str, chapter: u32, text: &str) -> Result<(), String> {
    let mut ledger = args.open()?;
    let id = find_id(&ledger, id)?;
    let settlement = ledger
        .resolve_consequence(id, chapter, text)
        .map_err(|e| e.to_string())?;

    println!("  {} consequence {} in chapter {}", "Resolved".green(), id, chapter);
    let bets = settlement.won.len() + settlement.lost.len();
    if bets > 0 {
        println!(
            "  Settled {} bet(s): {} won, {} lost, payout {:.2}",
            bets,
            settlement.won.len(),
            settlement.lost.len(),
            settlement.total_payout
        );
    }

    Ok(())
}
