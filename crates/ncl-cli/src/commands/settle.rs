use colored::Colorize;

use super::{LedgerArgs, find_id};

pub fn run(args: &LedgerArgs, id: &str) -> Result<(), String> {
    let mut ledger = args.open()?;
    let id = find_id(&ledger, id)?;
    let settlement = ledger.settle_pending(id).map_err(|e| e.to_string())?;

    let bets = settlement.won.len() + settlement.lost.len();
    if bets == 0 {
        println!("  No open bets on consequence {id}.");
        return Ok(());
    }
    println!(
        "  {} {} bet(s) on consequence {}: {} won, {} lost, payout {:.2}",
        "Settled".green(),
        bets,
        id,
        settlement.won.len(),
        settlement.lost.len(),
        settlement.total_payout
    );

    Ok(())
}
