use colored::Colorize;

use super::{LedgerArgs, find_id};

pub fn run(
    args: &LedgerArgs,
    id: &str,
    bettor: &str,
    chapter: u32,
    amount: f64,
) -> Result<(), String> {
    let mut ledger = args.open()?;
    let id = find_id(&ledger, id)?;
    let bet = ledger
        .place_bet(id, bettor, chapter, amount)
        .map_err(|e| e.to_string())?;

    println!(
        "  {} {} bets {:.2} on chapter {} at x{} (potential payout {:.2})",
        "Placed".bold(),
        bet.bettor,
        bet.amount,
        bet.predicted_chapter,
        bet.multiplier,
        bet.amount * bet.multiplier
    );

    Ok(())
}
