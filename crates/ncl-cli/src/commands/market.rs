use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::{LedgerArgs, find_id};

pub fn run(args: &LedgerArgs, id: &str) -> Result<(), String> {
    let mut ledger = args.open()?;
    let id = find_id(&ledger, id)?;
    let listing = ledger.open_market(id).map_err(|e| e.to_string())?;
    let c = ledger.ledger().get(id).map_err(|e| e.to_string())?;

    println!("  {} on {}: {}", "Market".bold(), id, c.description);
    println!("  Expected: {}", c.window);
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Option", "Multiplier"]);
    for window in &listing.windows {
        table.add_row(vec![window.option.to_string(), format!("x{}", window.multiplier)]);
    }
    println!("{table}");

    let open: Vec<_> = c.open_bets().collect();
    if !open.is_empty() {
        println!();
        println!("  {} open bet(s)", open.len());
        for bet in open {
            println!(
                "    {} on chapter {}: {:.2} at x{}",
                bet.bettor, bet.predicted_chapter, bet.amount, bet.multiplier
            );
        }
    }

    Ok(())
}
