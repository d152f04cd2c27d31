use comfy_table::{ContentArrangement, Table};
use ncl_core::house::join_houses;

use super::{LedgerArgs, truncate};

pub fn run(args: &LedgerArgs, all: bool) -> Result<(), String> {
    let ledger = args.open()?;
    let consequences: Vec<_> = ledger
        .ledger()
        .all()
        .iter()
        .filter(|c| all || c.is_active())
        .collect();

    if consequences.is_empty() {
        println!("  No consequences found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id",
        "Chapter",
        "Sev",
        "Status",
        "Window",
        "Houses",
        "Description",
    ]);

    for c in &consequences {
        table.add_row(vec![
            c.id.to_string(),
            c.chapter_origin.to_string(),
            c.severity.to_string(),
            c.status.to_string(),
            c.window.to_string(),
            join_houses(&c.houses_affected),
            truncate(&c.description, 60),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} consequences", consequences.len());

    Ok(())
}
