use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::{LedgerArgs, truncate};

pub fn run(args: &LedgerArgs, chapter: u32) -> Result<(), String> {
    let mut ledger = args.open()?;
    let report = ledger.score_and_escalate(chapter).map_err(|e| e.to_string())?;

    let state = if report.is_crisis {
        "CRISIS".red().bold()
    } else {
        "STABLE".green()
    };
    println!(
        "  {} at chapter {}: {:.1} {} (trend {})",
        "Narrative debt".bold(),
        report.chapter,
        report.total_debt,
        state,
        report.trend
    );
    println!();

    if report.per_consequence.is_empty() {
        println!("  No active consequences.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Sev", "Status", "Window", "Debt", "Description"]);

    for (id, debt) in &report.per_consequence {
        let c = ledger.ledger().get(*id).map_err(|e| e.to_string())?;
        let window = if c.is_overdue(chapter) {
            format!("{} (overdue)", c.window)
        } else {
            c.window.to_string()
        };
        table.add_row(vec![
            id.to_string(),
            c.severity.to_string(),
            c.status.to_string(),
            window,
            format!("{debt:.1}"),
            truncate(&c.description, 60),
        ]);
    }
    println!("{table}");
    println!();

    if !report.debt_by_house.is_empty() {
        let houses: Vec<String> = report
            .debt_by_house
            .iter()
            .map(|(h, d)| format!("{h} {d:.1}"))
            .collect();
        println!("  By house: {}", houses.join(", "));
    }
    if !report.escalated.is_empty() {
        println!("  Escalated this chapter: {}", report.escalated.len());
    }
    println!("  {} active consequences", report.active_count());

    Ok(())
}
