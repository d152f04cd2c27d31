use colored::Colorize;
use ncl_core::house::join_houses;
use ncl_core::{ChapterResolved, House};

use super::LedgerArgs;

pub fn run(
    args: &LedgerArgs,
    chapter: u32,
    choice_ref: &str,
    choice_text: &str,
    houses: &[String],
    hint: Option<&str>,
) -> Result<(), String> {
    let houses = houses
        .iter()
        .map(|h| h.parse::<House>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    let mut ledger = args.open()?;
    let mut event = ChapterResolved::new(chapter, choice_ref, choice_text, houses);
    if let Some(hint) = hint {
        event = event.with_hint(hint);
    }
    let outcome = ledger.on_chapter_resolved(event).map_err(|e| e.to_string())?;
    let c = &outcome.consequence;

    println!("  {} consequence {}", "Recorded".bold(), c.id);
    println!("  {}", c.description);
    println!(
        "  Severity {} | Houses: {} | Expected: {}",
        c.severity,
        join_houses(&c.houses_affected),
        c.window
    );
    if !outcome.report.escalated.is_empty() {
        println!(
            "  {} {} overdue consequence(s)",
            "Escalated".yellow(),
            outcome.report.escalated.len()
        );
    }
    if outcome.report.is_crisis {
        println!(
            "  {} narrative debt {:.1}",
            "CRISIS".red().bold(),
            outcome.report.total_debt
        );
    }

    Ok(())
}
