//! Selection of consequences for the next chapter's generation prompt.
//!
//! Builds three budget-limited tiers from the active consequences and renders
//! them into a text block handed to the narrative generator.

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::consequence::Consequence;
use crate::debt::{DebtReport, NarrativeDebtEngine};
use crate::error::NclResult;
use crate::house::join_houses;
use crate::ledger::ConsequenceLedger;

/// Prompt context for one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterContext {
    /// Chapter being prepared.
    pub chapter: u32,
    /// Rendered block for the generator prompt.
    pub prompt_block: String,
    /// Consequences the chapter must resolve. Empty outside crisis.
    pub must_resolve: Vec<Consequence>,
    /// Consequences the chapter should address.
    pub should_address: Vec<Consequence>,
    /// Consequences the chapter may reference.
    pub may_reference: Vec<Consequence>,
    /// Total narrative debt at this chapter.
    pub debt_score: f64,
    /// Whether the story is in crisis.
    pub is_crisis: bool,
}

/// Builds [`ChapterContext`]s.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    engine: NarrativeDebtEngine,
}

impl ContextBuilder {
    /// Create a builder with the given thresholds and tier sizes.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            engine: NarrativeDebtEngine::new(config),
        }
    }

    fn config(&self) -> &LedgerConfig {
        self.engine.config()
    }

    /// Score the ledger (escalating overdue consequences) and build the context.
    pub fn build_chapter_context(
        &self,
        ledger: &mut ConsequenceLedger,
        chapter: u32,
    ) -> NclResult<ChapterContext> {
        let report = self.engine.score_and_escalate(ledger, chapter)?;
        Ok(self.select(ledger, &report))
    }

    /// Build the context from an already computed report. Performs no mutation.
    pub fn select(&self, ledger: &ConsequenceLedger, report: &DebtReport) -> ChapterContext {
        let chapter = report.chapter;
        let cfg = self.config();

        let mut sorted: Vec<&Consequence> = ledger.active_by_origin(chapter);
        sorted.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.is_overdue(chapter).cmp(&a.is_overdue(chapter)))
                .then_with(|| a.window.min_chapter.cmp(&b.window.min_chapter))
        });

        let must_resolve: Vec<&Consequence> = if report.is_crisis {
            sorted
                .iter()
                .copied()
                .filter(|c| c.severity >= 4)
                .take(cfg.must_resolve_limit)
                .collect()
        } else {
            Vec::new()
        };
        let mut rest = sorted
            .into_iter()
            .filter(|c| !must_resolve.iter().any(|m| m.id == c.id));
        let should_address: Vec<&Consequence> =
            rest.by_ref().take(cfg.should_address_limit).collect();
        let may_reference: Vec<&Consequence> = rest.take(cfg.may_reference_limit).collect();

        let prompt_block = self.render(
            report,
            &must_resolve,
            &should_address,
            &may_reference,
        );

        ChapterContext {
            chapter,
            prompt_block,
            must_resolve: must_resolve.into_iter().cloned().collect(),
            should_address: should_address.into_iter().cloned().collect(),
            may_reference: may_reference.into_iter().cloned().collect(),
            debt_score: report.total_debt,
            is_crisis: report.is_crisis,
        }
    }

    fn render(
        &self,
        report: &DebtReport,
        must: &[&Consequence],
        should: &[&Consequence],
        may: &[&Consequence],
    ) -> String {
        let chapter = report.chapter;
        let mut out = format!(
            "=== NARRATIVE DEBT: {:.1} {} ===\n\n",
            report.total_debt,
            if report.is_crisis { "CRISIS" } else { "STABLE" }
        );

        if report.is_crisis && !must.is_empty() {
            render_section(&mut out, "MUST RESOLVE THIS CHAPTER", must, chapter);
        }
        if !should.is_empty() {
            render_section(&mut out, "SHOULD ADDRESS", should, chapter);
        }
        if !may.is_empty() {
            render_section(&mut out, "MAY REFERENCE", may, chapter);
        }

        if let Some((house, debt)) = report.top_house() {
            if debt > self.config().house_pressure_threshold {
                out.push_str(&format!("HOUSE UNDER PRESSURE: {house} (debt {debt:.1})\n\n"));
            }
        }

        out.push_str("Do not introduce unrelated major consequences in this chapter.\n");
        out
    }
}

fn render_section(out: &mut String, title: &str, items: &[&Consequence], chapter: u32) {
    out.push_str(&format!("{title}:\n"));
    for c in items {
        let overdue = if c.is_overdue(chapter) { " [OVERDUE]" } else { "" };
        out.push_str(&format!("- [{}]{overdue} {}\n", c.id, c.description));
        out.push_str(&format!(
            "  Severity: {} | Houses: {} | Window: {}\n",
            severity_glyphs(c.severity),
            join_houses(&c.houses_affected),
            c.window
        ));
    }
    out.push('\n');
}

/// Five-slot filled/empty scale, e.g. `●●●○○` for severity 3.
pub fn severity_glyphs(severity: u8) -> String {
    let filled = usize::from(severity.min(5));
    format!("{}{}", "●".repeat(filled), "○".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::house::House;
    use crate::impact::{ImpactClassifier, ImpactVector};
    use crate::recorder::ConsequenceRecorder;

    /// Severity chosen by the first character of the choice text ('1'..='5').
    struct BySeverityDigit;

    impl ImpactClassifier for BySeverityDigit {
        fn classify(&self, text: &str, _houses: &[House]) -> ImpactVector {
            match text.chars().next() {
                Some('5') => ImpactVector::new(-1.0, 1.0, 1.0, 1.0, 1.0),
                Some('4') => ImpactVector::new(-1.0, 0.0, 1.0, 0.5, 0.0),
                Some('3') => ImpactVector::new(-1.0, 0.0, 0.0, 1.0, 0.0),
                Some('2') => ImpactVector::new(-1.0, 0.0, 0.0, 0.0, 0.0),
                _ => ImpactVector::default(),
            }
        }
    }

    fn ledger() -> ConsequenceLedger {
        ConsequenceLedger::new("t").with_recorder(ConsequenceRecorder::new(BySeverityDigit))
    }

    #[test]
    fn glyph_scale() {
        assert_eq!(severity_glyphs(1), "●○○○○");
        assert_eq!(severity_glyphs(4), "●●●●○");
        assert_eq!(severity_glyphs(5), "●●●●●");
    }

    #[test]
    fn calm_story_has_no_must_resolve() {
        let mut l = ledger();
        l.record_from_choice(1, "a", "4", &[House::Ashmere], Some("Ashmere debt"))
            .unwrap();
        l.record_from_choice(1, "b", "2", &[], Some("Minor slight")).unwrap();
        let ctx = ContextBuilder::default().build_chapter_context(&mut l, 2).unwrap();
        assert!(!ctx.is_crisis);
        assert!(ctx.must_resolve.is_empty());
        assert_eq!(ctx.should_address.len(), 2);
        assert_eq!(ctx.should_address[0].severity, 4);
        assert!(ctx.prompt_block.starts_with("=== NARRATIVE DEBT: 6.0 STABLE ==="));
        assert!(!ctx.prompt_block.contains("MUST RESOLVE"));
        assert!(ctx.prompt_block.contains("SHOULD ADDRESS:"));
        assert!(!ctx.prompt_block.contains("MAY REFERENCE"));
        assert!(ctx.prompt_block.contains("HOUSE UNDER PRESSURE: Ashmere (debt 4.0)"));
        assert!(
            ctx.prompt_block
                .ends_with("Do not introduce unrelated major consequences in this chapter.\n")
        );
    }

    #[test]
    fn crisis_fills_must_resolve_with_severe_entries() {
        let mut l = ledger();
        for (i, sev) in ["5", "5", "5", "4", "4", "3", "2", "1", "1", "1", "1"].iter().enumerate() {
            l.record_from_choice(1, &format!("c{i}"), sev, &[], None).unwrap();
        }
        let ctx = ContextBuilder::default().build_chapter_context(&mut l, 2).unwrap();
        // 5*3 + 4*2 + 3 + 2 + 4 = 32
        assert!(ctx.is_crisis);
        assert!((ctx.debt_score - 32.0).abs() < 1e-9);
        assert_eq!(ctx.must_resolve.len(), 2);
        assert!(ctx.must_resolve.iter().all(|c| c.severity >= 4));
        assert_eq!(ctx.should_address.len(), 3);
        assert_eq!(ctx.should_address[0].severity, 5);
        assert_eq!(ctx.may_reference.len(), 5);
        assert!(ctx.prompt_block.contains("MUST RESOLVE THIS CHAPTER:"));
        assert!(ctx.prompt_block.contains("CRISIS"));

        let must: Vec<_> = ctx.must_resolve.iter().map(|c| c.id).collect();
        assert!(ctx.should_address.iter().all(|c| !must.contains(&c.id)));
    }

    #[test]
    fn overdue_sorts_before_on_time_at_equal_severity() {
        let mut l = ledger();
        // severity 1 from chapter 1: window [3, 6]; from chapter 5: window [7, 10]
        let late = l.record_from_choice(1, "a", "1", &[], Some("old")).unwrap();
        let fresh = l.record_from_choice(5, "b", "1", &[], Some("new")).unwrap();
        let ctx = ContextBuilder::default().build_chapter_context(&mut l, 8).unwrap();
        let order: Vec<_> = ctx.should_address.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![late, fresh]);
        assert!(ctx.prompt_block.contains(&format!("- [{late}] [OVERDUE] old")));
        assert!(ctx.prompt_block.contains(&format!("- [{fresh}] new")));
    }

    #[test]
    fn entry_lines_show_severity_houses_and_window() {
        let mut l = ledger();
        l.record_from_choice(3, "a", "3", &[House::Korvath, House::Sylvenne], Some("Border feud"))
            .unwrap();
        let ctx = ContextBuilder::default().build_chapter_context(&mut l, 4).unwrap();
        assert!(ctx.prompt_block.contains(
            "  Severity: ●●●○○ | Houses: Korvath, Sylvenne | Window: chapters 9-18\n"
        ));
        // 3.0 split across two houses stays under the pressure threshold
        assert!(!ctx.prompt_block.contains("HOUSE UNDER PRESSURE"));
    }
}
