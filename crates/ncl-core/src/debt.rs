//! Narrative debt scoring.
//!
//! Scoring is not a pure read: overdue consequences of high enough severity
//! are escalated as part of computing the report, which is why the entry
//! point is named [`NarrativeDebtEngine::score_and_escalate`]. A consequence
//! already marked escalated is never auto-escalated again, so scoring the
//! same chapter twice only escalates once.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::consequence::{Consequence, ConsequenceId, ConsequenceStatus};
use crate::error::NclResult;
use crate::house::House;
use crate::ledger::ConsequenceLedger;

/// Reason attached to automatic escalations.
pub const OVERDUE_REASON: &str = "expected resolution window passed";

/// Direction narrative debt is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtTrend {
    /// Debt is being paid down.
    Falling,
    /// Nothing is getting resolved while obligations pile up.
    Rising,
    /// Neither.
    Stable,
}

impl fmt::Display for DebtTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Falling => "falling",
            Self::Rising => "rising",
            Self::Stable => "stable",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of narrative debt at a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtReport {
    /// Chapter the report was computed for.
    pub chapter: u32,
    /// Sum of per-consequence debt.
    pub total_debt: f64,
    /// Whether total debt reached the crisis threshold.
    pub is_crisis: bool,
    /// Debt of each active consequence, in ledger order.
    pub per_consequence: Vec<(ConsequenceId, f64)>,
    /// Active consequences with severity >= 4, most severe first.
    pub critical: Vec<ConsequenceId>,
    /// Active consequences whose window opens within the horizon.
    pub upcoming: Vec<ConsequenceId>,
    /// Debt split evenly across each consequence's houses.
    pub debt_by_house: BTreeMap<House, f64>,
    /// Direction of travel.
    pub trend: DebtTrend,
    /// Consequences escalated while computing this report.
    pub escalated: Vec<ConsequenceId>,
}

impl DebtReport {
    /// Number of active consequences scored.
    pub fn active_count(&self) -> usize {
        self.per_consequence.len()
    }

    /// Debt attributed to one consequence, if it was active.
    pub fn debt_of(&self, id: ConsequenceId) -> Option<f64> {
        self.per_consequence
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, d)| *d)
    }

    /// House carrying the most debt. Ties go to the earlier house.
    pub fn top_house(&self) -> Option<(House, f64)> {
        self.debt_by_house
            .iter()
            .fold(None, |best: Option<(House, f64)>, (h, d)| match best {
                Some((_, bd)) if bd >= *d => best,
                _ => Some((*h, *d)),
            })
    }
}

/// Debt of one consequence at `chapter` under `config`.
pub fn consequence_debt(c: &Consequence, chapter: u32, config: &LedgerConfig) -> f64 {
    if c.is_resolved() {
        return 0.0;
    }
    let overdue_penalty = f64::from(c.chapters_overdue(chapter)) * config.overdue_penalty_per_chapter;
    let multiplier = if c.status == ConsequenceStatus::Escalated {
        config.escalation_multiplier
    } else {
        1.0
    };
    (f64::from(c.severity) + overdue_penalty) * multiplier
}

/// Computes debt reports over a ledger.
#[derive(Debug, Clone, Default)]
pub struct NarrativeDebtEngine {
    config: LedgerConfig,
}

impl NarrativeDebtEngine {
    /// Create an engine with the given thresholds.
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Escalate overdue consequences, then score the ledger at `chapter`.
    ///
    /// Writes each active consequence's debt back onto the record.
    pub fn score_and_escalate(
        &self,
        ledger: &mut ConsequenceLedger,
        chapter: u32,
    ) -> NclResult<DebtReport> {
        let min_severity = self.config.auto_escalation_min_severity;
        let to_escalate: Vec<ConsequenceId> = ledger
            .overdue(chapter)
            .into_iter()
            .filter(|c| {
                c.chapter_origin <= chapter
                    && c.severity >= min_severity
                    && c.status != ConsequenceStatus::Escalated
            })
            .map(|c| c.id)
            .collect();
        for id in &to_escalate {
            ledger.escalate(*id, OVERDUE_REASON, chapter)?;
        }

        let per_consequence: Vec<(ConsequenceId, f64)> = ledger
            .active_by_origin(chapter)
            .into_iter()
            .map(|c| (c.id, consequence_debt(c, chapter, &self.config)))
            .collect();
        for (id, debt) in &per_consequence {
            ledger.set_debt(*id, *debt)?;
        }

        let active = ledger.active_by_origin(chapter);
        let total_debt: f64 = per_consequence.iter().map(|(_, d)| d).sum();
        let is_crisis = self.config.is_crisis(total_debt);

        let mut critical: Vec<&Consequence> =
            active.iter().copied().filter(|c| c.severity >= 4).collect();
        critical.sort_by(|a, b| b.severity.cmp(&a.severity));

        let horizon = chapter.saturating_add(self.config.upcoming_horizon);
        let upcoming = active
            .iter()
            .filter(|c| (chapter..=horizon).contains(&c.window.min_chapter))
            .map(|c| c.id)
            .collect();

        let mut debt_by_house: BTreeMap<House, f64> = BTreeMap::new();
        for (c, (_, debt)) in active.iter().zip(&per_consequence) {
            if c.houses_affected.is_empty() {
                continue;
            }
            let share = debt / c.houses_affected.len() as f64;
            for h in &c.houses_affected {
                *debt_by_house.entry(*h).or_insert(0.0) += share;
            }
        }

        let resolved_last = match chapter.checked_sub(1) {
            Some(prev) => ledger.resolved_in(prev).len(),
            None => 0,
        };
        let trend = if resolved_last >= 2 {
            DebtTrend::Falling
        } else if resolved_last == 0 && active.len() > 3 {
            DebtTrend::Rising
        } else {
            DebtTrend::Stable
        };

        if is_crisis {
            tracing::warn!(chapter, total_debt, "narrative debt in crisis");
        } else {
            tracing::debug!(chapter, total_debt, active = active.len(), "scored narrative debt");
        }

        Ok(DebtReport {
            chapter,
            total_debt,
            is_crisis,
            critical: critical.iter().map(|c| c.id).collect(),
            upcoming,
            debt_by_house,
            trend,
            escalated: to_escalate,
            per_consequence,
        })
    }
}
