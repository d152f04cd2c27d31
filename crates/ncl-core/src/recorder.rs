//! Construction and escalation of consequence records.
//!
//! The recorder is pure: it builds new [`Consequence`] values and never
//! touches ledger state. The ledger calls into it for both operations.

use std::fmt;

use chrono::Utc;

use crate::consequence::{
    Consequence, ConsequenceId, ConsequenceStatus, MarketState, ResolutionWindow,
};
use crate::error::{NclError, NclResult};
use crate::house::{House, join_houses};
use crate::impact::{ImpactClassifier, ImpactVector, KeywordClassifier};

/// Impact amplification applied on each escalation.
pub const ESCALATION_AMPLIFICATION: f64 = 1.25;

/// Map a weighted impact magnitude to a 1-5 severity.
pub fn severity_for(magnitude: f64) -> u8 {
    if magnitude > 7.0 {
        5
    } else if magnitude > 5.0 {
        4
    } else if magnitude > 3.0 {
        3
    } else if magnitude > 1.5 {
        2
    } else {
        1
    }
}

/// Expected window for a consequence of `severity` created at `origin`.
///
/// Fails when the window would run past the last representable chapter.
pub fn window_for(origin: u32, severity: u8) -> NclResult<ResolutionWindow> {
    let s = u32::from(severity);
    window_after(origin, 2 * s, 5 * s)
}

/// Window `[from + start, from + end]`, checked against chapter overflow.
fn window_after(from: u32, start: u32, end: u32) -> NclResult<ResolutionWindow> {
    match (from.checked_add(start), from.checked_add(end)) {
        (Some(min), Some(max)) => Ok(ResolutionWindow::new(min, max)),
        _ => Err(NclError::InvalidInput(format!("chapter {from} out of range"))),
    }
}

/// Builds consequences from resolved choices using a pluggable classifier.
pub struct ConsequenceRecorder {
    classifier: Box<dyn ImpactClassifier + Send + Sync>,
}

impl ConsequenceRecorder {
    /// Create a recorder around a classifier.
    pub fn new(classifier: impl ImpactClassifier + Send + Sync + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
        }
    }

    /// Build a fresh pending consequence for the winning choice of `chapter`.
    pub fn create_from_choice(
        &self,
        chapter: u32,
        choice_ref: &str,
        choice_text: &str,
        houses: &[House],
        description_hint: Option<&str>,
    ) -> NclResult<Consequence> {
        let mut unique: Vec<House> = Vec::with_capacity(houses.len());
        for h in houses {
            if !unique.contains(h) {
                unique.push(*h);
            }
        }

        let impact = self.classifier.classify(choice_text, &unique);
        let severity = severity_for(impact.magnitude());
        let description = match description_hint.map(str::trim) {
            Some(hint) if !hint.is_empty() => hint.to_string(),
            _ => synthesize_description(&unique, &impact, choice_text),
        };

        let window = window_for(chapter, severity)?;

        Ok(Consequence {
            id: ConsequenceId::new(),
            chapter_origin: chapter,
            choice_ref: choice_ref.to_string(),
            houses_affected: unique,
            description,
            severity,
            impact,
            status: ConsequenceStatus::Pending,
            window,
            actual_resolution_chapter: None,
            resolution_text: None,
            parent_id: None,
            child_ids: Vec::new(),
            narrative_debt: f64::from(severity),
            escalation_count: 0,
            bets: Vec::new(),
            market: MarketState::Closed,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }
}

/// Return an escalated copy of `consequence`, re-anchored at `current_chapter`.
pub fn escalate(
    consequence: &Consequence,
    reason: &str,
    current_chapter: u32,
) -> NclResult<Consequence> {
    if consequence.is_resolved() {
        return Err(NclError::InvalidState(format!(
            "cannot escalate resolved consequence {}",
            consequence.id
        )));
    }

    if current_chapter < consequence.chapter_origin {
        return Err(NclError::InvalidInput(format!(
            "cannot escalate consequence {} at chapter {current_chapter}, before its origin chapter {}",
            consequence.id, consequence.chapter_origin
        )));
    }

    let severity = (consequence.severity + 1).min(5);
    let s = u32::from(severity);
    let window = window_after(current_chapter, 1, 1 + 2 * s)?;
    let mut next = consequence.clone();
    next.severity = severity;
    next.impact = consequence.impact.amplified(ESCALATION_AMPLIFICATION);
    next.status = ConsequenceStatus::Escalated;
    next.description = format!("[ESCALATED: {reason}] {}", consequence.description);
    next.window = window;
    next.narrative_debt = 1.5 * f64::from(severity);
    next.escalation_count += 1;
    Ok(next)
}

impl Default for ConsequenceRecorder {
    fn default() -> Self {
        Self::new(KeywordClassifier)
    }
}

impl fmt::Debug for ConsequenceRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsequenceRecorder").finish_non_exhaustive()
    }
}

fn synthesize_description(houses: &[House], impact: &ImpactVector, choice_text: &str) -> String {
    format!(
        "{} must answer for a {} choice: {}",
        join_houses(houses),
        impact.tone(),
        choice_text.trim()
    )
}
