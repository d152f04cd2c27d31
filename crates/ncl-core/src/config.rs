//! Tunable thresholds for debt scoring and context selection.

use serde::{Deserialize, Serialize};

/// Configuration for the debt engine and context builder.
///
/// Defaults reproduce the reference tuning: crisis at 25 debt, escalated
/// consequences weighted 1.8x, and a 2/3/5 prompt budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Total debt at or above which the story is in crisis.
    pub crisis_threshold: f64,
    /// Debt multiplier applied to escalated consequences.
    pub escalation_multiplier: f64,
    /// Extra debt per chapter a consequence is past its window.
    pub overdue_penalty_per_chapter: f64,
    /// Minimum severity for an overdue consequence to auto-escalate (1-5).
    pub auto_escalation_min_severity: u8,
    /// Size of the "must resolve" tier in crisis.
    pub must_resolve_limit: usize,
    /// Size of the "should address" tier.
    pub should_address_limit: usize,
    /// Size of the "may reference" tier.
    pub may_reference_limit: usize,
    /// How many chapters ahead a window start counts as upcoming.
    pub upcoming_horizon: u32,
    /// Per-house debt above which the house is called out in the prompt.
    pub house_pressure_threshold: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            crisis_threshold: 25.0,
            escalation_multiplier: 1.8,
            overdue_penalty_per_chapter: 0.5,
            auto_escalation_min_severity: 3,
            must_resolve_limit: 2,
            should_address_limit: 3,
            may_reference_limit: 5,
            upcoming_horizon: 3,
            house_pressure_threshold: 2.0,
        }
    }
}

impl LedgerConfig {
    /// Whether `total_debt` puts the story in crisis.
    pub fn is_crisis(&self, total_debt: f64) -> bool {
        total_debt >= self.crisis_threshold
    }

    /// Set the crisis threshold.
    pub fn with_crisis_threshold(mut self, threshold: f64) -> Self {
        self.crisis_threshold = threshold;
        self
    }

    /// Set the escalation debt multiplier.
    pub fn with_escalation_multiplier(mut self, multiplier: f64) -> Self {
        self.escalation_multiplier = multiplier;
        self
    }

    /// Set the minimum severity for auto-escalation (clamped to 1-5).
    pub fn with_auto_escalation_min_severity(mut self, severity: u8) -> Self {
        self.auto_escalation_min_severity = severity.clamp(1, 5);
        self
    }

    /// Set the three prompt tier sizes.
    pub fn with_tier_limits(mut self, must: usize, should: usize, may: usize) -> Self {
        self.must_resolve_limit = must;
        self.should_address_limit = should;
        self.may_reference_limit = may;
        self
    }

    /// Set the upcoming-resolution horizon in chapters.
    pub fn with_upcoming_horizon(mut self, chapters: u32) -> Self {
        self.upcoming_horizon = chapters;
        self
    }
}
