//! Consequence records, their resolution windows, and attached bets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NclError;
use crate::house::House;
use crate::impact::ImpactVector;

/// Unique identifier for a consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsequenceId(pub Uuid);

impl ConsequenceId {
    /// Generate a new random consequence ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Hyphen-less hex form, used for prefix lookups.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl Default for ConsequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl FromStr for ConsequenceId {
    type Err = NclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| NclError::InvalidInput(format!("not a consequence id: {s}")))
    }
}

/// Unique identifier for a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BetId(pub Uuid);

impl BetId {
    /// Generate a new random bet ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Lifecycle status of a consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsequenceStatus {
    /// Recorded, not yet addressed.
    Pending,
    /// Partly addressed by the narrative. Set by callers, never by the ledger.
    Partial,
    /// Addressed. Terminal.
    Resolved,
    /// Went overdue (or was pushed) and had its severity raised.
    Escalated,
    /// Flagged as a crisis by callers. Never set by the ledger.
    Crisis,
}

impl ConsequenceStatus {
    /// Whether the consequence still carries narrative debt.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ConsequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::Crisis => "crisis",
        };
        write!(f, "{s}")
    }
}

/// Inclusive chapter range in which a consequence is expected to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionWindow {
    /// First chapter of the window.
    pub min_chapter: u32,
    /// Last chapter of the window.
    pub max_chapter: u32,
}

impl ResolutionWindow {
    /// Create a window, swapping the bounds if given out of order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min_chapter: a.min(b),
            max_chapter: a.max(b),
        }
    }

    /// Whether `chapter` falls inside the window.
    pub fn contains(&self, chapter: u32) -> bool {
        (self.min_chapter..=self.max_chapter).contains(&chapter)
    }

    /// Chapters between `chapter` and the nearest bound; 0 when inside.
    pub fn distance_outside(&self, chapter: u32) -> u32 {
        if chapter < self.min_chapter {
            self.min_chapter - chapter
        } else {
            chapter.saturating_sub(self.max_chapter)
        }
    }

    /// Number of chapters in the window.
    pub fn len(&self) -> u32 {
        self.max_chapter - self.min_chapter + 1
    }

    /// Always false: a window covers at least one chapter.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ResolutionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chapters {}-{}", self.min_chapter, self.max_chapter)
    }
}

/// State of the timing market attached to a consequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    /// No market has been opened.
    #[default]
    Closed,
    /// Accepting bets.
    Open,
    /// All bets have been settled.
    Settled,
}

/// Status of a single bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    /// Awaiting resolution.
    Open,
    /// Settled in the bettor's favour.
    Won,
    /// Settled against the bettor.
    Lost,
    /// Stake returned. Never produced by the ledger.
    Refunded,
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

/// A wager on the chapter in which a consequence resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceBet {
    /// Unique identifier.
    pub id: BetId,
    /// Who placed the bet.
    pub bettor: String,
    /// Chapter the bettor expects resolution in.
    pub predicted_chapter: u32,
    /// Informational `(predicted - 1, predicted + 1)` range.
    pub predicted_range: (u32, u32),
    /// Stake.
    pub amount: f64,
    /// Payout multiplier, fixed when the bet was placed.
    pub multiplier: f64,
    /// Current status.
    pub status: BetStatus,
    /// Amount paid out once won.
    pub payout: Option<f64>,
    /// When the bet was placed.
    pub placed_at: DateTime<Utc>,
}

impl ConsequenceBet {
    /// Create an open bet.
    pub fn new(bettor: impl Into<String>, predicted_chapter: u32, amount: f64, multiplier: f64) -> Self {
        Self {
            id: BetId::new(),
            bettor: bettor.into(),
            predicted_chapter,
            predicted_range: (
                predicted_chapter.saturating_sub(1),
                predicted_chapter.saturating_add(1),
            ),
            amount,
            multiplier,
            status: BetStatus::Open,
            payout: None,
            placed_at: Utc::now(),
        }
    }
}

/// An outstanding (or discharged) narrative obligation created by a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    /// Unique identifier.
    pub id: ConsequenceId,
    /// Chapter whose resolution created this consequence.
    pub chapter_origin: u32,
    /// Reference to the winning choice.
    pub choice_ref: String,
    /// Houses touched by the choice.
    pub houses_affected: Vec<House>,
    /// Generator-readable description.
    pub description: String,
    /// Weight from 1 (flavor) to 5 (civilization-altering).
    pub severity: u8,
    /// Qualitative effect profile.
    pub impact: ImpactVector,
    /// Lifecycle status.
    pub status: ConsequenceStatus,
    /// Expected resolution window.
    pub window: ResolutionWindow,
    /// Chapter in which the consequence was resolved.
    pub actual_resolution_chapter: Option<u32>,
    /// How the narrative resolved it.
    pub resolution_text: Option<String>,
    /// Parent in a cascading chain.
    pub parent_id: Option<ConsequenceId>,
    /// Children in a cascading chain.
    pub child_ids: Vec<ConsequenceId>,
    /// Debt as of the last scoring pass. Always 0 once resolved.
    pub narrative_debt: f64,
    /// Number of times this consequence has been escalated.
    #[serde(default)]
    pub escalation_count: u32,
    /// Timing bets placed on this consequence.
    pub bets: Vec<ConsequenceBet>,
    /// State of the timing market.
    #[serde(default)]
    pub market: MarketState,
    /// When the consequence was recorded.
    pub created_at: DateTime<Utc>,
    /// When it was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Consequence {
    /// Whether this consequence still carries narrative debt.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether the consequence is resolved.
    pub fn is_resolved(&self) -> bool {
        self.status == ConsequenceStatus::Resolved
    }

    /// Whether the consequence is active and past its window at `chapter`.
    pub fn is_overdue(&self, chapter: u32) -> bool {
        self.is_active() && chapter > self.window.max_chapter
    }

    /// Chapters past the end of the window at `chapter`.
    pub fn chapters_overdue(&self, chapter: u32) -> u32 {
        chapter.saturating_sub(self.window.max_chapter)
    }

    /// Bets that have not been settled yet.
    pub fn open_bets(&self) -> impl Iterator<Item = &ConsequenceBet> {
        self.bets.iter().filter(|b| b.status == BetStatus::Open)
    }
}
