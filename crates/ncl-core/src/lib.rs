//! Narrative consequence ledger for a serialized, choice-driven story.
//!
//! Every resolved chapter leaves a [`Consequence`] behind. The ledger scores
//! the outstanding consequences as narrative debt, escalates the ones left
//! overdue, selects which of them the next chapter's generator must see, and
//! runs a timing market on when each one resolves. [`NarrativeLedger`] is the
//! entry point; the other types are usable on their own.

/// Tunable thresholds and tier sizes.
pub mod config;
/// Consequence records, windows, and bets.
pub mod consequence;
/// Prompt context selection and rendering.
pub mod context;
/// Debt scoring and auto-escalation.
pub mod debt;
/// Error types used throughout the crate.
pub mod error;
/// The story's houses.
pub mod house;
/// Impact vectors and classifiers.
pub mod impact;
/// The authoritative consequence store.
pub mod ledger;
/// Resolution-timing bets.
pub mod market;
/// Entry point tying the components together.
pub mod orchestrator;
/// Construction and escalation of consequences.
pub mod recorder;
/// Persistence port and adapters.
pub mod store;

pub use config::LedgerConfig;
pub use consequence::{
    BetId, BetStatus, Consequence, ConsequenceBet, ConsequenceId, ConsequenceStatus, MarketState,
    ResolutionWindow,
};
pub use context::{ChapterContext, ContextBuilder};
pub use debt::{DebtReport, DebtTrend, NarrativeDebtEngine};
pub use error::{NclError, NclResult};
pub use house::House;
pub use impact::{ImpactClassifier, ImpactVector, KeywordClassifier};
pub use ledger::{ConsequenceLedger, LedgerState};
pub use market::{ConsequenceBetMarket, MarketListing, MarketOption, MarketWindow, Settlement};
pub use orchestrator::{ChapterOutcome, ChapterResolved, NarrativeLedger};
pub use recorder::ConsequenceRecorder;
pub use store::{InMemoryStore, JsonFileStore, LedgerStore};
