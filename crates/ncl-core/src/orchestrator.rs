//! Single entry point for the surrounding application.
//!
//! `NarrativeLedger` wires the recorder, ledger, debt engine, context builder
//! and bet market together and persists through a [`LedgerStore`] after every
//! mutation. Mutating methods take `&mut self`; callers sharing one ledger
//! across threads wrap it in a mutex, which keeps scoring and settlement for
//! a consequence in a single critical section.

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::consequence::{Consequence, ConsequenceBet, ConsequenceId};
use crate::context::{ChapterContext, ContextBuilder};
use crate::debt::{DebtReport, NarrativeDebtEngine};
use crate::error::{NclError, NclResult};
use crate::house::House;
use crate::ledger::{ConsequenceLedger, LedgerState};
use crate::market::{ConsequenceBetMarket, MarketListing, Settlement};
use crate::recorder::ConsequenceRecorder;
use crate::store::LedgerStore;

/// Upstream event: a chapter's vote closed and a choice won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterResolved {
    /// The chapter that just ended.
    pub chapter: u32,
    /// Identifier of the winning choice.
    pub choice_ref: String,
    /// Text of the winning choice.
    pub choice_text: String,
    /// Houses the choice touches.
    pub houses: Vec<House>,
    /// Optional description to use instead of a synthesized one.
    pub hint: Option<String>,
}

impl ChapterResolved {
    /// Create an event without a description hint.
    pub fn new(
        chapter: u32,
        choice_ref: impl Into<String>,
        choice_text: impl Into<String>,
        houses: Vec<House>,
    ) -> Self {
        Self {
            chapter,
            choice_ref: choice_ref.into(),
            choice_text: choice_text.into(),
            houses,
            hint: None,
        }
    }

    /// Attach a description hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Everything produced when a chapter resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterOutcome {
    /// The newly recorded consequence.
    pub consequence: Consequence,
    /// Debt report for the resolved chapter.
    pub report: DebtReport,
    /// The market opened on the new consequence.
    pub market: MarketListing,
}

/// Orchestrates one story's consequence ledger over a store.
#[derive(Debug)]
pub struct NarrativeLedger<S: LedgerStore> {
    ledger: ConsequenceLedger,
    store: S,
    engine: NarrativeDebtEngine,
    context: ContextBuilder,
    market: ConsequenceBetMarket,
}

impl<S: LedgerStore> NarrativeLedger<S> {
    /// Load `story_id` from `store` (or start empty) with the keyword classifier.
    pub fn open(store: S, story_id: &str, config: LedgerConfig) -> NclResult<Self> {
        Self::open_with_recorder(store, story_id, config, ConsequenceRecorder::default())
    }

    /// Load `story_id` from `store` (or start empty) with a custom recorder.
    pub fn open_with_recorder(
        store: S,
        story_id: &str,
        config: LedgerConfig,
        recorder: ConsequenceRecorder,
    ) -> NclResult<Self> {
        let state = store
            .load(story_id)?
            .unwrap_or_else(|| LedgerState::new(story_id));
        tracing::debug!(story = story_id, consequences = state.consequences.len(), "opened ledger");
        Ok(Self {
            ledger: ConsequenceLedger::from_state(state, recorder),
            store,
            engine: NarrativeDebtEngine::new(config.clone()),
            context: ContextBuilder::new(config),
            market: ConsequenceBetMarket,
        })
    }

    /// Read-only view of the ledger, for UI queries.
    pub fn ledger(&self) -> &ConsequenceLedger {
        &self.ledger
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the orchestrator, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Record the consequence of a resolved chapter, score the ledger, and
    /// open a market on the new consequence.
    pub fn on_chapter_resolved(&mut self, event: ChapterResolved) -> NclResult<ChapterOutcome> {
        let id = self.ledger.record_from_choice(
            event.chapter,
            &event.choice_ref,
            &event.choice_text,
            &event.houses,
            event.hint.as_deref(),
        )?;
        let report = self.engine.score_and_escalate(&mut self.ledger, event.chapter)?;
        let market = self.market.open_market(&mut self.ledger, id)?;
        self.persist()?;

        Ok(ChapterOutcome {
            consequence: self.ledger.get(id)?.clone(),
            report,
            market,
        })
    }

    /// Build the prompt context for `chapter`. Escalates overdue consequences.
    pub fn get_chapter_context(&mut self, chapter: u32) -> NclResult<ChapterContext> {
        let context = self.context.build_chapter_context(&mut self.ledger, chapter)?;
        self.persist()?;
        Ok(context)
    }

    /// Score the ledger at `chapter`. Escalates overdue consequences.
    pub fn score_and_escalate(&mut self, chapter: u32) -> NclResult<DebtReport> {
        let report = self.engine.score_and_escalate(&mut self.ledger, chapter)?;
        self.persist()?;
        Ok(report)
    }

    /// Resolve a consequence, then settle its bets.
    ///
    /// The resolution is persisted before settlement runs. If settlement
    /// fails the consequence stays resolved with open bets, and
    /// [`settle_pending`](Self::settle_pending) repairs it.
    pub fn resolve_consequence(
        &mut self,
        id: ConsequenceId,
        chapter: u32,
        resolution_text: &str,
    ) -> NclResult<Settlement> {
        self.ledger.resolve(id, chapter, resolution_text)?;
        self.persist()?;
        let settlement = self.market.settle_bets(&mut self.ledger, id, chapter)?;
        self.persist()?;
        Ok(settlement)
    }

    /// Settle any bets still open on an already resolved consequence.
    pub fn settle_pending(&mut self, id: ConsequenceId) -> NclResult<Settlement> {
        let chapter = self.ledger.get(id)?.actual_resolution_chapter.ok_or_else(|| {
            NclError::InvalidState(format!("consequence {id} has not been resolved"))
        })?;
        let settlement = self.market.settle_bets(&mut self.ledger, id, chapter)?;
        self.persist()?;
        Ok(settlement)
    }

    /// Open (or re-list) the market on a consequence.
    pub fn open_market(&mut self, id: ConsequenceId) -> NclResult<MarketListing> {
        let listing = self.market.open_market(&mut self.ledger, id)?;
        self.persist()?;
        Ok(listing)
    }

    /// Place a timing bet on a consequence.
    pub fn place_bet(
        &mut self,
        id: ConsequenceId,
        bettor: &str,
        predicted_chapter: u32,
        amount: f64,
    ) -> NclResult<ConsequenceBet> {
        let bet = self
            .market
            .place_bet(&mut self.ledger, id, bettor, predicted_chapter, amount)?;
        self.persist()?;
        Ok(bet)
    }

    /// Link two consequences into a cascading chain.
    pub fn link_child(&mut self, parent: ConsequenceId, child: ConsequenceId) -> NclResult<()> {
        self.ledger.link_child(parent, child)?;
        self.persist()
    }

    fn persist(&mut self) -> NclResult<()> {
        self.store.save(self.ledger.state())
    }
}
