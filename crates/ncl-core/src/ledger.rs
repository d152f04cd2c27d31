//! The authoritative store of consequence records.
//!
//! Every mutation of a [`Consequence`] (recording, escalation, resolution,
//! debt write-back, bets) goes through [`ConsequenceLedger`] so status
//! transitions stay in one place. Resolved records are never removed.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::consequence::{Consequence, ConsequenceId, ConsequenceStatus};
use crate::error::{NclError, NclResult};
use crate::house::House;
use crate::recorder::{self, ConsequenceRecorder};

/// Serializable ledger contents for one story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// The story this ledger belongs to.
    pub story_id: String,
    /// All consequences in recording order.
    pub consequences: Vec<Consequence>,
}

impl LedgerState {
    /// Create an empty state for a story.
    pub fn new(story_id: impl Into<String>) -> Self {
        Self {
            story_id: story_id.into(),
            consequences: Vec::new(),
        }
    }
}

/// Owns all consequences of a story and their embedded bets.
#[derive(Debug, Default)]
pub struct ConsequenceLedger {
    state: LedgerState,
    recorder: ConsequenceRecorder,
}

impl ConsequenceLedger {
    /// Create an empty ledger using the default keyword classifier.
    pub fn new(story_id: impl Into<String>) -> Self {
        Self::from_state(LedgerState::new(story_id), ConsequenceRecorder::default())
    }

    /// Rehydrate a ledger from stored state.
    pub fn from_state(state: LedgerState, recorder: ConsequenceRecorder) -> Self {
        Self { state, recorder }
    }

    /// Replace the recorder (and with it the impact classifier).
    pub fn with_recorder(mut self, recorder: ConsequenceRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// The story this ledger belongs to.
    pub fn story_id(&self) -> &str {
        &self.state.story_id
    }

    /// Borrow the raw state, e.g. for persistence.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Consume the ledger, returning its state.
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Insert a pre-built consequence after checking its invariants.
    pub fn record(&mut self, consequence: Consequence) -> NclResult<ConsequenceId> {
        if !(1..=5).contains(&consequence.severity) {
            return Err(NclError::InvalidInput(format!(
                "severity {} out of range 1-5",
                consequence.severity
            )));
        }
        if consequence.window.min_chapter <= consequence.chapter_origin
            || consequence.window.min_chapter > consequence.window.max_chapter
        {
            return Err(NclError::InvalidInput(format!(
                "window {} must start after origin chapter {}",
                consequence.window, consequence.chapter_origin
            )));
        }
        if self.contains(consequence.id) {
            return Err(NclError::InvalidInput(format!(
                "duplicate consequence id {}",
                consequence.id
            )));
        }

        let id = consequence.id;
        tracing::debug!(
            consequence = %id,
            chapter = consequence.chapter_origin,
            severity = consequence.severity,
            window = %consequence.window,
            "recorded consequence"
        );
        self.state.consequences.push(consequence);
        Ok(id)
    }

    /// Build a consequence from a resolved choice and record it.
    pub fn record_from_choice(
        &mut self,
        chapter: u32,
        choice_ref: &str,
        choice_text: &str,
        houses: &[House],
        description_hint: Option<&str>,
    ) -> NclResult<ConsequenceId> {
        let consequence =
            self.recorder
                .create_from_choice(chapter, choice_ref, choice_text, houses, description_hint)?;
        self.record(consequence)
    }

    /// Mark a consequence resolved in `chapter`. Its debt drops to zero.
    pub fn resolve(
        &mut self,
        id: ConsequenceId,
        chapter: u32,
        resolution_text: &str,
    ) -> NclResult<&Consequence> {
        let c = self.get_mut(id)?;
        if c.is_resolved() {
            return Err(NclError::AlreadyResolved(id));
        }
        if chapter <= c.chapter_origin {
            return Err(NclError::InvalidInput(format!(
                "resolution chapter {chapter} must come after origin chapter {}",
                c.chapter_origin
            )));
        }

        c.status = ConsequenceStatus::Resolved;
        c.actual_resolution_chapter = Some(chapter);
        c.resolution_text = Some(resolution_text.to_string());
        c.narrative_debt = 0.0;
        c.resolved_at = Some(Utc::now());
        tracing::info!(consequence = %id, chapter, "resolved consequence");
        Ok(&*c)
    }

    /// Escalate a consequence relative to `current_chapter`.
    pub fn escalate(
        &mut self,
        id: ConsequenceId,
        reason: &str,
        current_chapter: u32,
    ) -> NclResult<&Consequence> {
        let c = self.get_mut(id)?;
        if c.is_resolved() {
            return Err(NclError::AlreadyResolved(id));
        }
        let escalated = recorder::escalate(c, reason, current_chapter)?;
        tracing::info!(
            consequence = %id,
            severity = escalated.severity,
            window = %escalated.window,
            reason,
            "escalated consequence"
        );
        *c = escalated;
        Ok(&*c)
    }

    /// Link `child` under `parent` in a cascading chain.
    pub fn link_child(&mut self, parent: ConsequenceId, child: ConsequenceId) -> NclResult<()> {
        if parent == child {
            return Err(NclError::InvalidInput(
                "a consequence cannot be its own child".to_string(),
            ));
        }
        self.get(parent)?;
        let c = self.get_mut(child)?;
        if let Some(existing) = c.parent_id {
            return Err(NclError::InvalidState(format!(
                "consequence {child} already has parent {existing}"
            )));
        }
        c.parent_id = Some(parent);
        self.get_mut(parent)?.child_ids.push(child);
        Ok(())
    }

    /// Overwrite the stored debt of an active consequence.
    pub(crate) fn set_debt(&mut self, id: ConsequenceId, debt: f64) -> NclResult<()> {
        let c = self.get_mut(id)?;
        if c.is_active() {
            c.narrative_debt = debt;
        }
        Ok(())
    }

    pub(crate) fn get_mut(&mut self, id: ConsequenceId) -> NclResult<&mut Consequence> {
        self.state
            .consequences
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(NclError::NotFound(id))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up a consequence.
    pub fn get(&self, id: ConsequenceId) -> NclResult<&Consequence> {
        self.state
            .consequences
            .iter()
            .find(|c| c.id == id)
            .ok_or(NclError::NotFound(id))
    }

    /// Whether the ledger holds a consequence with this ID.
    pub fn contains(&self, id: ConsequenceId) -> bool {
        self.state.consequences.iter().any(|c| c.id == id)
    }

    /// Resolve a full UUID or a unique hex prefix (at least 4 chars) to an ID.
    pub fn find_id(&self, text: &str) -> NclResult<ConsequenceId> {
        let needle = text.trim().to_lowercase();
        if let Ok(id) = needle.parse::<ConsequenceId>() {
            return if self.contains(id) {
                Ok(id)
            } else {
                Err(NclError::NotFound(id))
            };
        }

        let needle = needle.replace('-', "");
        if needle.len() < 4 {
            return Err(NclError::InvalidInput(format!(
                "id prefix \"{text}\" is too short"
            )));
        }
        let mut matches = self
            .state
            .consequences
            .iter()
            .filter(|c| c.id.simple().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(c), None) => Ok(c.id),
            (Some(_), Some(_)) => Err(NclError::AmbiguousId(text.to_string())),
            (None, _) => Err(NclError::UnknownId(text.to_string())),
        }
    }

    /// Every consequence, resolved or not, in recording order.
    pub fn all(&self) -> &[Consequence] {
        &self.state.consequences
    }

    /// Consequences that are not resolved.
    pub fn active(&self) -> Vec<&Consequence> {
        self.state
            .consequences
            .iter()
            .filter(|c| c.is_active())
            .collect()
    }

    /// Active consequences created at or before `chapter`.
    pub fn active_by_origin(&self, chapter: u32) -> Vec<&Consequence> {
        self.state
            .consequences
            .iter()
            .filter(|c| c.is_active() && c.chapter_origin <= chapter)
            .collect()
    }

    /// Active consequences whose window ended before `chapter`.
    pub fn overdue(&self, chapter: u32) -> Vec<&Consequence> {
        self.state
            .consequences
            .iter()
            .filter(|c| c.is_overdue(chapter))
            .collect()
    }

    /// Consequences resolved in exactly `chapter`.
    pub fn resolved_in(&self, chapter: u32) -> Vec<&Consequence> {
        self.state
            .consequences
            .iter()
            .filter(|c| c.actual_resolution_chapter == Some(chapter))
            .collect()
    }

    /// Number of consequences held, resolved included.
    pub fn len(&self) -> usize {
        self.state.consequences.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.state.consequences.is_empty()
    }
}
