//! Persistence port for ledger state, with in-memory and JSON-file adapters.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NclError, NclResult};
use crate::ledger::LedgerState;

/// Loads and saves the full ledger state of a story.
pub trait LedgerStore {
    /// Load the state for `story_id`, or `None` if nothing was saved yet.
    fn load(&self, story_id: &str) -> NclResult<Option<LedgerState>>;

    /// Persist `state`, replacing whatever was stored for its story.
    fn save(&mut self, state: &LedgerState) -> NclResult<()>;
}

/// Keeps ledger states in a map. Used by tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    states: HashMap<String, LedgerState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stories stored.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no story has been saved.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl LedgerStore for InMemoryStore {
    fn load(&self, story_id: &str) -> NclResult<Option<LedgerState>> {
        Ok(self.states.get(story_id).cloned())
    }

    fn save(&mut self, state: &LedgerState) -> NclResult<()> {
        self.states.insert(state.story_id.clone(), state.clone());
        Ok(())
    }
}

/// Stores each story as `<dir>/<story_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the ledger files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `story_id`.
    pub fn path_for(&self, story_id: &str) -> NclResult<PathBuf> {
        let valid = !story_id.is_empty()
            && story_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(NclError::InvalidInput(format!(
                "story id \"{story_id}\" may only contain letters, digits, '-' and '_'"
            )));
        }
        Ok(self.dir.join(format!("{story_id}.json")))
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self, story_id: &str) -> NclResult<Option<LedgerState>> {
        let path = self.path_for(story_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let state: LedgerState = serde_json::from_str(&content)?;
        if state.story_id != story_id {
            return Err(NclError::Store(format!(
                "{} holds story \"{}\", expected \"{story_id}\"",
                path.display(),
                state.story_id
            )));
        }
        tracing::debug!(path = %path.display(), consequences = state.consequences.len(), "loaded ledger");
        Ok(Some(state))
    }

    fn save(&mut self, state: &LedgerState) -> NclResult<()> {
        let path = self.path_for(&state.story_id)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(state)?;
        // Write beside the target and rename so a crash never leaves a torn file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), "saved ledger");
        Ok(())
    }
}
