pub mod bet;
pub mod context;
pub mod list;
pub mod market;
pub mod record;
pub mod report;
pub mod resolve;
pub mod settle;

use std::path::PathBuf;

use clap::Args;
use ncl_core::{ConsequenceId, JsonFileStore, LedgerConfig, NarrativeLedger};

/// Where the ledger lives. Shared by every command.
#[derive(Args)]
pub struct LedgerArgs {
    /// Directory holding the ledger files
    #[arg(long, global = true, default_value = ".")]
    pub ledger_dir: PathBuf,

    /// Story id; the ledger is stored as `<story>.json`
    #[arg(long, global = true, default_value = "main")]
    pub story: String,

    /// JSON file with tuning overrides (crisis threshold, tier sizes, ...)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl LedgerArgs {
    /// Open the story's ledger, creating an empty one if the file is missing.
    pub fn open(&self) -> Result<NarrativeLedger<JsonFileStore>, String> {
        let config = self.load_config()?;
        tracing::debug!(dir = %self.ledger_dir.display(), story = %self.story, "opening ledger");
        NarrativeLedger::open(JsonFileStore::new(&self.ledger_dir), &self.story, config)
            .map_err(|e| e.to_string())
    }

    fn load_config(&self) -> Result<LedgerConfig, String> {
        let Some(path) = &self.config else {
            return Ok(LedgerConfig::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }
}

/// Resolve a full id or unique prefix against the open ledger.
fn find_id(ledger: &NarrativeLedger<JsonFileStore>, text: &str) -> Result<ConsequenceId, String> {
    ledger.ledger().find_id(text).map_err(|e| e.to_string())
}

/// Shorten text for table cells.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
