//! Per-source `{last_run, last_status}` persisted between scheduler fires
//! (spec.md §4.6) so operators can observe schedule health without a live
//! process to query.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceState {
    pub last_run: DateTime<Utc>,
    pub last_status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateFile {
    pub sources: HashMap<String, SourceState>,
}

impl StateFile {
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "state file unreadable, starting fresh");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let raw = serde_json::to_string_pretty(self).expect("StateFile serializes");
        std::fs::write(path, raw)
    }

    pub fn record(&mut self, source_tag: &str, status: &str, at: DateTime<Utc>) {
        self.sources.insert(source_tag.to_string(), SourceState { last_run: at, last_status: status.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = StateFile::default();
        state.record("tx_rrc", "success", Utc::now());
        state.save(&path).unwrap();

        let reloaded = StateFile::load(&path);
        assert_eq!(reloaded.sources["tx_rrc"].last_status, "success");
    }

    #[test]
    fn missing_file_loads_as_default() {
        let state = StateFile::load(Path::new("/nonexistent/path/state.json"));
        assert!(state.sources.is_empty());
    }
}
