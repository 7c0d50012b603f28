//! FILENAME: app/console/src/config.rs
// PURPOSE: Console settings, read from JSON. Every key is optional.

use std::path::{Path, PathBuf};

use report_engine::{Joiner, DEFAULT_LIST_DELIMITER, MAX_PREVIEW_ROWS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Where sequenced log lines are written. No file when unset.
    pub log_file: Option<PathBuf>,
    /// Body rows generated for the mock preview.
    pub preview_sample_rows: usize,
    /// Separator between items of `between` / `in` values in expressions.
    pub list_delimiter: String,
    /// Joiner used when a new filter condition does not name one.
    pub default_joiner: Joiner,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            log_file: None,
            preview_sample_rows: 5,
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            default_joiner: Joiner::And,
        }
    }
}

impl ConsoleConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: ConsoleConfig = serde_json::from_str(json)
            .map_err(|e| format!("Invalid console config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {:?}: {}", path, e))?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), String> {
        if self.list_delimiter.is_empty() {
            return Err("listDelimiter cannot be empty".to_string());
        }
        if self.preview_sample_rows > MAX_PREVIEW_ROWS {
            return Err(format!(
                "previewSampleRows cannot exceed {}, got {}",
                MAX_PREVIEW_ROWS, self.preview_sample_rows
            ));
        }
        Ok(())
    }
}
