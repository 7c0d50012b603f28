//! FILENAME: app/console/src/store.rs
// PURPOSE: The report list shown by the console, and the save collaborator.

use chrono::Utc;
use report_engine::ReportConfiguration;
use uuid::Uuid;

use crate::log_info;

/// Receives every saved configuration as a whole object.
pub trait ReportSink {
    fn save(&self, config: &ReportConfiguration) -> Result<(), String>;
}

/// Default sink: writes the serialized configuration to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn save(&self, config: &ReportConfiguration) -> Result<(), String> {
        let json = serde_json::to_string(config).map_err(|e| e.to_string())?;
        log_info!("REPORT", "saved {}", json);
        Ok(())
    }
}

/// In-memory list of saved reports, in creation order.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: Vec<ReportConfiguration>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[ReportConfiguration] {
        &self.reports
    }

    pub fn get(&self, id: Uuid) -> Option<&ReportConfiguration> {
        self.reports.iter().find(|r| r.id == Some(id))
    }

    /// Case-insensitive match on name or description.
    pub fn search(&self, query: &str) -> Vec<&ReportConfiguration> {
        let needle = query.trim().to_lowercase();
        self.reports
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Stamps `config` with an id (first save) and the save time.
    pub fn prepare(&self, mut config: ReportConfiguration) -> ReportConfiguration {
        config.id.get_or_insert_with(Uuid::new_v4);
        config.saved_at = Some(Utc::now());
        config
    }

    /// Inserts `config`, or replaces the stored report with the same id.
    pub fn upsert(&mut self, mut config: ReportConfiguration) -> Uuid {
        let id = *config.id.get_or_insert_with(Uuid::new_v4);
        match self.reports.iter_mut().find(|r| r.id == Some(id)) {
            Some(existing) => *existing = config,
            None => self.reports.push(config),
        }
        id
    }

    pub fn delete(&mut self, id: Uuid) -> Option<ReportConfiguration> {
        let idx = self.reports.iter().position(|r| r.id == Some(id))?;
        Some(self.reports.remove(idx))
    }
}
