//! FILENAME: app/console/src/lib.rs
// PURPOSE: Shared state and command surface of the report configuration console.

use std::sync::Mutex;

use report_engine::{InMemoryRegistry, ReportEditor};

pub mod catalog;
pub mod commands;
pub mod config;
pub mod logging;
pub mod store;
pub mod types;

pub use catalog::{builtin_registry, PRICE_COMPARISON, SALES_ORDERS};
pub use config::ConsoleConfig;
pub use store::{LogSink, ReportSink, ReportStore};
pub use types::*;

/// State shared by all commands. At most one report dialog is open.
pub struct AppState {
    pub config: ConsoleConfig,
    pub registry: Mutex<InMemoryRegistry>,
    pub reports: Mutex<ReportStore>,
    /// The open report dialog, if any.
    pub editor: Mutex<Option<ReportEditor>>,
    /// Save collaborator that receives each finished configuration.
    pub sink: Box<dyn ReportSink + Send + Sync>,
}

pub fn create_app_state() -> Result<AppState, String> {
    create_app_state_with(ConsoleConfig::default(), Box::new(LogSink))
}

pub fn create_app_state_with(
    config: ConsoleConfig,
    sink: Box<dyn ReportSink + Send + Sync>,
) -> Result<AppState, String> {
    if let Some(ref path) = config.log_file {
        logging::init_log_file(path)?;
    }
    log_info!("SYS", "Creating AppState");
    let registry = builtin_registry().map_err(|e| e.to_string())?;
    Ok(AppState {
        config,
        registry: Mutex::new(registry),
        reports: Mutex::new(ReportStore::new()),
        editor: Mutex::new(None),
        sink,
    })
}
