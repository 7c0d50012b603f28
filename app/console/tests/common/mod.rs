//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for console integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use console_lib::{
    commands, create_app_state_with, AddFilterRequest, AppState, ConsoleConfig,
    OpenEditorRequest, PlaceFieldRequest, ReportSink, PRICE_COMPARISON,
};
use report_engine::{ConditionValue, ReportConfiguration, ScalarValue, Slot};

/// Sink that keeps every configuration it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub saved: Arc<Mutex<Vec<ReportConfiguration>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl ReportSink for RecordingSink {
    fn save(&self, config: &ReportConfiguration) -> Result<(), String> {
        if *self.fail.lock().unwrap() {
            return Err("sink unavailable".to_string());
        }
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}

/// Test harness for creating and managing console state.
pub struct TestHarness {
    pub state: AppState,
    pub sink: RecordingSink,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    pub fn with_config(config: ConsoleConfig) -> Self {
        let sink = RecordingSink::default();
        let state = create_app_state_with(config, Box::new(sink.clone())).unwrap();
        TestHarness { state, sink }
    }

    /// Harness with a new price comparison report open.
    pub fn with_open_editor() -> Self {
        let harness = Self::new();
        harness.open_new(PRICE_COMPARISON);
        harness
    }

    pub fn open_new(&self, model: &str) {
        commands::open_report_editor(
            &self.state,
            OpenEditorRequest {
                model: Some(model.to_string()),
                report_id: None,
            },
        )
        .unwrap();
    }

    pub fn place(&self, field: &str, slot: Slot) -> Result<(), String> {
        commands::place_field(
            &self.state,
            PlaceFieldRequest {
                field: field.to_string(),
                slot,
            },
        )
        .map(|_| ())
    }

    pub fn add_filter(
        &self,
        field: &str,
        operator: &str,
        value: Option<ConditionValue>,
    ) -> Result<u32, String> {
        commands::add_filter_condition(
            &self.state,
            AddFilterRequest {
                field: field.to_string(),
                operator: operator.to_string(),
                value,
                joiner: None,
            },
        )
        .map(|r| r.id)
    }

    pub fn saved_count(&self) -> usize {
        self.sink.saved.lock().unwrap().len()
    }
}

pub fn text(s: &str) -> Option<ConditionValue> {
    Some(ConditionValue::Single(ScalarValue::Text(s.to_string())))
}

pub fn decimal(n: f64) -> Option<ConditionValue> {
    Some(ConditionValue::Single(ScalarValue::Decimal(n)))
}
