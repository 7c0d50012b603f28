//! FILENAME: core/report-engine/src/lib.rs
//! Report configuration engine.
//!
//! This crate holds the rules behind the pivot report editor. It has no I/O
//! and no logging; callers get `Result`s and decide what to tell the user.
//!
//! Layers:
//! - `definition`: Shared value types (fields, slots, aggregation)
//! - `registry`: Where fields come from (`FieldRegistry`)
//! - `placement`: Rows/columns/values assignment and its rules
//! - `filter`: Ordered filter conditions and expression rendering
//! - `preview`: Mock table for the current placement
//! - `report`: The configuration object and the editor that builds it

pub mod definition;
pub mod error;
pub mod filter;
pub mod placement;
pub mod preview;
pub mod registry;
pub mod report;

#[cfg(test)]
mod tests;

pub use definition::*;
pub use error::{ConfigError, FilterError, PlacementError, RegistryError};
pub use filter::{
    operators_for, ConditionEdit, ConditionValue, FilterAction, FilterBuilder, FilterCondition,
    FilterOperator, Joiner, ScalarValue, ValueList, ValueShape, DEFAULT_LIST_DELIMITER,
};
pub use placement::{PlacementAction, PlacementSet};
pub use preview::{render_preview, PreviewCell, PreviewTable, PreviewView, MAX_PREVIEW_COLUMNS,
    MAX_PREVIEW_ROWS,
};
pub use registry::{DataModel, FieldRegistry, InMemoryRegistry};
pub use report::{ReportAction, ReportConfiguration, ReportEditor};
