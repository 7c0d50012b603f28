//! FILENAME: core/report-engine/src/error.rs

use thiserror::Error;

use crate::definition::{ConditionId, DataType, FieldRole, Slot};
use crate::filter::{FilterOperator, ValueShape};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Data model already registered: {0}")]
    DuplicateModel(String),

    #[error("Unknown data model: {0}")]
    UnknownModel(String),

    #[error("Field '{field}' already exists in model '{model}'")]
    DuplicateField { model: String, field: String },

    #[error("Field '{field}' belongs to model '{owner}', not '{model}'")]
    ModelMismatch { field: String, owner: String, model: String },

    #[error("Measure '{field}' must be numeric, got {data_type}")]
    NonNumericMeasure { field: String, data_type: DataType },

    #[error("Custom metric '{0}' has an empty formula")]
    EmptyFormula(String),
}

/// Rejected placement. The placement set is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Unknown field '{field}' in model '{model}'")]
    UnknownField { field: String, model: String },

    #[error("Field '{field}' is a {actual} but {slot} requires a {expected}")]
    RoleMismatch {
        field: String,
        slot: Slot,
        expected: FieldRole,
        actual: FieldRole,
    },

    #[error("Field '{field}' is already placed in {slot}")]
    AlreadyPlaced { field: String, slot: Slot },

    #[error("Field '{0}' is not placed")]
    NotPlaced(String),

    #[error("Position {index} out of range for {slot} ({len} fields)")]
    IndexOutOfRange { slot: Slot, index: usize, len: usize },

    #[error("Field '{0}' is not a value field")]
    NotAValueField(String),

    #[error("Display name for field '{0}' cannot be empty")]
    EmptyName(String),

    #[error("Field '{field}' in {slot} has an aggregation that does not match the slot")]
    AggregationMismatch { field: String, slot: Slot },
}

/// Rejected filter edit. The condition sequence is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unknown field '{field}' in model '{model}'")]
    UnknownField { field: String, model: String },

    #[error("Operator {operator} is not available for {data_type} fields")]
    UnsupportedOperator {
        operator: FilterOperator,
        data_type: DataType,
    },

    #[error("Operator {operator} on '{field}' requires a value")]
    MissingValue { field: String, operator: FilterOperator },

    #[error("Operator {0} takes no value")]
    UnexpectedValue(FilterOperator),

    #[error("Operator {operator} expects a {expected} value")]
    ShapeMismatch {
        operator: FilterOperator,
        expected: ValueShape,
    },

    #[error("Value '{value}' does not fit {data_type} field '{field}'")]
    TypeMismatch {
        field: String,
        data_type: DataType,
        value: String,
    },

    #[error("Operator {0} needs at least one list item")]
    EmptyList(FilterOperator),

    #[error("Unknown filter condition: {0}")]
    UnknownCondition(ConditionId),

    #[error("Position {index} out of range ({len} conditions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Incomplete filter conditions: {0:?}")]
    Incomplete(Vec<ConditionId>),

    #[error("Duplicate filter condition id: {0}")]
    DuplicateCondition(ConditionId),

    #[error("No filter condition ids left")]
    IdsExhausted,

    #[error("Value '{value}' contains the list delimiter '{delimiter}'")]
    DelimiterInValue { value: String, delimiter: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Report name cannot be empty")]
    EmptyName,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
