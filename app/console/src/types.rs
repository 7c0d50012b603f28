//! FILENAME: app/console/src/types.rs
use chrono::{DateTime, Utc};
use report_engine::{
    AggregationType, ConditionId, ConditionValue, DataModel, DataType, Field, FieldRole,
    FilterCondition, FilterOperator, Joiner, PlacedField, ReportConfiguration, Slot, ValueShape,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub field_count: usize,
}

impl From<&DataModel> for ModelInfo {
    fn from(model: &DataModel) -> Self {
        ModelInfo {
            id: model.id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            field_count: model.fields.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub id: String,
    pub name: String,
    pub role: FieldRole,
    pub data_type: DataType,
    pub is_custom_metric: bool,
}

impl From<&Field> for FieldInfo {
    fn from(field: &Field) -> Self {
        FieldInfo {
            id: field.id.clone(),
            name: field.name.clone(),
            role: field.role,
            data_type: field.data_type,
            is_custom_metric: field.is_custom_metric(),
        }
    }
}

/// One entry of a field's operator dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfo {
    pub operator: FilterOperator,
    pub value_shape: ValueShape,
}

/// Request to add a user-defined measure to a model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMetricRequest {
    pub model: String,
    pub id: String,
    pub name: String,
    pub data_type: DataType,
    pub formula: String,
}

// ============================================================================
// EDITOR REQUESTS
// ============================================================================

/// Opens the report dialog: `report_id` edits a saved report, otherwise a
/// new report is started on `model`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEditorRequest {
    pub model: Option<String>,
    pub report_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFieldRequest {
    pub field: String,
    pub slot: Slot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFieldRequest {
    pub field: String,
    pub slot: Slot,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFieldRequest {
    pub slot: Slot,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFieldRequest {
    pub field: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAggregationRequest {
    pub field: String,
    pub aggregation: AggregationType,
}

/// Request to append a filter condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilterRequest {
    pub field: String,
    /// Operator name: "equals", "greater_than", "between", ...
    pub operator: String,
    pub value: Option<ConditionValue>,
    /// Defaults to the configured joiner
    pub joiner: Option<Joiner>,
}

/// Request to change parts of a filter condition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFilterRequest {
    pub id: ConditionId,
    pub field: Option<String>,
    pub operator: Option<String>,
    pub value: Option<ConditionValue>,
    pub joiner: Option<Joiner>,
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Everything the report dialog renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorStateResponse {
    pub report_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub model: String,
    pub rows: Vec<PlacedField>,
    pub columns: Vec<PlacedField>,
    pub values: Vec<PlacedField>,
    /// Fields not placed anywhere, in registry order
    pub available: Vec<FieldInfo>,
    pub conditions: Vec<FilterCondition>,
    pub expression: String,
    pub has_mixed_joiners: bool,
    pub incomplete_conditions: Vec<ConditionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilterResponse {
    pub id: ConditionId,
    pub editor: EditorStateResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportResponse {
    pub id: Uuid,
    pub expression: String,
}

/// Row of the report management table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub model: String,
    pub field_count: usize,
    pub filter_count: usize,
    pub saved_at: Option<DateTime<Utc>>,
}

impl From<&ReportConfiguration> for ReportSummary {
    fn from(report: &ReportConfiguration) -> Self {
        ReportSummary {
            id: report.id,
            name: report.name.clone(),
            description: report.description.clone(),
            model: report.model.clone(),
            field_count: report.placements.len(),
            filter_count: report.filters.len(),
            saved_at: report.saved_at,
        }
    }
}
