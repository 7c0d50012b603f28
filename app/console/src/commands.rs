//! FILENAME: app/console/src/commands.rs
// PURPOSE: Commands behind the report configuration dialogs.
// CONTEXT: Every command takes the shared AppState and returns
//          Result<_, String>; rejected edits are logged and leave state as is.

use report_engine::{
    operators_for, ConditionId, FieldRegistry, FilterAction, FilterOperator, InMemoryRegistry,
    PlacementAction, PreviewView, ReportAction, ReportEditor,
};
use uuid::Uuid;

use crate::types::{
    AddFilterRequest, AddFilterResponse, EditFilterRequest, EditorStateResponse, FieldInfo,
    ModelInfo, MoveFieldRequest, OpenEditorRequest, OperatorInfo, PlaceFieldRequest,
    RegisterMetricRequest, RenameFieldRequest, ReorderFieldRequest, ReportSummary,
    SaveReportResponse, SetAggregationRequest, UpdateDetailsRequest,
};
use crate::{log_debug, log_enter, log_exit, log_info, log_warn, AppState};

// ============================================================================
// HELPERS
// ============================================================================

/// Runs `f` against the registry and the open editor.
/// Lock order is always registry, then editor.
fn with_editor<T>(
    state: &AppState,
    f: impl FnOnce(&InMemoryRegistry, &mut ReportEditor) -> Result<T, String>,
) -> Result<T, String> {
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    let mut guard = state.editor.lock().map_err(|e| e.to_string())?;
    let editor = guard.as_mut().ok_or("No report editor is open")?;
    f(&registry, editor)
}

fn editor_state(registry: &InMemoryRegistry, editor: &ReportEditor) -> EditorStateResponse {
    let placements = editor.placements();
    let filters = editor.filters();
    EditorStateResponse {
        report_id: editor.id(),
        name: editor.name().to_string(),
        description: editor.description().to_string(),
        model: editor.model().to_string(),
        rows: placements.rows().to_vec(),
        columns: placements.columns().to_vec(),
        values: placements.values().to_vec(),
        available: placements
            .available(registry, editor.model())
            .into_iter()
            .map(FieldInfo::from)
            .collect(),
        conditions: filters.conditions().to_vec(),
        expression: filters.render_expression(),
        has_mixed_joiners: filters.has_mixed_joiners(),
        incomplete_conditions: filters.incomplete(),
    }
}

/// Applies one editor transition, logging a rejection as a warning.
fn apply_action(
    state: &AppState,
    action: ReportAction,
) -> Result<(Option<ConditionId>, EditorStateResponse), String> {
    with_editor(state, |registry, editor| {
        let label = format!("{:?}", action);
        match editor.apply(registry, action) {
            Ok(id) => {
                log_debug!("EDITOR", "applied {}", label);
                Ok((id, editor_state(registry, editor)))
            }
            Err(e) => {
                log_warn!("EDITOR", "rejected {}: {}", label, e);
                Err(e.to_string())
            }
        }
    })
}

fn parse_operator(name: &str) -> Result<FilterOperator, String> {
    name.parse::<FilterOperator>().map_err(|e| {
        log_warn!("FILTER", "{}", e);
        e
    })
}

// ============================================================================
// REGISTRY COMMANDS
// ============================================================================

pub fn list_models(state: &AppState) -> Result<Vec<ModelInfo>, String> {
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    Ok(registry.models().into_iter().map(ModelInfo::from).collect())
}

pub fn get_model_fields(state: &AppState, model: &str) -> Result<Vec<FieldInfo>, String> {
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    let model = registry
        .model(model)
        .ok_or_else(|| format!("Unknown data model: {}", model))?;
    Ok(model.fields.iter().map(FieldInfo::from).collect())
}

/// Operators offered for a field, in table order.
pub fn get_filter_operators(
    state: &AppState,
    model: &str,
    field: &str,
) -> Result<Vec<OperatorInfo>, String> {
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    let field = registry
        .field(model, field)
        .ok_or_else(|| format!("Unknown field '{}' in model '{}'", field, model))?;
    Ok(operators_for(field.data_type)
        .iter()
        .map(|&operator| OperatorInfo {
            operator,
            value_shape: operator.value_shape(),
        })
        .collect())
}

pub fn register_custom_metric(
    state: &AppState,
    request: RegisterMetricRequest,
) -> Result<FieldInfo, String> {
    log_enter!("METRIC", "register_custom_metric", "model={} id={}", request.model, request.id);
    let mut registry = state.registry.lock().map_err(|e| e.to_string())?;
    let field = registry
        .register_custom_metric(
            &request.model,
            &request.id,
            &request.name,
            request.data_type,
            &request.formula,
        )
        .map_err(|e| {
            log_warn!("METRIC", "rejected custom metric {}: {}", request.id, e);
            e.to_string()
        })?;
    let info = FieldInfo::from(field);
    log_exit!("METRIC", "register_custom_metric", "id={}", info.id);
    Ok(info)
}

// ============================================================================
// EDITOR LIFECYCLE
// ============================================================================

/// Opens the report dialog, discarding any dialog that was still open.
pub fn open_report_editor(
    state: &AppState,
    request: OpenEditorRequest,
) -> Result<EditorStateResponse, String> {
    log_enter!("EDITOR", "open_report_editor", "{:?}", request);
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    let delimiter = state.config.list_delimiter.as_str();

    let editor = match (request.report_id, request.model) {
        (Some(id), _) => {
            let config = {
                let reports = state.reports.lock().map_err(|e| e.to_string())?;
                reports
                    .get(id)
                    .cloned()
                    .ok_or_else(|| format!("Report not found: {}", id))?
            };
            ReportEditor::hydrate(&*registry, config, delimiter)
        }
        (None, Some(model)) => ReportEditor::with_delimiter(&*registry, &model, delimiter),
        (None, None) => return Err("Either a model or a report id is required".to_string()),
    }
    .map_err(|e| {
        log_warn!("EDITOR", "cannot open editor: {}", e);
        e.to_string()
    })?;

    let response = editor_state(&registry, &editor);
    let mut guard = state.editor.lock().map_err(|e| e.to_string())?;
    if guard.is_some() {
        log_debug!("EDITOR", "discarding previously open editor");
    }
    *guard = Some(editor);

    log_exit!("EDITOR", "open_report_editor", "model={}", response.model);
    Ok(response)
}

/// Closes the dialog without saving. Unsaved state is dropped.
pub fn cancel_report_editor(state: &AppState) -> Result<(), String> {
    let mut guard = state.editor.lock().map_err(|e| e.to_string())?;
    if guard.take().is_some() {
        log_info!("EDITOR", "editor cancelled");
    }
    Ok(())
}

pub fn get_editor_state(state: &AppState) -> Result<EditorStateResponse, String> {
    with_editor(state, |registry, editor| Ok(editor_state(registry, editor)))
}

pub fn update_report_details(
    state: &AppState,
    request: UpdateDetailsRequest,
) -> Result<EditorStateResponse, String> {
    let mut response = None;
    if let Some(name) = request.name {
        response = Some(apply_action(state, ReportAction::SetName(name))?.1);
    }
    if let Some(description) = request.description {
        response = Some(apply_action(state, ReportAction::SetDescription(description))?.1);
    }
    match response {
        Some(response) => Ok(response),
        None => get_editor_state(state),
    }
}

// ============================================================================
// PLACEMENT COMMANDS
// ============================================================================

pub fn place_field(state: &AppState, request: PlaceFieldRequest) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::Place {
        field: request.field,
        slot: request.slot,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

/// Takes a field out of a slot. Never rejected.
pub fn remove_field(state: &AppState, request: PlaceFieldRequest) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::Remove {
        field: request.field,
        slot: request.slot,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

pub fn move_field(state: &AppState, request: MoveFieldRequest) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::Move {
        field: request.field,
        slot: request.slot,
        index: request.index,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

pub fn reorder_field(state: &AppState, request: ReorderFieldRequest) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::Reorder {
        slot: request.slot,
        from: request.from,
        to: request.to,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

pub fn rename_field(state: &AppState, request: RenameFieldRequest) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::Rename {
        field: request.field,
        name: request.name,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

pub fn set_value_aggregation(
    state: &AppState,
    request: SetAggregationRequest,
) -> Result<EditorStateResponse, String> {
    let action = PlacementAction::SetAggregation {
        field: request.field,
        aggregation: request.aggregation,
    };
    Ok(apply_action(state, ReportAction::Placement(action))?.1)
}

// ============================================================================
// FILTER COMMANDS
// ============================================================================

pub fn add_filter_condition(
    state: &AppState,
    request: AddFilterRequest,
) -> Result<AddFilterResponse, String> {
    let action = FilterAction::Add {
        field: request.field,
        operator: parse_operator(&request.operator)?,
        value: request.value,
        joiner: Some(request.joiner.unwrap_or(state.config.default_joiner)),
    };
    let (id, editor) = apply_action(state, ReportAction::Filter(action))?;
    let id = id.ok_or("Filter condition was not created")?;
    Ok(AddFilterResponse { id, editor })
}

/// Changing the field or operator clears the stored value.
pub fn edit_filter_condition(
    state: &AppState,
    request: EditFilterRequest,
) -> Result<EditorStateResponse, String> {
    let operator = match request.operator {
        Some(ref name) => Some(parse_operator(name)?),
        None => None,
    };
    let action = FilterAction::Edit {
        id: request.id,
        field: request.field,
        operator,
        value: request.value,
        joiner: request.joiner,
    };
    Ok(apply_action(state, ReportAction::Filter(action))?.1)
}

pub fn remove_filter_condition(state: &AppState, id: ConditionId) -> Result<EditorStateResponse, String> {
    Ok(apply_action(state, ReportAction::Filter(FilterAction::Remove { id }))?.1)
}

pub fn move_filter_condition(
    state: &AppState,
    id: ConditionId,
    index: usize,
) -> Result<EditorStateResponse, String> {
    Ok(apply_action(state, ReportAction::Filter(FilterAction::Move { id, index }))?.1)
}

pub fn get_filter_expression(state: &AppState) -> Result<String, String> {
    with_editor(state, |_, editor| {
        if editor.filters().has_mixed_joiners() {
            log_warn!("FILTER", "expression mixes AND and OR without grouping");
        }
        Ok(editor.render_expression())
    })
}

pub fn get_report_preview(state: &AppState) -> Result<PreviewView, String> {
    let sample_rows = state.config.preview_sample_rows;
    with_editor(state, |_, editor| Ok(editor.preview(sample_rows)))
}

// ============================================================================
// SAVE & REPORT LIST
// ============================================================================

/// Builds the configuration, hands it to the sink, records it and closes the
/// editor. On failure the editor stays open.
pub fn save_report(state: &AppState) -> Result<SaveReportResponse, String> {
    log_enter!("REPORT", "save_report");
    let registry = state.registry.lock().map_err(|e| e.to_string())?;
    let mut guard = state.editor.lock().map_err(|e| e.to_string())?;
    let editor = guard.as_ref().ok_or("No report editor is open")?;

    let config = editor.build(&*registry).map_err(|e| {
        log_warn!("REPORT", "save rejected: {}", e);
        e.to_string()
    })?;
    if editor.filters().has_mixed_joiners() {
        log_warn!("REPORT", "saving expression that mixes AND and OR without grouping");
    }
    let expression = editor.render_expression();

    let mut reports = state.reports.lock().map_err(|e| e.to_string())?;
    let config = reports.prepare(config);
    state.sink.save(&config).map_err(|e| {
        log_warn!("REPORT", "save collaborator failed: {}", e);
        e
    })?;
    let id = reports.upsert(config);
    *guard = None;

    log_info!("REPORT", "saved report id={}", id);
    Ok(SaveReportResponse { id, expression })
}

pub fn list_reports(state: &AppState) -> Result<Vec<ReportSummary>, String> {
    let reports = state.reports.lock().map_err(|e| e.to_string())?;
    Ok(reports.list().iter().map(ReportSummary::from).collect())
}

pub fn search_reports(state: &AppState, query: &str) -> Result<Vec<ReportSummary>, String> {
    let reports = state.reports.lock().map_err(|e| e.to_string())?;
    Ok(reports.search(query).into_iter().map(ReportSummary::from).collect())
}

pub fn delete_report(state: &AppState, id: Uuid) -> Result<(), String> {
    let mut reports = state.reports.lock().map_err(|e| e.to_string())?;
    reports
        .delete(id)
        .map(|_| log_info!("REPORT", "deleted report id={}", id))
        .ok_or_else(|| format!("Report not found: {}", id))
}
