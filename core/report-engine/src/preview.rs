//! FILENAME: core/report-engine/src/preview.rs
//! Preview - a mock table shaped by the current placement set.
//!
//! No data is read. Row labels and numbers are synthesized so the user can
//! see the layout a placement set produces.

use serde::{Deserialize, Serialize};

use crate::definition::PlacedField;
use crate::placement::PlacementSet;

/// Members synthesized per column field.
const MEMBERS_PER_COLUMN_FIELD: usize = 2;

/// Upper bound on generated data columns.
pub const MAX_PREVIEW_COLUMNS: usize = 64;

/// Upper bound on generated body rows.
pub const MAX_PREVIEW_ROWS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PreviewCell {
    Blank,
    Label(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewTable {
    /// One caption per output column: row labels first, then data columns.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<PreviewCell>>,
    /// Set when data columns were cut at `MAX_PREVIEW_COLUMNS`.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PreviewView {
    /// Nothing is placed; nothing to preview.
    Empty,
    Table(PreviewTable),
}

impl PreviewView {
    pub fn is_empty(&self) -> bool {
        matches!(self, PreviewView::Empty)
    }
}

/// Builds the mock preview for `set` with `sample_rows` body rows, at most
/// `MAX_PREVIEW_ROWS`.
pub fn render_preview(set: &PlacementSet, sample_rows: usize) -> PreviewView {
    if set.is_empty() {
        return PreviewView::Empty;
    }

    let (column_keys, truncated) = column_keys(set.columns(), set.values());

    let mut headers: Vec<String> = set.rows().iter().map(|p| p.name.clone()).collect();
    if headers.is_empty() {
        headers.push(String::new());
    }
    headers.extend(column_keys.iter().cloned());

    let row_count = if set.rows().is_empty() {
        1
    } else {
        sample_rows.min(MAX_PREVIEW_ROWS)
    };
    let rows = (0..row_count)
        .map(|r| {
            let mut cells: Vec<PreviewCell> = if set.rows().is_empty() {
                vec![PreviewCell::Label("Total".to_string())]
            } else {
                set.rows()
                    .iter()
                    .map(|p| PreviewCell::Label(format!("{} {}", p.name, r + 1)))
                    .collect()
            };
            cells.extend((0..column_keys.len()).map(|c| {
                if set.values().is_empty() {
                    PreviewCell::Blank
                } else {
                    PreviewCell::Number(((r + 1) * (c + 1) * 10) as f64)
                }
            }));
            cells
        })
        .collect();

    PreviewView::Table(PreviewTable {
        headers,
        rows,
        truncated,
    })
}

/// Data column captions: every combination of synthesized column members,
/// crossed with every value field.
fn column_keys(columns: &[PlacedField], values: &[PlacedField]) -> (Vec<String>, bool) {
    let mut members: Vec<String> = vec![String::new()];
    let mut truncated = false;

    for field in columns {
        let mut next = Vec::with_capacity(members.len() * MEMBERS_PER_COLUMN_FIELD);
        'outer: for prefix in &members {
            for m in 1..=MEMBERS_PER_COLUMN_FIELD {
                if next.len() == MAX_PREVIEW_COLUMNS {
                    truncated = true;
                    break 'outer;
                }
                let label = format!("{} {}", field.name, m);
                next.push(if prefix.is_empty() {
                    label
                } else {
                    format!("{} / {}", prefix, label)
                });
            }
        }
        members = next;
    }

    if values.is_empty() {
        // Column members alone; a lone empty member means nothing to show.
        if members.len() == 1 && members[0].is_empty() {
            return (Vec::new(), truncated);
        }
        return (members, truncated);
    }

    let mut keys = Vec::new();
    'keys: for prefix in &members {
        for value in values {
            if keys.len() == MAX_PREVIEW_COLUMNS {
                truncated = true;
                break 'keys;
            }
            keys.push(if prefix.is_empty() {
                value.caption()
            } else {
                format!("{} / {}", prefix, value.caption())
            });
        }
    }
    (keys, truncated)
}
