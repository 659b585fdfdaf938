pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The part of a response worth tabulating: the `result` of a summary
/// envelope, or the value itself.
pub(crate) fn body(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|map| map.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into `parent.child` rows, e.g. `derived.final_amount_usd`.
pub(crate) fn flatten(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    push_rows(&mut rows, None, map);
    rows
}

fn push_rows(rows: &mut Vec<(String, String)>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, val) in map {
        let key = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match val {
            Value::Object(inner) => push_rows(rows, Some(&key), inner),
            other => rows.push((key, cell(other))),
        }
    }
}

/// Render a scalar for a table or CSV cell. Amounts arrive as strings.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
