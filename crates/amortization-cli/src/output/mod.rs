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

/// The `result` object of an envelope, or the value itself for bare output.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Row-shaped data carried by a command's output: schedule entries, the
/// frequency list, or the two chart series joined on payment number.
pub(crate) fn tabular_rows(result: &Value) -> Option<Vec<Map<String, Value>>> {
    let map = result.as_object()?;

    for key in ["entries", "frequencies"] {
        if let Some(Value::Array(rows)) = map.get(key) {
            return Some(rows.iter().filter_map(|r| r.as_object().cloned()).collect());
        }
    }

    let principal = map.get("principal_data")?.as_array()?;
    let interest = map.get("interest_data").and_then(Value::as_array);
    let rows = principal
        .iter()
        .map(|point| {
            let number = point.get("payment_number").cloned().unwrap_or(Value::Null);
            let interest_value = interest
                .and_then(|series| series.iter().find(|p| p.get("payment_number") == Some(&number)))
                .and_then(|p| p.get("value"))
                .cloned()
                .unwrap_or(Value::Null);
            let mut row = Map::new();
            row.insert("payment_number".into(), number);
            row.insert("principal".into(), point.get("value").cloned().unwrap_or(Value::Null));
            row.insert("interest".into(), interest_value);
            row
        })
        .collect();
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_are_rows() {
        let value = json!({ "result": { "schedule_count": 1, "entries": [{ "payment_number": 0 }] } });
        let rows = tabular_rows(result_of(&value)).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_chart_series_join() {
        let result = json!({
            "principal_data": [{ "payment_number": 1, "value": "10" }, { "payment_number": 2, "value": "11" }],
            "interest_data": [{ "payment_number": 2, "value": "4" }],
        });
        let rows = tabular_rows(&result).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["interest"], Value::Null);
        assert_eq!(rows[1]["interest"], "4");
    }

    #[test]
    fn test_scalar_result_has_no_rows() {
        assert!(tabular_rows(&json!({ "payment_amount": "1073.8218" })).is_none());
    }
}
