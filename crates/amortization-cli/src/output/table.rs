use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use crate::output::{result_of, tabular_rows};

/// Format output as tables: scalar fields first, then any row data.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match result {
        Value::Object(map) => {
            let scalars: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(_, v)| !v.is_array() && !v.is_object())
                .collect();
            if !scalars.is_empty() {
                print_fields(scalars);
            }

            if let Some(Value::Object(summary)) = map.get("summary") {
                println!("\n{}", "Summary".bold());
                print_fields(summary.iter().collect());
            }

            if let Some(rows) = tabular_rows(result) {
                println!();
                print_rows(&rows);
            }
        }
        Value::Array(arr) => {
            let rows: Vec<Map<String, Value>> =
                arr.iter().filter_map(|r| r.as_object().cloned()).collect();
            print_rows(&rows);
        }
        _ => println!("{}", format_value(result)),
    }

    if let Some(envelope) = value.as_object() {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\n{}", "Warnings:".yellow());
                for w in warnings {
                    if let Value::String(s) = w {
                        println!("  - {}", s);
                    }
                }
            }
        }
        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {}", meth);
        }
    }
}

fn print_fields(fields: Vec<(&String, &Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Map<String, Value>]) {
    let Some(first) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
