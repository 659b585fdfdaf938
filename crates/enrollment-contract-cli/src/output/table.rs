use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{body, cell, flatten};

/// Print a response as a table: slot and installment lists one row per
/// installment, everything else as field/value pairs.
pub fn print_table(value: &Value) {
    match body(value) {
        Value::Array(rows) => print_rows(rows),
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in flatten(map) {
                builder.push_record([key, val]);
            }
            println!("{}", Table::from(builder));
        }
        other => println!("{}", cell(other)),
    }
    print_warnings(value);
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(no installments)");
        return;
    };
    // manual slots omit unset fields, so take headers from the widest row
    let mut headers: Vec<String> = first.keys().cloned().collect();
    for row in rows.iter().filter_map(Value::as_object) {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows.iter().filter_map(Value::as_object) {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(h).map(cell).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }
}
