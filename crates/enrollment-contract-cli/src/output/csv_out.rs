use serde_json::Value;
use std::io;

use super::{body, cell, flatten};

/// Write a response as CSV to stdout: one record per installment for lists,
/// `field,value` pairs otherwise.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match body(value) {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => std::iter::once(("field".to_string(), "value".to_string()))
            .chain(flatten(map))
            .try_for_each(|(k, v)| wtr.write_record([k, v])),
        other => wtr.write_record([cell(other)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {e}");
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&String> = first.keys().collect();
    wtr.write_record(&headers)?;
    for row in rows.iter().filter_map(Value::as_object) {
        wtr.write_record(headers.iter().map(|h| row.get(*h).map(cell).unwrap_or_default()))?;
    }
    Ok(())
}
