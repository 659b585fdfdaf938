use serde_json::Value;

use super::{body, cell};

/// Keys that carry the one answer a command exists for, most specific first.
const ANSWER_KEYS: [&str; 6] = [
    "final_amount_usd",
    "amount_usd",
    "due_date",
    "message",
    "valid",
    "amount",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = body(value);

    if let Value::Object(map) = result {
        let answer = ANSWER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| !v.is_null())
            .or_else(|| map.get("derived").and_then(|d| d.get("final_amount_usd")));
        match answer {
            Some(val) => println!("{}", cell(val)),
            None => {
                if let Some((key, val)) = map.iter().next() {
                    println!("{key}: {}", cell(val));
                }
            }
        }
        return;
    }

    if let Value::Array(rows) = result {
        println!("{} installments", rows.len());
        return;
    }

    println!("{}", cell(result));
}
