use serde_json::Value;

/// Fields reported by `--output minimal`, first match wins.
const PRIORITY_KEYS: [&str; 6] = [
    "max_abs_balance_check",
    "revenue_cagr",
    "total_interest",
    "mean_abs_pct_error",
    "dso_days",
    "base_year",
];

/// Print just the key answer value from the output.
///
/// Searches the result object (and nested objects) for the priority fields,
/// then falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for key in PRIORITY_KEYS {
        if let Some(val) = find_key(result_obj, key) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// Depth-first search through nested objects; arrays are not entered.
fn find_key<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let Value::Object(map) = value else {
        return None;
    };
    if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
        return Some(val);
    }
    map.values().find_map(|v| find_key(v, key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
