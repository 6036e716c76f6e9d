use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: scalar fields as Field/Value pairs and every
/// per-year statement as a line-item by year grid.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(None, result);
                print_envelope_notes(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(arr) => print_statement(None, arr),
        _ => println!("{}", value),
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
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

fn print_section(title: Option<&str>, value: &Value) {
    let Value::Object(map) = value else {
        if let Value::Array(arr) = value {
            print_statement(title, arr);
        } else {
            println!("{}", format_value(value));
        }
        return;
    };

    let mut scalars = Builder::default();
    scalars.push_record(["Field", "Value"]);
    let mut has_scalars = false;
    let mut nested: Vec<(&String, &Value)> = Vec::new();
    for (key, val) in map {
        if is_record_list(val) || val.is_object() {
            nested.push((key, val));
        } else {
            scalars.push_record([key.as_str(), &format_value(val)]);
            has_scalars = true;
        }
    }

    if has_scalars {
        print_title(title);
        println!("{}", Table::from(scalars));
    }
    for (key, val) in nested {
        print_section(Some(key), val);
    }
}

/// Rows are line items, columns are years.
fn print_statement(title: Option<&str>, records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        print_title(title);
        for item in records {
            println!("{}", format_value(item));
        }
        return;
    };

    let mut header = vec!["Line item".to_string()];
    for (i, record) in records.iter().enumerate() {
        let label = record
            .get("year")
            .map(format_value)
            .unwrap_or_else(|| i.to_string());
        header.push(format!("Y{}", label));
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for key in first.keys().filter(|k| k.as_str() != "year") {
        let mut row = vec![key.clone()];
        row.extend(
            records
                .iter()
                .map(|r| r.get(key).map(format_value).unwrap_or_default()),
        );
        builder.push_record(row);
    }

    print_title(title);
    println!("{}", Table::from(builder));
}

fn print_title(title: Option<&str>) {
    if let Some(t) = title {
        println!("\n{}", t.replace('_', " ").to_uppercase());
    }
}

fn is_record_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
