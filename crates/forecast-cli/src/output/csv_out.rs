use serde_json::Value;
use std::io;

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as long-format CSV: section, year, field, value.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let _ = wtr.write_record(["section", "year", "field", "value"]);

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    write_value(&mut wtr, "result", body);

    let _ = wtr.flush();
}

fn write_value(wtr: &mut CsvWriter<'_>, section: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) => write_value(wtr, &join(section, key), val),
                    Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
                        write_records(wtr, &join(section, key), arr)
                    }
                    _ => {
                        let _ = wtr.write_record([section, "", key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => write_records(wtr, section, arr),
        _ => {
            let _ = wtr.write_record([section, "", "", &format_csv_value(value)]);
        }
    }
}

fn write_records(wtr: &mut CsvWriter<'_>, section: &str, records: &[Value]) {
    for (i, record) in records.iter().enumerate() {
        let Value::Object(map) = record else {
            continue;
        };
        let year = map
            .get("year")
            .map(format_csv_value)
            .unwrap_or_else(|| i.to_string());
        for (key, val) in map.iter().filter(|(k, _)| k.as_str() != "year") {
            let _ = wtr.write_record([section, year.as_str(), key.as_str(), &format_csv_value(val)]);
        }
    }
}

fn join(section: &str, key: &str) -> String {
    format!("{}.{}", section, key)
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
