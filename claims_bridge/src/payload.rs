//! Raw request body parsing: JSON first, then header-row CSV.

use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};

use crate::error::BridgeResult;

/// Parse a request body into a document (object) or a batch (array).
///
/// - empty or whitespace-only body: `{}`
/// - JSON object or array: returned as is
/// - anything else: CSV with a header row, one object per data row
pub fn parse_payload(body: &str) -> BridgeResult<Value> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    if let Ok(parsed @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(body) {
        return Ok(parsed);
    }

    parse_csv(body).map(Value::Array)
}

/// Rows of a header-row CSV as objects with converted scalars.
///
/// Quotes only delimit a cell when they open it; a quote inside an
/// unquoted cell is literal text. Short rows fill missing columns with
/// null; surplus cells are dropped.
pub fn parse_csv(text: &str) -> BridgeResult<Vec<Value>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut object = Map::new();
        for (position, column) in header.iter().enumerate() {
            let value = record.get(position).map(convert_scalar).unwrap_or(Value::Null);
            object.insert(column.to_string(), value);
        }
        rows.push(Value::Object(object));
    }
    Ok(rows)
}

/// `true`/`false` (any case) become booleans; values containing a dot are
/// tried as floats, others as integers; everything else stays text.
pub fn convert_scalar(raw: &str) -> Value {
    let value = raw.trim();
    if value.is_empty() {
        return Value::String(String::new());
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    let number = if value.contains('.') {
        value.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        value.parse::<i64>().ok().map(Number::from)
    };
    number
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}
