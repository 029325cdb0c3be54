//! ==============================================================================
//! ingest.rs - wire payload decoding for the ingestion endpoint
//! ==============================================================================
//!
//! purpose:
//!     turns an inbound request body into the canonical (temperature, humidity)
//!     pair. embedded clients speak three encodings, selected by content type:
//!     url-encoded form, json, or free-form text with `temp=`/`hum=` markers.
//!
//! parsing policy:
//!     permissive on purpose. a field that is absent or fails to parse as a
//!     float becomes 0.0, and a body that fails to parse as a whole degrades
//!     the same way. malformed sensor data is never a rejection; the firmware
//!     on the sending side cannot handle error responses.
//!
//! relationships:
//!     - used by: server.rs (ingest handler)
//!
//! ==============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// the two numeric fields every encoding must yield
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFields {
    pub temperature: f64,
    pub humidity: f64,
}

/// wire encoding of an ingest body, chosen from the content-type header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// application/x-www-form-urlencoded
    Form,
    /// application/json
    Json,
    /// anything else - body is coerced to text and pattern-matched
    Text,
}

impl PayloadKind {
    /// classify a content-type header value (parameters like charset ignored)
    pub fn from_content_type(value: Option<&str>) -> Self {
        match value {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => PayloadKind::Form,
            Some(ct) if ct.starts_with("application/json") => PayloadKind::Json,
            _ => PayloadKind::Text,
        }
    }
}

/// decode a request body into sensor fields
///
/// never fails: every branch falls back to 0.0 per field.
pub fn decode(kind: PayloadKind, body: &[u8]) -> SensorFields {
    match kind {
        PayloadKind::Form => decode_form(body),
        PayloadKind::Json => decode_json(body),
        PayloadKind::Text => decode_text(body),
    }
}

fn decode_form(body: &[u8]) -> SensorFields {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
    let field = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    SensorFields {
        temperature: parse_float(field("temp")),
        humidity: parse_float(field("hum")),
    }
}

fn decode_json(body: &[u8]) -> SensorFields {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    SensorFields {
        temperature: json_float(value.get("temp")),
        humidity: json_float(value.get("hum")),
    }
}

fn decode_text(body: &[u8]) -> SensorFields {
    static TEMP_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"temp\s*=\s*(-?\d+(?:\.\d+)?)").unwrap());
    static HUM_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"hum\s*=\s*(-?\d+(?:\.\d+)?)").unwrap());

    let text = String::from_utf8_lossy(body);
    let capture = |re: &Regex| {
        re.captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };
    SensorFields {
        temperature: parse_float(capture(&TEMP_RE).as_deref()),
        humidity: parse_float(capture(&HUM_RE).as_deref()),
    }
}

/// best-effort float: absent or garbage input becomes 0.0
fn parse_float(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// json fields may arrive as numbers or as numeric strings
fn json_float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
