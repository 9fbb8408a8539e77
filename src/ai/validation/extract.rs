//! Structured Output Extraction
//!
//! Boundary-slicing heuristic for model output:
//! 1. Interior of the first fenced code block, if any
//! 2. From the first `{` or `[` to the rightmost `}` or `]`
//!    (to the end of the text when no closer follows)
//! 3. Decode with serde_json
//!
//! Text with no opening bracket is returned as a trimmed JSON string. A slice
//! that does not decode is a `MalformedOutput` carrying the full raw text; no
//! repair is attempted.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{GenError, Result};

static FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*?)```").ok());

fn fenced_interior(raw: &str) -> Option<&str> {
    FENCE
        .as_ref()?
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Candidate JSON payload inside `text`, or `None` when no opener exists
fn payload_slice(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let slice = match text.rfind(['}', ']']) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    };
    Some(slice)
}

/// Extract a JSON value from free-form model output
pub fn extract(raw: &str) -> Result<Value> {
    let body = fenced_interior(raw).unwrap_or(raw);

    let Some(payload) = payload_slice(body) else {
        debug!("No JSON opener in model output, returning text");
        return Ok(Value::String(raw.trim().to_string()));
    };

    serde_json::from_str(payload).map_err(|e| {
        warn!(error = %e, bytes = raw.len(), "Model output is not valid JSON");
        GenError::malformed(raw, e.to_string())
    })
}

/// Extract and deserialize into a concrete type.
///
/// A value that decodes as JSON but does not fit `T` is also reported as
/// `MalformedOutput`.
pub fn extract_as<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value = extract(raw)?;
    serde_json::from_value(value).map_err(|e| GenError::malformed(raw, e.to_string()))
}
