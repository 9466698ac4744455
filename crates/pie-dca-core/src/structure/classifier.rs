//! Responses from an external structure classifier.
//!
//! The classifier is untrusted: it may wrap its JSON in Markdown fences or
//! return something that is not a `name -> {type, value}` mapping at all. A
//! batch with the wrong shape is rejected as a whole so nothing is partially
//! applied; well-shaped batches still go through per-entry checks in
//! [`merge`].

use serde_json::{Map, Value};
use tracing::info;

use super::merge::{merge, MergeReport};
use crate::error::PieError;
use crate::tree::Pie;
use crate::PieResult;

const FENCE: &str = "```";

/// Strip Markdown code fences, parse the JSON and check its shape.
pub fn parse_classifier_response(raw: &str) -> PieResult<Map<String, Value>> {
    let cleaned = strip_fences(raw);
    let parsed: Value = serde_json::from_str(cleaned).map_err(|e| {
        PieError::InvalidStructure(format!("failed to parse JSON from classifier response: {e}"))
    })?;
    Ok(validate_batch(&parsed)?.clone())
}

/// Check that `batch` is an object whose every value is an object carrying
/// both `type` and `value` keys.
pub fn validate_batch(batch: &Value) -> PieResult<&Map<String, Value>> {
    let entries = batch.as_object().ok_or_else(|| {
        PieError::InvalidStructure(format!("expected a mapping of slices, got {}", kind_of(batch)))
    })?;

    for (name, meta) in entries {
        let fields = meta.as_object().ok_or_else(|| {
            PieError::InvalidStructure(format!(
                "slice '{name}' must be an object, got {}",
                kind_of(meta)
            ))
        })?;
        for key in ["type", "value"] {
            if !fields.contains_key(key) {
                return Err(PieError::InvalidStructure(format!(
                    "slice '{name}' is missing '{key}'"
                )));
            }
        }
    }
    Ok(entries)
}

/// Validate a whole batch, then merge it into `pie`.
pub fn merge_batch(pie: &mut Pie, batch: &Value) -> PieResult<MergeReport> {
    let entries = validate_batch(batch)?;
    info!(pie = %pie.name, entries = entries.len(), "applying classifier batch");
    Ok(merge(pie, entries))
}

fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix(FENCE) {
        // drop the language tag, e.g. ```json
        s = match rest.find('\n') {
            Some(i) if rest[..i].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[i + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix(FENCE) {
        s = rest;
    }
    s.trim()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
