use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::tree::{Node, NodeKind, Pie};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An incoming entry that was not applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

/// Outcome of a merge: names applied, in input order, and entries skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl MergeReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Insert or overwrite children of `pie` from `incoming`.
///
/// Each entry must be an object with a `type` of `"pie"` or `"ticker"` and a
/// `value` that is a non-negative number or numeric string. Anything else is
/// skipped with a warning and recorded in the report. An overwritten child
/// is replaced outright, so it loses its weight, target weight and any
/// children it had. The pie is not normalized.
pub fn merge(pie: &mut Pie, incoming: &Map<String, Value>) -> MergeReport {
    info!(pie = %pie.name, entries = incoming.len(), "merging structure");
    let mut report = MergeReport::default();

    for (name, meta) in incoming {
        match entry_to_node(name, meta) {
            Ok(node) => {
                if pie.children.insert(node).is_some() {
                    debug!(child = %name, "overwrote existing child");
                }
                report.applied.push(name.clone());
            }
            Err(reason) => {
                warn!(child = %name, %reason, "skipping malformed entry");
                report.skipped.push(SkippedEntry {
                    name: name.clone(),
                    reason,
                });
            }
        }
    }

    report
}

fn entry_to_node(name: &str, meta: &Value) -> Result<Node, String> {
    if name.trim().is_empty() {
        return Err("empty name".into());
    }
    let fields = meta
        .as_object()
        .ok_or_else(|| format!("expected an object, got {meta}"))?;

    let kind = match fields.get("type") {
        Some(Value::String(s)) => NodeKind::from_str(s).map_err(|e| e.to_string())?,
        Some(other) => return Err(format!("type must be a string, got {other}")),
        None => return Err("missing 'type'".into()),
    };
    let value = match fields.get("value") {
        Some(v) => coerce_value(v)?,
        None => return Err("missing 'value'".into()),
    };

    Ok(Node::of_kind(kind, name, value))
}

/// Numbers keep their written digits; strings are parsed after trimming.
fn coerce_value(value: &Value) -> Result<Money, String> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .ok_or_else(|| format!("{n} is not a decimal"))?,
        Value::String(s) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|_| format!("'{s}' is not numeric"))?,
        other => return Err(format!("value must be numeric, got {other}")),
    };
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(format!("negative value {parsed}"));
    }
    Ok(parsed)
}
