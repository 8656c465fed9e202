//! Visibility clauses (`showif`) and their evaluation against accumulated flags.
//!
//! A clause list is a conjunction: every clause must pass. There is no OR or
//! NOT primitive. Clauses of a kind this engine does not know pass by default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::state::Flags;

/// A single visibility clause, evaluated against `flags[path]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawClause")]
pub enum Clause {
    /// Flag value strictly equals the literal.
    Eq { path: String, value: Value },
    /// Flag value strictly differs from the literal.
    Neq { path: String, value: Value },
    /// Flag value is a member of the set. An empty set never matches.
    In { path: String, values: Vec<Value> },
    /// `present = true` requires the flag to be bound, `false` requires it absent.
    Exists { path: String, present: bool },
    /// Unrecognized clause kind. Always passes.
    Unknown { path: String },
}

impl Clause {
    /// The flag path this clause reads.
    pub fn path(&self) -> &str {
        match self {
            Self::Eq { path, .. }
            | Self::Neq { path, .. }
            | Self::In { path, .. }
            | Self::Exists { path, .. }
            | Self::Unknown { path } => path,
        }
    }

    /// Evaluate this clause against the current flags.
    pub fn passes(&self, flags: &Flags) -> bool {
        let bound = flags.get(self.path());
        match self {
            Self::Eq { value, .. } => bound.is_some_and(|v| strict_eq(v, value)),
            Self::Neq { value, .. } => !bound.is_some_and(|v| strict_eq(v, value)),
            Self::In { values, .. } => {
                bound.is_some_and(|v| values.iter().any(|candidate| strict_eq(v, candidate)))
            }
            Self::Exists { present, .. } => bound.is_some() == *present,
            Self::Unknown { .. } => true,
        }
    }
}

/// Anything that carries a `showif` clause list.
pub trait Gated {
    fn showif(&self) -> &[Clause];
}

/// True iff every clause attached to `node` passes. No clauses means visible.
pub fn passes_show_if(flags: &Flags, node: &impl Gated) -> bool {
    node.showif().iter().all(|clause| clause.passes(flags))
}

/// Strict equality: numbers compare by value regardless of integer/float
/// representation, everything else compares structurally.
fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Clause as it appears in the config document. Operand keys are kept even
/// when their value is `null`, so `{"eq": null}` is still an eq clause.
#[derive(Debug, Default, Deserialize)]
struct RawClause {
    #[serde(default)]
    path: String,
    #[serde(default, deserialize_with = "present")]
    eq: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    neq: Option<Value>,
    #[serde(default, rename = "in", deserialize_with = "present")]
    any_of: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    exists: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<RawClause> for Clause {
    fn from(raw: RawClause) -> Self {
        let path = raw.path;
        if let Some(value) = raw.eq {
            Self::Eq { path, value }
        } else if let Some(value) = raw.neq {
            Self::Neq { path, value }
        } else if let Some(set) = raw.any_of {
            let values = match set {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            Self::In { path, values }
        } else if let Some(flag) = raw.exists {
            Self::Exists {
                path,
                present: truthy(&flag),
            }
        } else {
            Self::Unknown { path }
        }
    }
}
