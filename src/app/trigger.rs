//! Trigger payload decoding.
//!
//! Messages on the trigger topic are UTF-8 JSON objects.  Only one field
//! matters: `msg` equal to 1 (integer `1`, `1.0`, or `true`) requests an
//! actuation run.  Everything else is a recoverable [`TriggerDecision::Ignored`].

use core::fmt;

use serde_json::Value;

/// Field carrying the trigger indicator.
pub const TRIGGER_FIELD: &str = "msg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Start an actuation run.
    Activate,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not valid UTF-8 JSON, or not a JSON object.
    Malformed,
    /// Valid object without the trigger field.
    MissingField,
    /// Trigger field present with a value other than the activate sentinel.
    Inactive,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed payload"),
            Self::MissingField => write!(f, "no '{}' field", TRIGGER_FIELD),
            Self::Inactive => write!(f, "'{}' is not the activate value", TRIGGER_FIELD),
        }
    }
}

/// Whether `value` is the activate sentinel.
fn is_activate(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => {
            n.as_u64() == Some(1) || n.as_i64() == Some(1) || n.as_f64() == Some(1.0)
        }
        _ => false,
    }
}

/// Classify one raw message.  Never panics, whatever the bytes.
pub fn decode_trigger(payload: &[u8]) -> TriggerDecision {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(payload) else {
        return TriggerDecision::Ignored(IgnoreReason::Malformed);
    };
    match fields.get(TRIGGER_FIELD) {
        None | Some(Value::Null) => TriggerDecision::Ignored(IgnoreReason::MissingField),
        Some(v) if is_activate(v) => TriggerDecision::Activate,
        Some(_) => TriggerDecision::Ignored(IgnoreReason::Inactive),
    }
}
