//! Fuzz target: `decode_trigger`
//!
//! Feeds arbitrary bytes to the trigger decoder and checks:
//! - No panics under any byte sequence
//! - `Activate` only for JSON objects whose `msg` field is the activate value
//!
//! cargo fuzz run fuzz_trigger_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use stepbridge::app::trigger::{TriggerDecision, decode_trigger};

fuzz_target!(|data: &[u8]| {
    if decode_trigger(data) != TriggerDecision::Activate {
        return;
    }

    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(data) else {
        panic!("activated on a non-object payload");
    };
    let activate = match fields.get("msg") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        _ => false,
    };
    assert!(activate, "activated without msg == 1");
});
