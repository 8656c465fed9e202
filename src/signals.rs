//! Instrumentation signals emitted by the engine and the embedder.
//!
//! The sink is an injected capability. Hosts that do not care pass
//! [`NoopSink`]; [`TracingSink`] forwards every signal to `tracing`.

use serde::Serialize;
use serde_json::Value;

/// A named analytics signal with its parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Signal {
    #[serde(rename = "quiz_start")]
    Start { quiz_id: String },

    #[serde(rename = "quiz_step")]
    Step {
        quiz_id: String,
        step_id: String,
        step_index: usize,
        answer_label: String,
        percent_complete: u8,
    },

    #[serde(rename = "quiz_toggle")]
    Toggle {
        quiz_id: String,
        step_id: String,
        answer_id: String,
        selected: bool,
    },

    #[serde(rename = "quiz_lead")]
    Lead { quiz_id: String },

    #[serde(rename = "quiz_restart")]
    Restart { quiz_id: String },

    #[serde(rename = "quiz_complete")]
    Complete {
        quiz_id: String,
        result_id: String,
        percent_complete: u8,
    },

    #[serde(rename = "quiz_error")]
    Error { reason: String },
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "quiz_start",
            Self::Step { .. } => "quiz_step",
            Self::Toggle { .. } => "quiz_toggle",
            Self::Lead { .. } => "quiz_lead",
            Self::Restart { .. } => "quiz_restart",
            Self::Complete { .. } => "quiz_complete",
            Self::Error { .. } => "quiz_error",
        }
    }

    /// Parameter bag without the event name.
    pub fn params(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("event");
        }
        value
    }
}

/// Receives signals. Must not fail or block.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: &Signal);
}

/// Discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl SignalSink for NoopSink {
    fn emit(&self, _signal: &Signal) {}
}

/// Logs every signal as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SignalSink for TracingSink {
    fn emit(&self, signal: &Signal) {
        match signal {
            Signal::Error { reason } => {
                tracing::error!(event = signal.name(), reason = %reason, "Quiz signal");
            }
            _ => tracing::info!(event = signal.name(), params = %signal.params(), "Quiz signal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_with_event_name() {
        let signal = Signal::Complete {
            quiz_id: "fit".into(),
            result_id: "x".into(),
            percent_complete: 100,
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["event"], signal.name());
        assert_eq!(json["result_id"], "x");
    }

    #[test]
    fn params_drop_event_name() {
        let signal = Signal::Step {
            quiz_id: "fit".into(),
            step_id: "q1".into(),
            step_index: 0,
            answer_label: "Yes".into(),
            percent_complete: 0,
        };
        assert_eq!(
            signal.params(),
            json!({
                "quiz_id": "fit",
                "step_id": "q1",
                "step_index": 0,
                "answer_label": "Yes",
                "percent_complete": 0
            })
        );
    }

    #[test]
    fn names_match_serde_tags() {
        let signals = [
            Signal::Start { quiz_id: String::new() },
            Signal::Lead { quiz_id: String::new() },
            Signal::Restart { quiz_id: String::new() },
            Signal::Error { reason: "missing_config".into() },
        ];
        for signal in signals {
            let json = serde_json::to_value(&signal).unwrap();
            assert_eq!(json["event"], signal.name());
        }
    }
}
