//! Merges a committed answer's effects into the run state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{Answer, Question};
use super::state::RuntimeState;

/// One committed answer in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub question_id: String,
    pub question_text: String,
    pub answer_id: String,
    pub answer_label: String,
}

/// Record `answer` on the trail, overwrite its flags, and add its score deltas.
///
/// Deltas only touch outcome ids that already have a score; unknown ids are
/// ignored so the score key set never changes.
pub fn apply_answer(state: &mut RuntimeState, question: &Question, answer: &Answer) {
    state.trail.push(TrailEntry {
        question_id: question.id.clone(),
        question_text: question.prompt().to_string(),
        answer_id: answer.id.clone(),
        answer_label: question.answer_label(answer),
    });

    for (path, value) in &answer.set {
        state.flags.insert(path.clone(), value.clone());
    }

    for (outcome, delta) in &answer.add {
        match state.scores.get_mut(outcome) {
            Some(score) => *score += numeric_delta(delta),
            None => {
                tracing::debug!(outcome = %outcome, "Score delta for unknown outcome ignored");
            }
        }
    }
}

/// Numbers and numeric strings count; anything else is 0.
fn numeric_delta(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|d| d.is_finite()).unwrap_or(0.0)
}
