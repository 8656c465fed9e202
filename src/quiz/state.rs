//! Run state machine: which stage a quiz run is in and what it has accumulated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::accumulator::TrailEntry;
use super::model::QuizConfig;
use super::result::Outcome;
use super::selection::MultiSelectSet;

/// Flag path → value, set by committed answers.
pub type Flags = BTreeMap<String, Value>;

/// Outcome id → accumulated score. Key set is fixed to the configured options.
pub type Scores = BTreeMap<String, f64>;

/// Submitted contact fields.
pub type ContactRecord = BTreeMap<String, String>;

/// The stages of a quiz run.
///
/// Question → Question* → (Contact) → Result. Result is terminal; only a
/// restart leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Question,
    Contact,
    Result,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Question, Question) | (Question, Contact) | (Question, Result) | (Contact, Result)
        )
    }

    /// Whether this stage ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Contact => "contact",
            Self::Result => "result",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state of one run, owned by exactly one engine.
#[derive(Debug, Clone)]
pub struct RuntimeState {
    pub stage: Stage,
    /// Index of the addressed question; `questions.len()` once questions are done.
    pub step_index: usize,
    pub flags: Flags,
    pub scores: Scores,
    pub answered_count: usize,
    /// Selection set per multi question id.
    pub selections: BTreeMap<String, MultiSelectSet>,
    pub trail: Vec<TrailEntry>,
    pub contact: Option<ContactRecord>,
    pub started: bool,
    /// Set when the run reaches Result.
    pub outcome: Option<Outcome>,
    /// Inline validation message for the current question.
    pub notice: Option<String>,
}

impl RuntimeState {
    /// Fresh state: empty flags, a zero score for every configured option.
    pub fn new(config: &QuizConfig) -> Self {
        Self {
            stage: Stage::Question,
            step_index: 0,
            flags: Flags::new(),
            scores: config.options.iter().map(|o| (o.id.clone(), 0.0)).collect(),
            answered_count: 0,
            selections: BTreeMap::new(),
            trail: Vec::new(),
            contact: None,
            started: false,
            outcome: None,
            notice: None,
        }
    }

    /// Reset everything back to the initial values. Score keys are kept.
    pub fn reset(&mut self) {
        self.stage = Stage::Question;
        self.step_index = 0;
        self.flags.clear();
        self.scores.values_mut().for_each(|score| *score = 0.0);
        self.answered_count = 0;
        self.selections.clear();
        self.trail.clear();
        self.contact = None;
        self.started = false;
        self.outcome = None;
        self.notice = None;
    }

    /// Move to `target`, logging transitions the stage graph does not allow.
    pub fn enter(&mut self, target: Stage) {
        if !self.stage.can_transition_to(target) {
            tracing::warn!(from = %self.stage, to = %target, "Unexpected stage transition");
        }
        self.stage = target;
    }
}
