//! Owned, read-only views of a run for renderers.

use serde::Serialize;

use super::accumulator::TrailEntry;
use super::model::QuestionKind;
use super::result::Outcome;
use super::state::{Flags, Scores, Stage};

/// Everything a renderer needs after a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSnapshot {
    pub quiz_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub stage: Stage,
    pub percent: u8,
    /// Present while the stage is `question`.
    pub question: Option<QuestionView>,
    /// Present once the stage is `result`.
    pub outcome: Option<Outcome>,
    /// Fields to ask for during the `contact` stage.
    pub contact_fields: Vec<String>,
    pub notice: Option<String>,
    pub answered_count: usize,
    pub flags: Flags,
    pub scores: Scores,
    pub trail: Vec<TrailEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub index: usize,
    pub text: String,
    pub tooltip: Option<String>,
    pub photo_url: Option<String>,
    pub kind: QuestionKind,
    pub min: usize,
    pub max: Option<usize>,
    /// Visible answers in display order.
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerView {
    pub id: String,
    pub label: String,
    pub tooltip: Option<String>,
    pub photo_url: Option<String>,
    pub selected: bool,
}
