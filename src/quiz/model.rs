//! Quiz configuration document: questions, answers, candidate outcomes, and
//! the result/CTA overrides a host supplies as JSON.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::{Clause, Gated};

/// Prefix of a `next` directive that forces the result.
pub const FORCED_OUTCOME_PREFIX: &str = "result:";

/// Immutable quiz configuration, as fetched from the config URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizConfig {
    /// Quiz identifier, echoed in signals and webhook payloads.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Candidate outcomes, in tie-breaking order.
    #[serde(default)]
    pub options: Vec<QuizOption>,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Per-outcome overrides for the result screen.
    #[serde(default)]
    pub result_notes: BTreeMap<String, ResultNote>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta2_url: Option<String>,
    #[serde(default)]
    pub cta2_label: Option<String>,
    /// Whether to insert the contact stage before the result.
    #[serde(default)]
    pub collect_contact: bool,
    #[serde(default)]
    pub contact_fields: Vec<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl QuizConfig {
    /// Parse a config document and fill in generated answer ids.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(text)?;
        config.assign_answer_ids();
        Ok(config)
    }

    /// Give every answer without an id a stable positional one (`a1`, `a2`, ...).
    ///
    /// A positional id already used by another answer of the same question
    /// gets a numeric suffix (`a2_2`) so ids stay unique per question.
    pub fn assign_answer_ids(&mut self) {
        for question in &mut self.questions {
            let mut taken: HashSet<String> = question
                .answers
                .iter()
                .filter(|a| !a.id.is_empty())
                .map(|a| a.id.clone())
                .collect();
            for (position, answer) in question.answers.iter_mut().enumerate() {
                if !answer.id.is_empty() {
                    continue;
                }
                let base = format!("a{}", position + 1);
                let mut id = base.clone();
                let mut suffix = 2;
                while taken.contains(&id) {
                    id = format!("{base}_{suffix}");
                    suffix += 1;
                }
                taken.insert(id.clone());
                answer.id = id;
            }
        }
    }

    /// Index of the first question with this id.
    pub fn question_index(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn option(&self, id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn result_note(&self, id: &str) -> Option<&ResultNote> {
        self.result_notes.get(id)
    }
}

/// A candidate outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QuizOption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// CTA url override for this outcome.
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub cta_label: Option<String>,
}

impl QuizOption {
    /// Placeholder used when a forced outcome id is not configured.
    pub fn stub(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            ..Default::default()
        }
    }
}

/// Result screen overrides for one outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultNote {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta2_url: Option<String>,
    #[serde(default)]
    pub cta2_label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    Single,
    Multi,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: QuestionKind,
    /// Minimum selections for a multi question (defaults to 1).
    #[serde(default)]
    pub min: Option<usize>,
    /// Maximum selections for a multi question (unbounded when unset).
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub showif: Vec<Clause>,
}

impl Question {
    /// Prompt text: `question`, else `text`, else empty.
    pub fn prompt(&self) -> &str {
        [self.question.as_deref(), self.text.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or_default()
    }

    pub fn answer(&self, id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == id)
    }

    /// Label of an answer as displayed at its position in this question.
    pub fn answer_label(&self, answer: &Answer) -> String {
        let position = self
            .answers
            .iter()
            .position(|a| a.id == answer.id)
            .unwrap_or_default();
        answer.display_label(position)
    }
}

impl Gated for Question {
    fn showif(&self) -> &[Clause] {
        &self.showif
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Flag assignments applied when this answer is committed.
    #[serde(default)]
    pub set: BTreeMap<String, Value>,
    /// Score deltas per outcome id.
    #[serde(default)]
    pub add: BTreeMap<String, Value>,
    /// Branch directive: a question id or `result:<outcome id>`.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub showif: Vec<Clause>,
}

impl Answer {
    /// `label`, else `answer`, else `Option N` (1-based).
    pub fn display_label(&self, position: usize) -> String {
        [self.label.as_deref(), self.answer.as_deref()]
            .into_iter()
            .flatten()
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Option {}", position + 1))
    }

    pub fn branch(&self) -> Option<BranchTarget> {
        self.next.as_deref().and_then(BranchTarget::parse)
    }
}

impl Gated for Answer {
    fn showif(&self) -> &[Clause] {
        &self.showif
    }
}

/// Parsed `next` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchTarget {
    /// Jump to the result. `None` means the result is still chosen by score.
    Outcome(Option<String>),
    /// Jump to a question by id.
    Question(String),
}

impl BranchTarget {
    /// Parse a raw directive. Empty directives carry no branch.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix(FORCED_OUTCOME_PREFIX) {
            Some(rest) => {
                let id = rest.split(':').next().unwrap_or_default();
                Some(Self::Outcome((!id.is_empty()).then(|| id.to_string())))
            }
            None => Some(Self::Question(raw.to_string())),
        }
    }
}
