//! Quiz flow engine.
//!
//! A run walks a branching list of questions. Committed answers set flags
//! (which gate later questions and answers via `showif`) and add points to
//! candidate outcomes. When no visible question remains the run optionally
//! collects contact details, then settles on the highest-scoring outcome
//! unless an answer forced one with `next: "result:<id>"`.

pub mod accumulator;
pub mod condition;
pub mod engine;
pub mod model;
pub mod progress;
pub mod result;
pub mod selection;
pub mod snapshot;
pub mod state;

pub use accumulator::{TrailEntry, apply_answer};
pub use condition::{Clause, Gated, passes_show_if};
pub use engine::{ContactOutcome, ContactSubmission, QuizEngine};
pub use model::{Answer, BranchTarget, Question, QuestionKind, QuizConfig, QuizOption, ResultNote};
pub use progress::progress_percent;
pub use result::{Cta, Outcome, pick_result, resolve_outcome};
pub use selection::{MultiSelectSet, ToggleOutcome};
pub use snapshot::{AnswerView, QuestionView, QuizSnapshot};
pub use state::{ContactRecord, Flags, RuntimeState, Scores, Stage};
