//! Navigation router: drives one run from its first visible question,
//! through optional contact capture, to a result.
//!
//! Every public operation handles exactly one host event and runs to
//! completion. Webhook payloads produced along the way are queued in an
//! outbox that the host drains with [`QuizEngine::take_outbox`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{NavigationError, Result, ValidationError};
use crate::signals::{Signal, SignalSink};
use crate::webhook::{Delivery, WebhookPayload};

use super::accumulator::apply_answer;
use super::condition::passes_show_if;
use super::model::{Answer, BranchTarget, Question, QuestionKind, QuizConfig};
use super::progress::progress_percent;
use super::result::resolve_outcome;
use super::selection::{required_minimum, MultiSelectSet, ToggleOutcome};
use super::snapshot::{AnswerView, QuestionView, QuizSnapshot};
use super::state::{ContactRecord, RuntimeState, Stage};

/// Contact form as submitted by the host.
#[derive(Debug, Clone, Default)]
pub struct ContactSubmission {
    pub fields: ContactRecord,
    /// Hidden decoy field. Any non-blank value marks the submission as a bot.
    pub honeypot: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Accepted,
    /// Honeypot tripped; nothing was recorded.
    Discarded,
}

/// One quiz run. Owns its state exclusively.
pub struct QuizEngine {
    config: Arc<QuizConfig>,
    state: RuntimeState,
    signals: Arc<dyn SignalSink>,
    page: Option<String>,
    outbox: Vec<Delivery>,
}

impl QuizEngine {
    /// Build an engine and enter the initial stage: the first visible
    /// question, or contact/result when none qualifies.
    pub fn new(
        config: Arc<QuizConfig>,
        signals: Arc<dyn SignalSink>,
        page: Option<String>,
    ) -> Self {
        let state = RuntimeState::new(&config);
        let mut engine = Self {
            config,
            state,
            signals,
            page,
            outbox: Vec::new(),
        };
        engine.enter_initial();
        engine
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn percent(&self) -> u8 {
        progress_percent(
            &self.config.questions,
            &self.state.flags,
            self.state.answered_count,
        )
    }

    /// Commit an answer on the current single-choice question.
    pub fn answer(&mut self, answer_id: &str) -> Result<Stage> {
        let config = Arc::clone(&self.config);
        let question = self.current_question(&config, QuestionKind::Single)?;
        let answer = self.visible_answer(question, answer_id)?;

        self.mark_started();
        self.emit_step(question, question.answer_label(answer));

        apply_answer(&mut self.state, question, answer);
        self.state.answered_count += 1;
        self.state.notice = None;

        self.follow_branch(answer.branch());
        Ok(self.state.stage)
    }

    /// Select or deselect an answer on the current multi-choice question.
    pub fn toggle(&mut self, answer_id: &str) -> Result<ToggleOutcome> {
        let config = Arc::clone(&self.config);
        let question = self.current_question(&config, QuestionKind::Multi)?;
        let answer = self.visible_answer(question, answer_id)?;
        self.drop_hidden_selections(question);

        let outcome = self
            .state
            .selections
            .entry(question.id.clone())
            .or_insert_with(|| MultiSelectSet::new(question.max))
            .toggle(&answer.id);
        self.state.notice = None;

        if let ToggleOutcome::Selected {
            evicted: Some(ref evicted),
        } = outcome
        {
            debug!(question = %question.id, evicted = %evicted, "Selection full, evicted oldest");
        }

        self.emit(Signal::Toggle {
            quiz_id: self.config.id.clone(),
            step_id: question.id.clone(),
            answer_id: answer.id.clone(),
            selected: matches!(outcome, ToggleOutcome::Selected { .. }),
        });
        Ok(outcome)
    }

    /// Commit the current multi-choice question.
    ///
    /// Below the minimum this fails with a validation error and only sets
    /// the inline notice.
    pub fn confirm(&mut self) -> Result<Stage> {
        let config = Arc::clone(&self.config);
        let question = self.current_question(&config, QuestionKind::Multi)?;
        self.drop_hidden_selections(question);

        let chosen: Vec<&Answer> = match self.state.selections.get(&question.id) {
            Some(selection) => question
                .answers
                .iter()
                .filter(|a| selection.contains(&a.id) && passes_show_if(&self.state.flags, *a))
                .collect(),
            None => Vec::new(),
        };

        let required = required_minimum(question.min);
        if chosen.len() < required {
            let err = ValidationError::BelowMinimum {
                question_id: question.id.clone(),
                required,
                selected: chosen.len(),
            };
            debug!(question = %question.id, required, selected = chosen.len(), "Multi confirm below minimum");
            self.state.notice = Some(err.message());
            return Err(err.into());
        }

        self.mark_started();
        let labels = chosen
            .iter()
            .map(|a| question.answer_label(a))
            .collect::<Vec<_>>()
            .join(", ");
        self.emit_step(question, labels);

        for answer in &chosen {
            apply_answer(&mut self.state, question, answer);
        }
        self.state.answered_count += 1;
        self.state.notice = None;

        let branch = chosen.iter().find_map(|a| a.branch());
        self.follow_branch(branch);
        Ok(self.state.stage)
    }

    /// Commit the contact stage and move to the result.
    pub fn submit_contact(&mut self, submission: ContactSubmission) -> Result<ContactOutcome> {
        if self.state.stage != Stage::Contact {
            return Err(NavigationError::WrongStage {
                expected: "contact",
                actual: self.state.stage.to_string(),
            }
            .into());
        }

        if submission
            .honeypot
            .as_deref()
            .is_some_and(|decoy| !decoy.trim().is_empty())
        {
            debug!(quiz_id = %self.config.id, "Contact submission discarded by honeypot");
            return Ok(ContactOutcome::Discarded);
        }

        let contact = self.keep_configured_fields(submission.fields);
        self.state.contact = Some(contact.clone());
        info!(quiz_id = %self.config.id, fields = contact.len(), "Lead captured");

        self.emit(Signal::Lead {
            quiz_id: self.config.id.clone(),
        });
        self.queue(WebhookPayload::Lead {
            quiz_id: self.config.id.clone(),
            contact,
            trail: self.state.trail.clone(),
            flags: self.state.flags.clone(),
            page: self.page.clone(),
            ts: Utc::now(),
        });

        self.enter_result(None);
        Ok(ContactOutcome::Accepted)
    }

    /// Reset the run to its initial values and re-enter the initial stage.
    pub fn restart(&mut self) {
        self.emit(Signal::Restart {
            quiz_id: self.config.id.clone(),
        });
        self.state.reset();
        self.enter_initial();
    }

    /// Deliveries queued since the last call.
    pub fn take_outbox(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        let question = match self.state.stage {
            Stage::Question => self
                .config
                .questions
                .get(self.state.step_index)
                .map(|q| self.question_view(q)),
            _ => None,
        };

        QuizSnapshot {
            quiz_id: self.config.id.clone(),
            title: self.config.title.clone(),
            subtitle: self.config.subtitle.clone().filter(|s| !s.is_empty()),
            stage: self.state.stage,
            percent: self.percent(),
            question,
            outcome: self.state.outcome.clone(),
            contact_fields: self.config.contact_fields.clone(),
            notice: self.state.notice.clone(),
            answered_count: self.state.answered_count,
            flags: self.state.flags.clone(),
            scores: self.state.scores.clone(),
            trail: self.state.trail.clone(),
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────

    fn enter_initial(&mut self) {
        self.advance_from(0);
    }

    fn follow_branch(&mut self, target: Option<BranchTarget>) {
        match target {
            Some(BranchTarget::Outcome(forced)) => self.enter_result(forced.as_deref()),
            Some(BranchTarget::Question(id)) => match self.config.question_index(&id) {
                Some(index) => {
                    debug!(quiz_id = %self.config.id, target = %id, index, "Branching to question");
                    self.state.step_index = index;
                    self.state.enter(Stage::Question);
                    self.skip_hidden();
                }
                None => {
                    warn!(
                        quiz_id = %self.config.id,
                        target = %id,
                        "Branch target not found, advancing to next visible question"
                    );
                    self.default_advance();
                }
            },
            None => self.default_advance(),
        }
    }

    fn default_advance(&mut self) {
        self.advance_from(self.state.step_index + 1);
    }

    /// Move to the first visible question at or after `start`, or finish.
    fn advance_from(&mut self, start: usize) {
        let next = self
            .config
            .questions
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, q)| passes_show_if(&self.state.flags, *q))
            .map(|(index, _)| index);

        match next {
            Some(index) => {
                self.state.step_index = index;
                self.state.enter(Stage::Question);
            }
            None => self.finish_questions(),
        }
    }

    /// The addressed question may have been hidden by flags set after it was
    /// first reached; skip forward until something visible is addressed.
    fn skip_hidden(&mut self) {
        if self.state.stage != Stage::Question {
            return;
        }
        let hidden = self
            .config
            .questions
            .get(self.state.step_index)
            .is_none_or(|q| !passes_show_if(&self.state.flags, q));
        if hidden {
            self.default_advance();
        }
    }

    fn finish_questions(&mut self) {
        self.state.step_index = self.config.questions.len();
        if self.config.collect_contact && self.state.contact.is_none() {
            info!(quiz_id = %self.config.id, "Questions done, collecting contact");
            self.state.enter(Stage::Contact);
        } else {
            self.enter_result(None);
        }
    }

    fn enter_result(&mut self, forced: Option<&str>) {
        let outcome = resolve_outcome(&self.config, forced, &self.state.scores);
        self.state.step_index = self.config.questions.len();
        self.state.enter(Stage::Result);

        info!(
            quiz_id = %self.config.id,
            result_id = %outcome.id,
            forced = outcome.forced,
            answered = self.state.answered_count,
            "Quiz completed"
        );

        self.emit(Signal::Complete {
            quiz_id: self.config.id.clone(),
            result_id: outcome.id.clone(),
            percent_complete: 100,
        });
        self.queue(WebhookPayload::Completion {
            quiz_id: self.config.id.clone(),
            result_id: outcome.id.clone(),
            result_label: outcome.label.clone(),
            scores: self.state.scores.clone(),
            flags: self.state.flags.clone(),
            trail: self.state.trail.clone(),
            contact: self.state.contact.clone(),
            page: self.page.clone(),
            ts: Utc::now(),
        });
        self.state.outcome = Some(outcome);
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn current_question<'a>(
        &self,
        config: &'a QuizConfig,
        kind: QuestionKind,
    ) -> std::result::Result<&'a Question, NavigationError> {
        let question = match self.state.stage {
            Stage::Question => config.questions.get(self.state.step_index),
            _ => None,
        }
        .ok_or_else(|| NavigationError::WrongStage {
            expected: "question",
            actual: self.state.stage.to_string(),
        })?;

        if question.kind != kind {
            return Err(NavigationError::WrongKind {
                question_id: question.id.clone(),
                expected: kind.as_str(),
                actual: question.kind.as_str(),
            });
        }
        Ok(question)
    }

    fn visible_answer<'a>(
        &self,
        question: &'a Question,
        answer_id: &str,
    ) -> std::result::Result<&'a Answer, NavigationError> {
        let answer = question
            .answer(answer_id)
            .ok_or_else(|| NavigationError::UnknownAnswer {
                question_id: question.id.clone(),
                answer_id: answer_id.to_string(),
            })?;
        if !passes_show_if(&self.state.flags, answer) {
            return Err(NavigationError::HiddenAnswer {
                question_id: question.id.clone(),
                answer_id: answer_id.to_string(),
            });
        }
        Ok(answer)
    }

    /// Selections made on an earlier visit whose answers are now hidden can
    /// no longer be seen or removed, so they stop counting.
    fn drop_hidden_selections(&mut self, question: &Question) {
        let flags = &self.state.flags;
        if let Some(selection) = self.state.selections.get_mut(&question.id) {
            selection.retain(|id| {
                question
                    .answer(id)
                    .is_some_and(|answer| passes_show_if(flags, answer))
            });
        }
    }

    fn question_view(&self, question: &Question) -> QuestionView {
        let selection = self.state.selections.get(&question.id);
        let answers = question
            .answers
            .iter()
            .enumerate()
            .filter(|(_, a)| passes_show_if(&self.state.flags, *a))
            .map(|(position, a)| AnswerView {
                id: a.id.clone(),
                label: a.display_label(position),
                tooltip: a.tooltip.clone(),
                photo_url: a.photo_url.clone(),
                selected: selection.is_some_and(|s| s.contains(&a.id)),
            })
            .collect();

        QuestionView {
            id: question.id.clone(),
            index: self.state.step_index,
            text: question.prompt().to_string(),
            tooltip: question.tooltip.clone(),
            photo_url: question.photo_url.clone(),
            kind: question.kind,
            min: required_minimum(question.min),
            max: question.max,
            answers,
        }
    }

    fn keep_configured_fields(&self, fields: ContactRecord) -> ContactRecord {
        if self.config.contact_fields.is_empty() {
            return fields;
        }
        fields
            .into_iter()
            .filter(|(name, _)| self.config.contact_fields.contains(name))
            .collect()
    }

    fn mark_started(&mut self) {
        if !self.state.started {
            self.state.started = true;
            self.emit(Signal::Start {
                quiz_id: self.config.id.clone(),
            });
        }
    }

    fn emit_step(&self, question: &Question, answer_label: String) {
        self.emit(Signal::Step {
            quiz_id: self.config.id.clone(),
            step_id: question.id.clone(),
            step_index: self.state.step_index,
            answer_label,
            percent_complete: self.percent(),
        });
    }

    fn emit(&self, signal: Signal) {
        self.signals.emit(&signal);
    }

    fn queue(&mut self, payload: WebhookPayload) {
        match self.config.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => self.outbox.push(Delivery {
                url: url.to_string(),
                payload,
            }),
            None => debug!(kind = payload.kind(), "No webhook configured, payload dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::signals::NoopSink;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Signal>>);

    impl SignalSink for Recorder {
        fn emit(&self, signal: &Signal) {
            self.0.lock().unwrap().push(signal.clone());
        }
    }

    impl Recorder {
        fn names(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().iter().map(Signal::name).collect()
        }
    }

    fn config(raw: serde_json::Value) -> Arc<QuizConfig> {
        let mut config: QuizConfig = serde_json::from_value(raw).unwrap();
        config.assign_answer_ids();
        Arc::new(config)
    }

    fn engine(raw: serde_json::Value) -> QuizEngine {
        QuizEngine::new(config(raw), Arc::new(NoopSink), None)
    }

    fn current_id(engine: &QuizEngine) -> String {
        engine.snapshot().question.map(|q| q.id).unwrap_or_default()
    }

    fn two_question_quiz() -> serde_json::Value {
        json!({
            "id": "xy",
            "options": [{"id": "x", "label": "X"}, {"id": "y", "label": "Y"}],
            "questions": [
                {"id": "q1", "answers": [
                    {"id": "x1", "add": {"x": 2}},
                    {"id": "y1", "add": {"y": 2}}
                ]},
                {"id": "q2", "answers": [
                    {"id": "x2", "add": {"x": 1}},
                    {"id": "y2", "add": {"y": 1}}
                ]}
            ],
            "webhook_url": "https://hooks.example/quiz"
        })
    }

    #[test]
    fn picking_favoring_answers_selects_that_outcome() {
        let mut e = engine(two_question_quiz());
        assert_eq!(current_id(&e), "q1");
        assert_eq!(e.answer("x1").unwrap(), Stage::Question);
        assert_eq!(current_id(&e), "q2");
        assert_eq!(e.answer("x2").unwrap(), Stage::Result);

        let snap = e.snapshot();
        assert_eq!(snap.outcome.unwrap().id, "x");
        assert_eq!(snap.scores["x"], 3.0);
        assert_eq!(snap.answered_count, 2);
        assert_eq!(snap.trail.len(), 2);
    }

    #[test]
    fn forced_outcome_ignores_scores() {
        let mut e = engine(json!({
            "options": [{"id": "x"}, {"id": "y"}],
            "questions": [
                {"id": "q1", "answers": [{"id": "big", "add": {"x": 50}}]},
                {"id": "q2", "answers": [{"id": "force", "next": "result:y"}]},
                {"id": "q3", "answers": [{"id": "never"}]}
            ],
            "collect_contact": true
        }));
        e.answer("big").unwrap();
        assert_eq!(e.answer("force").unwrap(), Stage::Result);
        let outcome = e.snapshot().outcome.unwrap();
        assert_eq!(outcome.id, "y");
        assert!(outcome.forced);
    }

    #[test]
    fn backward_branch_revisits_question() {
        let mut e = engine(json!({
            "options": [{"id": "x"}],
            "questions": [
                {"id": "q1", "answers": [{"id": "go"}]},
                {"id": "q2", "answers": [{"id": "back", "next": "q1"}, {"id": "on"}]}
            ]
        }));
        e.answer("go").unwrap();
        e.answer("back").unwrap();
        assert_eq!(current_id(&e), "q1");
        e.answer("go").unwrap();
        assert_eq!(current_id(&e), "q2");
        assert_eq!(e.answer("on").unwrap(), Stage::Result);
        assert_eq!(e.snapshot().answered_count, 4);
    }

    #[test]
    fn unresolved_branch_target_falls_back_to_default_advance() {
        let mut e = engine(json!({
            "questions": [
                {"id": "q1", "answers": [{"id": "lost", "next": "nowhere"}]},
                {"id": "q2", "answers": [{"id": "a"}]}
            ]
        }));
        e.answer("lost").unwrap();
        assert_eq!(current_id(&e), "q2");
    }

    #[test]
    fn initial_stage_skips_hidden_questions() {
        let e = engine(json!({
            "questions": [
                {"id": "q1", "showif": [{"path": "seen", "exists": true}], "answers": [{"id": "a"}]},
                {"id": "q2", "answers": [{"id": "b"}]}
            ]
        }));
        assert_eq!(current_id(&e), "q2");
    }

    #[test]
    fn branch_into_hidden_question_auto_skips() {
        let mut e = engine(json!({
            "questions": [
                {"id": "q1", "answers": [{"id": "hide", "set": {"hide": true}, "next": "q2"}]},
                {"id": "q2", "showif": [{"path": "hide", "exists": false}], "answers": [{"id": "b"}]},
                {"id": "q3", "answers": [{"id": "back", "next": "q2"}, {"id": "c"}]}
            ]
        }));
        e.answer("hide").unwrap();
        assert_eq!(current_id(&e), "q3");
        // Jumping back to the now-hidden question lands on the next visible one.
        e.answer("back").unwrap();
        assert_eq!(current_id(&e), "q3");
    }

    #[test]
    fn flags_gate_later_questions_and_answers() {
        let mut e = engine(json!({
            "questions": [
                {"id": "q1", "answers": [
                    {"id": "pro", "set": {"plan": "pro"}},
                    {"id": "free", "set": {"plan": "free"}}
                ]},
                {"id": "q2", "showif": [{"path": "plan", "eq": "pro"}], "answers": [{"id": "seats"}]},
                {"id": "q3", "answers": [
                    {"id": "upsell", "showif": [{"path": "plan", "neq": "pro"}]},
                    {"id": "done"}
                ]}
            ]
        }));
        e.answer("free").unwrap();
        assert_eq!(current_id(&e), "q3");
        let answers: Vec<String> = e
            .snapshot()
            .question
            .unwrap()
            .answers
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(answers, ["upsell", "done"]);

        e.restart();
        e.answer("pro").unwrap();
        assert_eq!(current_id(&e), "q2");
        e.answer("seats").unwrap();
        let err = e.answer("upsell").unwrap_err();
        assert!(matches!(err, Error::Navigation(NavigationError::HiddenAnswer { .. })));
    }

    fn multi_quiz() -> serde_json::Value {
        json!({
            "options": [{"id": "x"}, {"id": "y"}, {"id": "z"}],
            "questions": [
                {"id": "m", "type": "multi", "min": 2, "max": 2, "answers": [
                    {"id": "m1", "set": {"last": "m1"}, "add": {"x": 1}},
                    {"id": "m2", "set": {"last": "m2"}, "next": "result:y"},
                    {"id": "m3", "set": {"last": "m3"}, "next": "result:z"}
                ]},
                {"id": "after", "answers": [{"id": "a"}]}
            ]
        })
    }

    #[test]
    fn confirm_below_minimum_only_sets_notice() {
        let mut e = engine(multi_quiz());
        e.toggle("m1").unwrap();
        let before = e.snapshot();

        let err = e.confirm().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let after = e.snapshot();
        assert_eq!(after.stage, Stage::Question);
        assert_eq!(after.answered_count, 0);
        assert!(after.trail.is_empty());
        assert_eq!(after.flags, before.flags);
        assert_eq!(after.notice.as_deref(), Some("Please select at least 2 options."));

        // The next interaction clears the notice.
        e.toggle("m2").unwrap();
        assert!(e.snapshot().notice.is_none());
    }

    #[test]
    fn confirm_applies_in_display_order_and_counts_once() {
        let mut e = engine(json!({
            "options": [{"id": "x"}],
            "questions": [
                {"id": "m", "type": "multi", "answers": [
                    {"id": "m1", "set": {"last": "m1"}, "add": {"x": 1}},
                    {"id": "m2", "set": {"last": "m2"}, "add": {"x": 2}}
                ]},
                {"id": "after", "answers": [{"id": "a"}]}
            ]
        }));
        e.toggle("m2").unwrap();
        e.toggle("m1").unwrap();
        assert_eq!(e.confirm().unwrap(), Stage::Question);

        let snap = e.snapshot();
        let order: Vec<&str> = snap.trail.iter().map(|t| t.answer_id.as_str()).collect();
        assert_eq!(order, ["m1", "m2"]);
        assert_eq!(snap.flags["last"], json!("m2"));
        assert_eq!(snap.scores["x"], 3.0);
        assert_eq!(snap.answered_count, 1);
        assert_eq!(snap.question.unwrap().id, "after");
    }

    #[test]
    fn confirm_follows_first_branch_in_display_order() {
        let mut e = engine(multi_quiz());
        e.toggle("m3").unwrap();
        e.toggle("m2").unwrap();
        assert_eq!(e.confirm().unwrap(), Stage::Result);
        assert_eq!(e.snapshot().outcome.unwrap().id, "y");
    }

    #[test]
    fn revisited_multi_question_ignores_selections_now_hidden() {
        let mut e = engine(json!({
            "options": [{"id": "y"}],
            "questions": [
                {"id": "m", "type": "multi", "answers": [
                    {"id": "m1", "showif": [{"path": "seen", "exists": false}], "add": {"y": 10}},
                    {"id": "m2", "set": {"seen": true}}
                ]},
                {"id": "loop", "answers": [
                    {"id": "back", "next": "m"},
                    {"id": "on"}
                ]}
            ]
        }));
        e.toggle("m1").unwrap();
        e.toggle("m2").unwrap();
        e.confirm().unwrap();
        e.answer("back").unwrap();
        assert_eq!(current_id(&e), "m");

        let view = e.snapshot().question.unwrap();
        let marks: Vec<(&str, bool)> = view
            .answers
            .iter()
            .map(|a| (a.id.as_str(), a.selected))
            .collect();
        assert_eq!(marks, [("m2", true)]);
        assert!(matches!(
            e.toggle("m1").unwrap_err(),
            Error::Navigation(NavigationError::HiddenAnswer { .. })
        ));

        // With m2 deselected nothing visible is chosen.
        assert_eq!(e.toggle("m2").unwrap(), ToggleOutcome::Deselected);
        assert!(matches!(e.confirm().unwrap_err(), Error::Validation(_)));

        e.toggle("m2").unwrap();
        assert_eq!(e.confirm().unwrap(), Stage::Question);
        let snap = e.snapshot();
        let trail: Vec<&str> = snap.trail.iter().map(|t| t.answer_id.as_str()).collect();
        assert_eq!(trail, ["m1", "m2", "back", "m2"]);
        assert_eq!(snap.scores["y"], 10.0);
    }

    #[test]
    fn toggle_evicts_oldest_at_max() {
        let mut e = engine(multi_quiz());
        e.toggle("m1").unwrap();
        e.toggle("m2").unwrap();
        assert_eq!(
            e.toggle("m3").unwrap(),
            ToggleOutcome::Selected { evicted: Some("m1".into()) }
        );
        let selected: Vec<String> = e
            .snapshot()
            .question
            .unwrap()
            .answers
            .into_iter()
            .filter(|a| a.selected)
            .map(|a| a.id)
            .collect();
        assert_eq!(selected, ["m2", "m3"]);
    }

    #[test]
    fn zero_minimum_confirms_empty_selection() {
        let mut e = engine(json!({
            "questions": [
                {"id": "m", "type": "multi", "min": 0, "answers": [{"id": "m1"}]}
            ]
        }));
        assert_eq!(e.confirm().unwrap(), Stage::Result);
        assert_eq!(e.snapshot().answered_count, 1);
    }

    #[test]
    fn contact_stage_with_no_questions() {
        let mut e = engine(json!({
            "id": "leadgen",
            "options": [{"id": "x"}],
            "collect_contact": true,
            "contact_fields": ["email"],
            "webhook_url": "https://hooks.example/quiz"
        }));
        assert_eq!(e.stage(), Stage::Contact);
        assert!(e.take_outbox().is_empty());

        let outcome = e
            .submit_contact(ContactSubmission {
                fields: ContactRecord::from([
                    ("email".to_string(), "a@b.c".to_string()),
                    ("nickname".to_string(), "ignored".to_string()),
                ]),
                honeypot: None,
            })
            .unwrap();
        assert_eq!(outcome, ContactOutcome::Accepted);
        assert_eq!(e.stage(), Stage::Result);

        let kinds: Vec<&str> = e.take_outbox().iter().map(|d| d.payload.kind()).collect();
        assert_eq!(kinds, ["lead", "completion"]);

        match &e.snapshot().outcome {
            Some(outcome) => assert_eq!(outcome.id, "x"),
            None => panic!("expected an outcome"),
        }
    }

    #[test]
    fn contact_record_keeps_configured_fields_in_completion() {
        let mut e = engine(json!({
            "collect_contact": true,
            "contact_fields": ["email"],
            "webhook_url": "https://hooks.example/quiz"
        }));
        e.submit_contact(ContactSubmission {
            fields: ContactRecord::from([
                ("email".to_string(), "a@b.c".to_string()),
                ("extra".to_string(), "x".to_string()),
            ]),
            honeypot: Some("  ".into()),
        })
        .unwrap();
        let outbox = e.take_outbox();
        match &outbox[1].payload {
            WebhookPayload::Completion { contact, .. } => {
                let contact = contact.as_ref().unwrap();
                assert_eq!(contact.len(), 1);
                assert_eq!(contact["email"], "a@b.c");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn honeypot_discards_submission() {
        let mut e = engine(json!({
            "collect_contact": true,
            "webhook_url": "https://hooks.example/quiz"
        }));
        let outcome = e
            .submit_contact(ContactSubmission {
                fields: ContactRecord::from([("email".to_string(), "bot@spam".to_string())]),
                honeypot: Some("http://spam".into()),
            })
            .unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded);
        assert_eq!(e.stage(), Stage::Contact);
        assert!(e.take_outbox().is_empty());
    }

    #[test]
    fn questions_then_contact_then_result() {
        let mut raw = two_question_quiz();
        raw["collect_contact"] = json!(true);
        let mut e = engine(raw);
        e.answer("y1").unwrap();
        assert_eq!(e.answer("y2").unwrap(), Stage::Contact);
        assert!(e.snapshot().outcome.is_none());
        e.submit_contact(ContactSubmission::default()).unwrap();
        assert_eq!(e.snapshot().outcome.unwrap().id, "y");
    }

    #[test]
    fn empty_quiz_without_contact_completes_immediately() {
        let mut e = engine(json!({
            "options": [{"id": "only"}],
            "webhook_url": "https://hooks.example/quiz"
        }));
        assert_eq!(e.stage(), Stage::Result);
        assert_eq!(e.take_outbox().len(), 1);
    }

    #[test]
    fn no_webhook_url_queues_nothing() {
        let mut e = engine(json!({"options": [{"id": "only"}]}));
        assert_eq!(e.stage(), Stage::Result);
        assert!(e.take_outbox().is_empty());
    }

    #[test]
    fn completion_is_queued_once_per_result() {
        let mut e = engine(two_question_quiz());
        e.answer("x1").unwrap();
        e.answer("x2").unwrap();
        assert_eq!(e.take_outbox().len(), 1);

        e.restart();
        assert!(e.take_outbox().is_empty());
        e.answer("y1").unwrap();
        e.answer("y2").unwrap();
        let outbox = e.take_outbox();
        assert_eq!(outbox.len(), 1);
        match &outbox[0].payload {
            WebhookPayload::Completion { result_id, .. } => assert_eq!(result_id, "y"),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn replay_after_restart_is_deterministic() {
        let mut e = engine(json!({
            "options": [{"id": "x"}, {"id": "y"}],
            "questions": [
                {"id": "q1", "answers": [{"id": "a", "set": {"k": 1}, "add": {"x": 1}}]},
                {"id": "m", "type": "multi", "answers": [
                    {"id": "m1", "add": {"y": 2}},
                    {"id": "m2", "set": {"k": 2}}
                ]}
            ]
        }));
        let run = |e: &mut QuizEngine| {
            e.answer("a").unwrap();
            e.toggle("m2").unwrap();
            e.toggle("m1").unwrap();
            e.confirm().unwrap();
            e.snapshot()
        };
        let first = run(&mut e);
        e.restart();
        let fresh = e.snapshot();
        assert_eq!(fresh.answered_count, 0);
        assert!(fresh.flags.is_empty());
        assert!(fresh.trail.is_empty());
        assert!(fresh.scores.values().all(|s| *s == 0.0));

        let second = run(&mut e);
        assert_eq!(first.flags, second.flags);
        assert_eq!(first.scores, second.scores);
        assert_eq!(first.trail, second.trail);
        assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn host_misuse_is_rejected_without_mutation() {
        let mut e = engine(multi_quiz());
        assert!(matches!(
            e.answer("m1").unwrap_err(),
            Error::Navigation(NavigationError::WrongKind { .. })
        ));
        assert!(matches!(
            e.toggle("nope").unwrap_err(),
            Error::Navigation(NavigationError::UnknownAnswer { .. })
        ));
        assert!(matches!(
            e.submit_contact(ContactSubmission::default()).unwrap_err(),
            Error::Navigation(NavigationError::WrongStage { .. })
        ));
        assert_eq!(e.snapshot().answered_count, 0);

        let mut done = engine(json!({"options": [{"id": "x"}]}));
        assert!(matches!(
            done.answer("a1").unwrap_err(),
            Error::Navigation(NavigationError::WrongStage { .. })
        ));
    }

    #[test]
    fn signals_follow_the_run() {
        let recorder = Arc::new(Recorder::default());
        let mut e = QuizEngine::new(
            config(two_question_quiz()),
            recorder.clone(),
            Some("https://shop.example/quiz".into()),
        );
        e.answer("x1").unwrap();
        e.answer("y2").unwrap();
        e.restart();
        e.answer("x1").unwrap();

        assert_eq!(
            recorder.names(),
            [
                "quiz_start",
                "quiz_step",
                "quiz_step",
                "quiz_complete",
                "quiz_restart",
                "quiz_start",
                "quiz_step"
            ]
        );

        let signals = recorder.0.lock().unwrap();
        match &signals[2] {
            Signal::Step {
                step_id,
                step_index,
                percent_complete,
                ..
            } => {
                assert_eq!(step_id, "q2");
                assert_eq!(*step_index, 1);
                assert_eq!(*percent_complete, 50);
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut e = engine(two_question_quiz());
        assert_eq!(e.snapshot().percent, 0);
        e.answer("x1").unwrap();
        assert_eq!(e.snapshot().percent, 50);
        e.answer("x2").unwrap();
        assert_eq!(e.snapshot().percent, 100);
    }
}
