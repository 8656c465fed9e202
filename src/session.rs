//! Async facade over one engine: runs host events and dispatches webhooks.
//!
//! Completion deliveries are spawned and never awaited by navigation. The
//! lead delivery is the one exception: `submit_contact` waits for its single
//! attempt before returning, so the lead always goes out ahead of the
//! completion it precedes. Must run inside a Tokio runtime.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::quiz::{ContactOutcome, ContactSubmission, QuizEngine, QuizSnapshot, Stage, ToggleOutcome};
use crate::webhook::{Delivery, WebhookPayload, WebhookTransport, deliver_logged};

pub struct QuizSession {
    engine: QuizEngine,
    transport: Arc<dyn WebhookTransport>,
    in_flight: Vec<JoinHandle<()>>,
}

impl QuizSession {
    /// Wrap an engine. Anything it queued while entering its initial stage
    /// is dispatched right away.
    pub fn new(engine: QuizEngine, transport: Arc<dyn WebhookTransport>) -> Self {
        let mut session = Self {
            engine,
            transport,
            in_flight: Vec::new(),
        };
        session.dispatch();
        session
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        self.engine.snapshot()
    }

    pub fn stage(&self) -> Stage {
        self.engine.stage()
    }

    pub fn answer(&mut self, answer_id: &str) -> Result<Stage> {
        let stage = self.engine.answer(answer_id);
        self.dispatch();
        stage
    }

    pub fn toggle(&mut self, answer_id: &str) -> Result<ToggleOutcome> {
        self.engine.toggle(answer_id)
    }

    pub fn confirm(&mut self) -> Result<Stage> {
        let stage = self.engine.confirm();
        self.dispatch();
        stage
    }

    pub fn restart(&mut self) {
        self.engine.restart();
        self.dispatch();
    }

    /// Commit the contact form. Waits for the lead delivery attempt.
    pub async fn submit_contact(&mut self, submission: ContactSubmission) -> Result<ContactOutcome> {
        let outcome = self.engine.submit_contact(submission)?;
        for delivery in self.engine.take_outbox() {
            match delivery.payload {
                WebhookPayload::Lead { .. } => deliver_logged(&*self.transport, &delivery).await,
                WebhookPayload::Completion { .. } => self.spawn(delivery),
            }
        }
        Ok(outcome)
    }

    /// Wait for every spawned delivery to settle.
    pub async fn flush(&mut self) {
        let handles = std::mem::take(&mut self.in_flight);
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!("Webhook delivery task panicked: {}", e);
            }
        }
    }

    fn dispatch(&mut self) {
        for delivery in self.engine.take_outbox() {
            self.spawn(delivery);
        }
    }

    fn spawn(&mut self, delivery: Delivery) {
        self.in_flight.retain(|handle| !handle.is_finished());
        let transport = Arc::clone(&self.transport);
        self.in_flight.push(tokio::spawn(async move {
            deliver_logged(&*transport, &delivery).await;
        }));
    }
}

impl std::fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.engine.config().id)
            .field("stage", &self.engine.stage())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
