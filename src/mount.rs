//! Embedding contract: one engine per declared mount descriptor.
//!
//! Booting is explicit and idempotent: a descriptor boots at most once, and
//! the guard lives on the descriptor itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ConfigLoadError;
use crate::loader::ConfigSource;
use crate::quiz::QuizEngine;
use crate::session::QuizSession;
use crate::signals::{Signal, SignalSink};
use crate::webhook::WebhookTransport;

/// Default mount point selector.
pub const DEFAULT_ROOT: &str = "#wh-quiz";

/// A place a quiz is embedded, and where its config lives.
#[derive(Debug)]
pub struct MountDescriptor {
    pub root: String,
    pub config_url: Option<String>,
    /// URL of the embedding page, echoed in webhook payloads.
    pub page: Option<String>,
    booted: AtomicBool,
}

impl MountDescriptor {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            config_url: None,
            page: None,
            booted: AtomicBool::new(false),
        }
    }

    pub fn with_config_url(mut self, url: impl Into<String>) -> Self {
        self.config_url = Some(url.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn is_booted(&self) -> bool {
        self.booted.load(Ordering::SeqCst)
    }

    /// Claim the boot slot. True only for the first caller.
    fn claim(&self) -> bool {
        !self.booted.swap(true, Ordering::SeqCst)
    }
}

impl Default for MountDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

/// Builds sessions for mount descriptors from shared collaborators.
pub struct Embedder {
    source: Arc<dyn ConfigSource>,
    transport: Arc<dyn WebhookTransport>,
    signals: Arc<dyn SignalSink>,
}

impl Embedder {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        transport: Arc<dyn WebhookTransport>,
        signals: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            source,
            transport,
            signals,
        }
    }

    /// Boot a descriptor.
    ///
    /// Returns `Ok(None)` if it was already booted. On failure no engine is
    /// built, a `quiz_error` signal is emitted, and the error's
    /// [`indicator`](ConfigLoadError::indicator) replaces the mount content.
    pub async fn boot(
        &self,
        descriptor: &MountDescriptor,
    ) -> Result<Option<QuizSession>, ConfigLoadError> {
        if !descriptor.claim() {
            tracing::debug!(root = %descriptor.root, "Mount already booted, skipping");
            return Ok(None);
        }

        match self.load(descriptor).await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::error!(root = %descriptor.root, "Quiz failed to mount: {}", e);
                self.signals.emit(&Signal::Error {
                    reason: e.reason().to_string(),
                });
                Err(e)
            }
        }
    }

    async fn load(&self, descriptor: &MountDescriptor) -> Result<QuizSession, ConfigLoadError> {
        let url = descriptor
            .config_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigLoadError::MissingUrl {
                root: descriptor.root.clone(),
            })?;

        let config = self.source.fetch(url).await?;
        let engine = QuizEngine::new(
            Arc::new(config),
            Arc::clone(&self.signals),
            descriptor.page.clone(),
        );
        tracing::info!(root = %descriptor.root, stage = %engine.stage(), "Quiz mounted");
        Ok(QuizSession::new(engine, Arc::clone(&self.transport)))
    }
}
