//! Error types for Quiz Flow.

/// Top-level error type for the quiz engine and its hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config load error: {0}")]
    ConfigLoad(#[from] ConfigLoadError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

/// Failures while retrieving the quiz configuration. Fatal to the mount point.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Quiz config URL missing for mount {root}")]
    MissingUrl { root: String },

    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Config endpoint {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Config document is not valid quiz JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigLoadError {
    /// Text that replaces the mount point's content.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::MissingUrl { .. } => "Quiz config URL missing.",
            _ => "Failed to load quiz.",
        }
    }

    /// Reason carried by the `quiz_error` signal.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingUrl { .. } => "missing_config",
            _ => "config_load_failed",
        }
    }
}

/// Non-fatal input validation failures. The run stays where it was.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Select at least {required} option(s) for {question_id} ({selected} selected)")]
    BelowMinimum {
        question_id: String,
        required: usize,
        selected: usize,
    },
}

impl ValidationError {
    /// Inline message shown next to the question.
    pub fn message(&self) -> String {
        match self {
            Self::BelowMinimum { required: 1, .. } => "Please select at least 1 option.".to_string(),
            Self::BelowMinimum { required, .. } => {
                format!("Please select at least {required} options.")
            }
        }
    }
}

/// Host-side misuse of the engine: an event that does not fit the current stage.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("Expected stage {expected}, run is at {actual}")]
    WrongStage {
        expected: &'static str,
        actual: String,
    },

    #[error("Question {question_id} is {actual}, operation needs {expected}")]
    WrongKind {
        question_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Answer {answer_id} not found on question {question_id}")]
    UnknownAnswer {
        question_id: String,
        answer_id: String,
    },

    #[error("Answer {answer_id} on question {question_id} is hidden")]
    HiddenAnswer {
        question_id: String,
        answer_id: String,
    },
}

/// Webhook delivery failures. Logged and swallowed by the session.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("POST to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Result type alias for Quiz Flow.
pub type Result<T> = std::result::Result<T, Error>;
