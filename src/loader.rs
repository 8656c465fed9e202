//! Config retrieval: one uncached GET per mount.

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;

use crate::error::ConfigLoadError;
use crate::quiz::QuizConfig;

/// Where quiz configs come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<QuizConfig, ConfigLoadError>;
}

/// Fetches config documents over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpConfigSource {
    client: reqwest::Client,
}

impl HttpConfigSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self, url: &str) -> Result<QuizConfig, ConfigLoadError> {
        let network = |e: reqwest::Error| ConfigLoadError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigLoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        let config = QuizConfig::from_json(&body)?;
        tracing::info!(
            url = %url,
            quiz_id = %config.id,
            questions = config.questions.len(),
            options = config.options.len(),
            "Quiz config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let source = HttpConfigSource::default();
        let err = source.fetch("http://127.0.0.1:9/quiz.json").await.unwrap_err();
        assert!(matches!(err, ConfigLoadError::Network { .. }));
        assert_eq!(err.indicator(), "Failed to load quiz.");
    }
}
