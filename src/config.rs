//! Host configuration.

use crate::mount::{DEFAULT_ROOT, MountDescriptor};

/// Settings for a quiz host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// URL of the quiz config document. Required to mount.
    pub config_url: Option<String>,
    /// Mount point selector.
    pub root: String,
    /// Page URL reported in webhook payloads.
    pub page: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            config_url: None,
            root: DEFAULT_ROOT.to_string(),
            page: None,
        }
    }
}

impl HostConfig {
    /// Build config from environment variables.
    ///
    /// - `QUIZ_CONFIG_URL`: config document URL
    /// - `QUIZ_ROOT`: mount selector (default `#wh-quiz`)
    /// - `QUIZ_PAGE`: embedding page URL
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            config_url: non_empty("QUIZ_CONFIG_URL"),
            root: non_empty("QUIZ_ROOT").unwrap_or_else(|| DEFAULT_ROOT.to_string()),
            page: non_empty("QUIZ_PAGE"),
        }
    }

    /// Mount descriptor for this host.
    pub fn descriptor(&self) -> MountDescriptor {
        let mut descriptor = MountDescriptor::new(&self.root);
        descriptor.config_url = self.config_url.clone();
        descriptor.page = self.page.clone();
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = HostConfig::from_lookup(lookup(&[]));
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.root, "#wh-quiz");
    }

    #[test]
    fn reads_and_trims_values() {
        let config = HostConfig::from_lookup(lookup(&[
            ("QUIZ_CONFIG_URL", " https://cdn.example/fit.json "),
            ("QUIZ_ROOT", "#embed"),
            ("QUIZ_PAGE", ""),
        ]));
        assert_eq!(config.config_url.as_deref(), Some("https://cdn.example/fit.json"));
        assert_eq!(config.root, "#embed");
        assert!(config.page.is_none());
    }

    #[test]
    fn descriptor_carries_settings() {
        let config = HostConfig {
            config_url: Some("https://cdn.example/fit.json".into()),
            root: "#embed".into(),
            page: Some("https://shop.example".into()),
        };
        let descriptor = config.descriptor();
        assert_eq!(descriptor.root, "#embed");
        assert_eq!(descriptor.config_url, config.config_url);
        assert_eq!(descriptor.page, config.page);
        assert!(!descriptor.is_booted());
    }
}
