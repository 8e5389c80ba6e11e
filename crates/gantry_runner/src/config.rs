//! Runner configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for shell command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock timeout per command, in seconds
    pub timeout_secs: u64,
    /// Shell used to interpret command lines
    pub shell: String,
    /// Additional environment variables
    pub env: HashMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            shell: "sh".to_string(),
            env: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_yaml_like_map() {
        let config: RunnerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.shell, "sh");
    }

    #[test]
    fn test_builder() {
        let config = RunnerConfig::new().timeout_secs(10).env("CI", "true");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.env.get("CI"), Some(&"true".to_string()));
    }
}
