//! Session configuration.
//!
//! Built once from environment variables and passed to
//! [`LearningSession::new`](crate::LearningSession::new).

use std::path::PathBuf;

use scholia_models::TargetLanguage;

const APP_DIR: &str = "scholia";

/// Runtime configuration of a reading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend base URL.
    pub api_url: String,
    /// Login surface unauthenticated viewers are sent to.
    pub login_path: String,
    /// Background quiz surface.
    pub quiz_path: String,
    /// Language the translate action targets.
    pub target_language: TargetLanguage,
    /// Directory holding persisted credentials; `None` when the platform
    /// has no configuration directory.
    pub storage_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl SessionConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                  | Default                  | Description                  |
    /// |---------------------------|--------------------------|------------------------------|
    /// | `SCHOLIA_API_URL`         | `http://127.0.0.1:8000`  | Backend base URL             |
    /// | `SCHOLIA_LOGIN_PATH`      | `/login`                 | Redirect target when signed out |
    /// | `SCHOLIA_QUIZ_PATH`       | `/quiz`                  | Background quiz surface      |
    /// | `SCHOLIA_TARGET_LANGUAGE` | `ur`                     | Translation target           |
    /// | `SCHOLIA_STORAGE_DIR`     | `<config dir>/scholia`   | Persisted credentials        |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: non_empty("SCHOLIA_API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            login_path: non_empty("SCHOLIA_LOGIN_PATH").unwrap_or_else(|| "/login".to_string()),
            quiz_path: non_empty("SCHOLIA_QUIZ_PATH").unwrap_or_else(|| "/quiz".to_string()),
            target_language: non_empty("SCHOLIA_TARGET_LANGUAGE")
                .map(|code| TargetLanguage::new(code.trim()))
                .unwrap_or_default(),
            storage_dir: non_empty("SCHOLIA_STORAGE_DIR")
                .map(PathBuf::from)
                .or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SessionConfig::from_lookup(|_| None);
        assert_eq!(cfg.api_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.login_path, "/login");
        assert_eq!(cfg.quiz_path, "/quiz");
        assert_eq!(cfg.target_language.as_str(), "ur");
    }

    #[test]
    fn overrides_and_blank_values() {
        let cfg = SessionConfig::from_lookup(|key| match key {
            "SCHOLIA_API_URL" => Some("https://learn.example.com".into()),
            "SCHOLIA_TARGET_LANGUAGE" => Some("fr".into()),
            "SCHOLIA_LOGIN_PATH" => Some("  ".into()),
            "SCHOLIA_STORAGE_DIR" => Some("/tmp/scholia-test".into()),
            _ => None,
        });
        assert_eq!(cfg.api_url, "https://learn.example.com");
        assert_eq!(cfg.target_language.as_str(), "fr");
        assert_eq!(cfg.login_path, "/login");
        assert_eq!(cfg.storage_dir, Some(PathBuf::from("/tmp/scholia-test")));
    }
}
