use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config::io::ConfigError;
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PERSONA, DEFAULT_REFERER, DEFAULT_TITLE,
};

/// Keys accepted by `abz set` / `abz unset`.
pub const SETTING_KEYS: &[&str] = &[
    "model",
    "base-url",
    "persona",
    "title",
    "referer",
    "history-window",
    "request-timeout",
    "use-keyring",
];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model identifier sent with every request
    pub model: Option<String>,
    /// API root; `chat/completions` is appended to it
    pub base_url: Option<String>,
    /// System instruction prepended to each request
    pub persona: Option<String>,
    /// Application name sent as `X-Title`
    pub title: Option<String>,
    /// Origin sent as `HTTP-Referer`
    pub referer: Option<String>,
    /// Resend only the most recent N messages; unset resends everything
    pub history_window: Option<usize>,
    /// Give up on a request after this many seconds; unset waits forever
    pub request_timeout_secs: Option<u64>,
    /// Store the credential in the system keyring (default) or a private file
    pub use_keyring: Option<bool>,
}

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn persona(&self) -> &str {
        self.persona.as_deref().unwrap_or(DEFAULT_PERSONA)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn referer(&self) -> &str {
        self.referer.as_deref().unwrap_or(DEFAULT_REFERER)
    }

    pub fn use_keyring(&self) -> bool {
        self.use_keyring.unwrap_or(true)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        if value.is_empty() {
            return Err(invalid());
        }

        match key {
            "model" => self.model = Some(value.to_string()),
            "base-url" => self.base_url = Some(value.to_string()),
            "persona" => self.persona = Some(value.to_string()),
            "title" => self.title = Some(value.to_string()),
            "referer" => self.referer = Some(value.to_string()),
            "history-window" => {
                let window = value.parse::<usize>().map_err(|_| invalid())?;
                if window == 0 {
                    return Err(invalid());
                }
                self.history_window = Some(window);
            }
            "request-timeout" => {
                self.request_timeout_secs = Some(value.parse().map_err(|_| invalid())?);
            }
            "use-keyring" => self.use_keyring = Some(parse_toggle(value).ok_or_else(invalid)?),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "model" => self.model = None,
            "base-url" => self.base_url = None,
            "persona" => self.persona = None,
            "title" => self.title = None,
            "referer" => self.referer = None,
            "history-window" => self.history_window = None,
            "request-timeout" => self.request_timeout_secs = None,
            "use-keyring" => self.use_keyring = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.title(), "Abz AI");
        assert!(config.use_keyring());
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn set_value_parses_typed_keys() {
        let mut config = Config::default();
        config.set_value("history-window", "12").expect("window");
        config.set_value("request-timeout", "30").expect("timeout");
        config.set_value("use-keyring", "off").expect("toggle");
        config.set_value("model", "  anthropic/claude-3-haiku ").expect("model");

        assert_eq!(config.history_window, Some(12));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.use_keyring());
        assert_eq!(config.model(), "anthropic/claude-3-haiku");
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_value("history-window", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set_value("use-keyring", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set_value("theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unset_value_restores_default() {
        let mut config = Config::default();
        config.set_value("title", "Other").expect("set");
        config.unset_value("title").expect("unset");
        assert_eq!(config.title(), DEFAULT_TITLE);
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(config.request_timeout().is_none());
    }
}
