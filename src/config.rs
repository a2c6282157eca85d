use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::BotError;

/// Path of the webhook endpoint that Telegram pushes updates to.
pub const WEBHOOK_PATH: &str = "/api/index";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Alternative Bot API server (e.g. a self-hosted `telegram-bot-api`).
    #[serde(default)]
    pub api_url: Option<String>,
    /// Username commands must be addressed to in groups (`/start@name`).
    #[serde(default)]
    pub bot_username: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Public base URL of the deployment, e.g. `https://my-bot.vercel.app`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub register_on_start: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslatorConfig {
    #[serde(default = "default_translator_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_translator_url() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bind: default_bind(),
            register_on_start: false,
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_translator_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// The bot credential, or a configuration error naming the missing variable.
    pub fn require_token(&self) -> Result<&str, BotError> {
        non_empty(&self.bot_token).ok_or_else(|| BotError::config("BOT_TOKEN not configured."))
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.bot_username).map(|name| name.trim_start_matches('@'))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl WebhookConfig {
    /// Full URL Telegram should deliver updates to, if a base URL is known.
    pub fn endpoint_url(&self) -> Option<String> {
        non_empty(&self.base_url).map(|base| format!("{}{}", normalize_base_url(base), WEBHOOK_PATH))
    }
}

/// Vercel exposes bare hostnames, so a missing scheme defaults to https.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

impl Config {
    /// Load configuration from a TOML file and the process environment.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` in the working
    /// directory is read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Config::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Overlay environment-style variables on top of file values. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(name) = get("BOT_USERNAME") {
            self.telegram.bot_username = Some(name);
        }
        if let Some(url) = get("TELEGRAM_API_URL") {
            self.telegram.api_url = Some(url);
        }
        if let Some(url) = get("VERCEL_URL").or_else(|| get("WEBHOOK_BASE_URL")) {
            self.webhook.base_url = Some(url);
        }
        if let Some(port) = get("PORT") {
            self.webhook.bind = format!("0.0.0.0:{}", port.trim());
        }
        if let Some(bind) = get("WEBHOOK_BIND") {
            self.webhook.bind = bind;
        }
        if let Some(url) = get("TRANSLATE_API_URL") {
            self.translator.base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.telegram.bot_token.is_none());
        assert_eq!(config.webhook.bind, "0.0.0.0:3000");
        assert!(!config.webhook.register_on_start);
        assert_eq!(config.translator.base_url, "https://translate.googleapis.com");
        assert_eq!(config.translator.timeout_secs, 10);
    }

    #[test]
    fn test_parse_full_file() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [webhook]
            base_url = "https://bot.example.com"
            bind = "127.0.0.1:8080"
            register_on_start = true

            [translator]
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.require_token().unwrap(), "123:abc");
        assert_eq!(config.webhook.bind, "127.0.0.1:8080");
        assert!(config.webhook.register_on_start);
        assert_eq!(config.translator.timeout_secs, 3);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let config = Config::default();
        let err = config.telegram.require_token().unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        assert_eq!(err.to_string(), "BOT_TOKEN not configured.");
    }

    #[test]
    fn test_empty_file_values_count_as_missing() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = ""
            bot_username = " "

            [webhook]
            base_url = ""
            "#,
        )
        .unwrap();
        let err = config.telegram.require_token().unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        assert!(config.telegram.username().is_none());
        assert!(config.webhook.endpoint_url().is_none());
    }

    #[test]
    fn test_username_strips_at_sign() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("BOT_USERNAME", "@translate_bot")]));
        assert_eq!(config.telegram.username(), Some("translate_bot"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("from-file".to_string());
        config.apply_overrides(env(&[
            ("BOT_TOKEN", "from-env"),
            ("VERCEL_URL", "my-bot.vercel.app"),
            ("PORT", "8081"),
        ]));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
        assert_eq!(config.webhook.base_url.as_deref(), Some("my-bot.vercel.app"));
        assert_eq!(config.webhook.bind, "0.0.0.0:8081");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("keep".to_string());
        config.apply_overrides(env(&[("BOT_TOKEN", ""), ("VERCEL_URL", "  ")]));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("keep"));
        assert!(config.webhook.base_url.is_none());
    }

    #[test]
    fn test_webhook_base_url_alias() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("WEBHOOK_BASE_URL", "https://alias.example.com")]));
        assert_eq!(
            config.webhook.endpoint_url().as_deref(),
            Some("https://alias.example.com/api/index")
        );
    }

    #[test]
    fn test_endpoint_url_normalization() {
        let mut webhook = WebhookConfig::default();
        assert!(webhook.endpoint_url().is_none());

        webhook.base_url = Some("https://bot.example.com".to_string());
        assert_eq!(
            webhook.endpoint_url().as_deref(),
            Some("https://bot.example.com/api/index")
        );

        webhook.base_url = Some("bot.example.com/".to_string());
        assert_eq!(
            webhook.endpoint_url().as_deref(),
            Some("https://bot.example.com/api/index")
        );

        webhook.base_url = Some("http://localhost:3000".to_string());
        assert_eq!(
            webhook.endpoint_url().as_deref(),
            Some("http://localhost:3000/api/index")
        );
    }
}
