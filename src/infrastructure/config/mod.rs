//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::application::messaging::{BotSettings, ProxySettings, RetryPolicy};
use crate::application::messaging::dispatcher::DEFAULT_DEVICE_URL;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub approval: ApprovalConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub help_subtitle: String,
    pub threads: bool,
    pub include_demo_commands: bool,
    pub log_level: String,
    pub token: Option<String>,
    pub device_url: String,
    /// Identity lookup attempts at startup; unset retries until the backend answers
    #[serde(default)]
    pub startup_attempts: Option<u32>,
}

/// Who may talk to the bot; all empty means everyone
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApprovalConfig {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://webexapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "Webex Bot".to_string(),
                help_subtitle: "Here are my available commands. Click one to begin.".to_string(),
                threads: true,
                include_demo_commands: true,
                log_level: "info".to_string(),
                token: None,
                device_url: DEFAULT_DEVICE_URL.to_string(),
                startup_attempts: None,
            },
            approval: ApprovalConfig::default(),
            proxy: None,
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables win over file values
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.bot.token = Some(token);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.bot.log_level = level;
        }

        if let Ok(name) = std::env::var("BOT_NAME") {
            self.bot.name = name;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("api.timeout-secs must be positive".to_string()));
        }
        if let Some(domain) = self.approval.domains.iter().find(|d| d.contains('@')) {
            return Err(ConfigError::InvalidValue(format!(
                "approval domain '{}' looks like an email address",
                domain
            )));
        }
        Ok(())
    }

    /// Bot token, required to talk to the backend
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.bot
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("bot.token".to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Settings the bot is constructed from
    pub fn to_settings(&self) -> BotSettings {
        let mut settings = BotSettings::new(self.bot.token.clone().unwrap_or_default());
        settings.approved_users = self.approval.users.clone();
        settings.approved_domains = self.approval.domains.clone();
        settings.approved_rooms = self.approval.rooms.clone();
        settings.device_url = self.bot.device_url.clone();
        settings.include_demo_commands = self.bot.include_demo_commands;
        settings.bot_name = self.bot.name.clone();
        settings.help_subtitle = self.bot.help_subtitle.clone();
        settings.threads = self.bot.threads;
        settings.log_level = self.bot.log_level.clone();
        settings.proxy = self.proxy.as_ref().map(|p| ProxySettings {
            http: p.http.clone(),
            https: p.https.clone(),
        });
        settings.retry = RetryPolicy {
            max_attempts: self.bot.startup_attempts,
            ..RetryPolicy::default()
        };
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
bot:
  name: Ops Bot
  help-subtitle: Pick a command.
  threads: false
  include-demo-commands: false
  log-level: debug
  token: abc123
  device-url: https://devices.example.com
  startup-attempts: 3
approval:
  domains: [example.com]
  rooms: [room-1]
proxy:
  https: http://proxy.local:3128
"#;

    #[test]
    fn test_parse_yaml_config() {
        let config = Config::parse(YAML).unwrap();
        assert_eq!(config.bot.name, "Ops Bot");
        assert!(!config.bot.threads);
        assert_eq!(config.approval.domains, vec!["example.com"]);
        assert!(config.approval.users.is_empty());
        assert_eq!(config.api.base_url, "https://webexapis.com");
        assert_eq!(config.token().unwrap(), "abc123");
    }

    #[test]
    fn test_settings_from_config() {
        let settings = Config::parse(YAML).unwrap().to_settings();
        assert_eq!(settings.token, "abc123");
        assert_eq!(settings.approved_rooms, vec!["room-1"]);
        assert_eq!(settings.help_subtitle, "Pick a command.");
        assert!(!settings.threads);
        assert_eq!(settings.retry.max_attempts, Some(3));
        assert_eq!(settings.proxy.unwrap().https.as_deref(), Some("http://proxy.local:3128"));
    }

    #[test]
    fn test_missing_token_is_reported() {
        let config = Config::default();
        assert!(matches!(config.token(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_email_in_domain_list_is_rejected() {
        let yaml = YAML.replace("[example.com]", "[bob@example.com]");
        assert!(matches!(Config::parse(&yaml), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let parsed = Config::parse(&yaml).unwrap();
        assert!(parsed.bot.include_demo_commands);
        assert_eq!(parsed.bot.device_url, DEFAULT_DEVICE_URL);
    }
}
