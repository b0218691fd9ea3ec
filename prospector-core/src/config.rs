use std::env;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "o4-mini";
pub const DEFAULT_USER_AGENT: &str = "prospector/0.1";
pub const DEFAULT_DATABASE_PATH: &str = "prospector.db";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Character budget for LLM context assembly.
pub const DEFAULT_CONTEXT_CHAR_BUDGET: usize = 1200;
/// Minimum spacing between external LLM calls, in milliseconds.
pub const DEFAULT_STAGE_INTERVAL_MS: u64 = 1200;

pub const DEFAULT_ANONYMOUS_DAILY_LIMIT: i64 = 2;
pub const DEFAULT_VERIFIED_DAILY_LIMIT: i64 = 15;

/// All runtime configuration, resolved once at startup and passed into each
/// component at construction time. Nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub database_path: String,
    pub app_base_url: String,
    pub session_secret: String,
    pub resend_api_key: Option<String>,
    pub context_char_budget: usize,
    pub stage_interval_ms: u64,
    pub anonymous_daily_limit: i64,
    pub verified_daily_limit: i64,
}

/// Optional TOML file layer; environment variables override it.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub database_path: Option<String>,
    pub app_base_url: Option<String>,
    pub session_secret: Option<String>,
    pub resend_api_key: Option<String>,
    pub context_char_budget: Option<usize>,
    pub stage_interval_ms: Option<u64>,
    pub anonymous_daily_limit: Option<i64>,
    pub verified_daily_limit: Option<i64>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => {
                let raw =
                    std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                        path: p.display().to_string(),
                    })?;
                toml::from_str::<FileConfig>(&raw)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file)
    }

    pub fn resolve(file: FileConfig) -> Result<Self, ConfigError> {
        let session_secret = layered(file.session_secret, "SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set; sessions will not survive a restart");
            uuid::Uuid::new_v4().to_string()
        });

        Ok(Self {
            reddit_client_id: required(file.reddit_client_id, "REDDIT_CLIENT_ID")?,
            reddit_client_secret: required(file.reddit_client_secret, "REDDIT_CLIENT_SECRET")?,
            reddit_user_agent: layered(file.reddit_user_agent, "REDDIT_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            openai_api_key: required(file.openai_api_key, "OPENAI_API_KEY")?,
            openai_model: layered(file.openai_model, "OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            database_path: layered(file.database_path, "DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            app_base_url: layered(file.app_base_url, "APP_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session_secret,
            resend_api_key: layered(file.resend_api_key, "RESEND_API_KEY"),
            context_char_budget: file
                .context_char_budget
                .unwrap_or(DEFAULT_CONTEXT_CHAR_BUDGET),
            stage_interval_ms: file.stage_interval_ms.unwrap_or(DEFAULT_STAGE_INTERVAL_MS),
            anonymous_daily_limit: file
                .anonymous_daily_limit
                .unwrap_or(DEFAULT_ANONYMOUS_DAILY_LIMIT),
            verified_daily_limit: file
                .verified_daily_limit
                .unwrap_or(DEFAULT_VERIFIED_DAILY_LIMIT),
        })
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn layered(file_value: Option<String>, var: &str) -> Option<String> {
    env_non_empty(var).or(file_value)
}

fn required(file_value: Option<String>, var: &str) -> Result<String, ConfigError> {
    layered(file_value, var).ok_or(ConfigError::MissingEnvironmentVariable {
        var_name: var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_file() -> FileConfig {
        FileConfig {
            reddit_client_id: Some("id".to_string()),
            reddit_client_secret: Some("secret".to_string()),
            openai_api_key: Some("sk-test".to_string()),
            ..FileConfig::default()
        }
    }

    #[test]
    fn resolves_defaults_for_tunables() {
        let config = AppConfig::resolve(base_file()).unwrap();
        assert_eq!(config.context_char_budget, DEFAULT_CONTEXT_CHAR_BUDGET);
        assert_eq!(config.stage_interval_ms, DEFAULT_STAGE_INTERVAL_MS);
        assert_eq!(config.anonymous_daily_limit, 2);
        assert_eq!(config.verified_daily_limit, 15);
    }

    #[test]
    fn file_tunables_are_honored() {
        let file = FileConfig {
            context_char_budget: Some(400),
            verified_daily_limit: Some(50),
            ..base_file()
        };
        let config = AppConfig::resolve(file).unwrap();
        assert_eq!(config.context_char_budget, 400);
        assert_eq!(config.verified_daily_limit, 50);
    }

    #[test]
    fn parses_toml_layer() {
        let file: FileConfig = toml::from_str(
            r#"
            reddit_client_id = "id"
            reddit_client_secret = "secret"
            openai_api_key = "sk-test"
            stage_interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(file.stage_interval_ms, Some(500));
        assert!(AppConfig::resolve(file).is_ok());
    }
}
