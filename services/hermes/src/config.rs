use hermes_core::llm_client::{ClientConfig, Provider};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub provider: Provider,
    pub api_key: SecretString,
    pub chat_model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub log_level: Level,
    pub profile_path: PathBuf,
    pub prompts_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini', 'openai'", other),
                ));
            }
        };

        let key_var = match provider {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        };
        let api_key = std::env::var(key_var).map(SecretString::from).map_err(|_| {
            ConfigError::MissingVar(format!(
                "{} must be set for '{}' provider",
                key_var,
                provider_str.to_lowercase()
            ))
        })?;

        let chat_model = std::env::var("CHAT_MODEL")
            .unwrap_or_else(|_| provider.default_model().to_string());

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| provider.default_base_url().to_string());

        let timeout_str =
            std::env::var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let request_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "REQUEST_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ));
            }
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let profile_path = std::env::var("PROFILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./learner_profile.json"));

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            provider,
            api_key,
            chat_model,
            base_url,
            request_timeout,
            log_level,
            profile_path,
            prompts_path,
        })
    }

    /// Applies command-line path overrides on top of the environment.
    pub fn with_overrides(mut self, profile: Option<PathBuf>, prompts: Option<PathBuf>) -> Self {
        if let Some(profile) = profile {
            self.profile_path = profile;
        }
        if prompts.is_some() {
            self.prompts_path = prompts;
        }
        self
    }

    /// Connection settings for the text-generation client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: SecretString::from(self.api_key.expose_secret().to_owned()),
            model: self.chat_model.clone(),
            timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("LLM_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("LLM_BASE_URL");
            env::remove_var("REQUEST_TIMEOUT_SECS");
            env::remove_var("RUST_LOG");
            env::remove_var("PROFILE_PATH");
            env::remove_var("PROMPTS_PATH");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_gemini() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key.expose_secret(), "test-gemini-key");
        assert_eq!(config.chat_model, "gemini-1.5-flash");
        assert_eq!(config.base_url, Provider::Gemini.default_base_url());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.profile_path, PathBuf::from("./learner_profile.json"));
        assert_eq!(config.prompts_path, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "OpenAI");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("CHAT_MODEL", "gpt-4o-mini");
            env::set_var("LLM_BASE_URL", "http://localhost:11434/v1");
            env::set_var("REQUEST_TIMEOUT_SECS", "15");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROFILE_PATH", "/tmp/ana.json");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key.expose_secret(), "custom-openai-key");
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.profile_path, PathBuf::from("/tmp/ana.json"));
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));

        let client = config.client_config();
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.timeout, Duration::from_secs(15));
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "openai");
            env::set_var("GEMINI_API_KEY", "wrong-provider-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("OPENAI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "claude-via-carrier-pigeon");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LLM_PROVIDER"),
            _ => panic!("Expected InvalidValue for LLM_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_timeout() {
        for bad in ["0", "soon", "-5"] {
            clear_env_vars();
            unsafe {
                env::set_var("GEMINI_API_KEY", "test-gemini-key");
                env::set_var("REQUEST_TIMEOUT_SECS", bad);
            }

            let err = Config::from_env().unwrap_err();
            match err {
                ConfigError::InvalidValue(var, _) => assert_eq!(var, "REQUEST_TIMEOUT_SECS"),
                _ => panic!("Expected InvalidValue for REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_cli_overrides_win() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("PROMPTS_PATH", "/env/prompts");
        }

        let config = Config::from_env()
            .unwrap()
            .with_overrides(Some(PathBuf::from("cli.json")), None);

        assert_eq!(config.profile_path, PathBuf::from("cli.json"));
        assert_eq!(config.prompts_path, Some(PathBuf::from("/env/prompts")));
    }
}
