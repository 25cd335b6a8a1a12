use revolt_core::llm_client::GEMINI_OPENAI_API_BASE;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Placeholder key shipped in sample `.env` files.
pub const DEMO_API_KEY: &str = "test_key_for_demo";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub chat_model: String,
    pub generation_timeout: Duration,
    pub static_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = match std::env::var("BIND_ADDRESS") {
            Ok(addr) => addr,
            Err(_) => {
                let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let gemini_api_base = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| GEMINI_OPENAI_API_BASE.to_string());

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let timeout_str =
            std::env::var("GENERATION_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let generation_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "GENERATION_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ));
            }
        };

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            gemini_api_key,
            gemini_api_base,
            chat_model,
            generation_timeout,
            static_dir,
            log_level,
        })
    }

    /// True when the key is the sample placeholder rather than a real credential.
    pub fn uses_demo_key(&self) -> bool {
        self.gemini_api_key == DEMO_API_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("PORT");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("GEMINI_API_BASE");
            env::remove_var("CHAT_MODEL");
            env::remove_var("GENERATION_TIMEOUT_SECS");
            env::remove_var("STATIC_DIR");
            env::remove_var("RUST_LOG");
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
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
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.gemini_api_key, "test-gemini-key");
        assert_eq!(config.gemini_api_base, GEMINI_OPENAI_API_BASE);
        assert_eq!(config.chat_model, "gemini-1.5-flash");
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.static_dir, PathBuf::from("./public"));
        assert_eq!(config.log_level, Level::INFO);
        assert!(!config.uses_demo_key());
    }

    #[test]
    #[serial]
    fn test_config_port_fallback() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PORT", "8081");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8081");
    }

    #[test]
    #[serial]
    fn test_config_bind_address_wins_over_port() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PORT", "8081");
            env::set_var("BIND_ADDRESS", "127.0.0.1:9000");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "custom-gemini-key");
            env::set_var("GEMINI_API_BASE", "http://localhost:8089/v1");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("GENERATION_TIMEOUT_SECS", "5");
            env::set_var("STATIC_DIR", "/srv/revolt/public");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.gemini_api_key, "custom-gemini-key");
        assert_eq!(config.gemini_api_base, "http://localhost:8089/v1");
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.generation_timeout, Duration::from_secs(5));
        assert_eq!(config.static_dir, PathBuf::from("/srv/revolt/public"));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("GEMINI_API_KEY")),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_port() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_zero_timeout_rejected() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("GENERATION_TIMEOUT_SECS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "GENERATION_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for GENERATION_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
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
    fn test_demo_key_detected() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", DEMO_API_KEY);
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert!(config.uses_demo_key());
    }
}
