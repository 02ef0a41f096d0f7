use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub eos_api_base_url: String,
    pub eos_api_timeout: Duration,
    pub bind_addr: String,
    pub bind_port: u16,
    pub app_env: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("EOS_API_BASE_URL is required and must not be empty")]
    MissingBaseUrl,
    #[error("EOS_API_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let eos_api_base_url = env::var("EOS_API_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let eos_api_timeout = env::var("EOS_API_TIMEOUT_SECS")
            .ok()
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS));

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let app_env = env::var("APP_ENV")
            .ok()
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "production".to_string());

        let config = Self {
            eos_api_base_url,
            eos_api_timeout,
            bind_addr,
            bind_port,
            app_env,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn dev_mode(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Environment variables are process-global; serialize the tests that
    // mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn reset_env() {
        env::remove_var("EOS_API_BASE_URL");
        env::remove_var("EOS_API_TIMEOUT_SECS");
        env::remove_var("BIND_ADDR");
        env::remove_var("BIND_PORT");
        env::remove_var("APP_ENV");
    }

    #[test]
    fn parse_defaults() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        reset_env();
        env::set_var("EOS_API_BASE_URL", "http://localhost:4000/");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.eos_api_base_url, "http://localhost:4000");
        assert_eq!(config.eos_api_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert!(!config.dev_mode());
    }

    #[test]
    fn missing_base_url_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        reset_env();

        let err = Config::from_env().expect_err("expected missing base url error");
        assert!(matches!(err, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn zero_timeout_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        reset_env();
        env::set_var("EOS_API_BASE_URL", "http://localhost:4000");
        env::set_var("EOS_API_TIMEOUT_SECS", "0");

        let err = Config::from_env().expect_err("expected invalid timeout error");
        assert!(matches!(err, ConfigError::InvalidTimeout));
    }

    #[test]
    fn development_env_enables_dev_mode() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        reset_env();
        env::set_var("EOS_API_BASE_URL", "http://localhost:4000");
        env::set_var("APP_ENV", "Development");

        let config = Config::from_env().expect("config should parse");
        assert!(config.dev_mode());
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        reset_env();
        env::set_var("EOS_API_BASE_URL", "http://localhost:4000");
        env::set_var("BIND_PORT", "notaport");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));
    }
}
