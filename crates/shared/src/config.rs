use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8451;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_BASE: &str = "https://getpocket.com";
pub const CALLBACK_PATH: &str = "/results";

#[derive(Debug, Clone)]
pub struct Config {
    pub consumer_key: String,
    pub host: String,
    pub port: u16,
    /// Origin the browser uses to reach this server; the OAuth callback is
    /// built from it.
    pub public_url: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(consumer_key: impl Into<String>, port: u16) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            host: DEFAULT_HOST.to_string(),
            port,
            public_url: format!("http://localhost:{}", port),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let consumer_key = env::var("POCKET_CONSUMER_KEY").context(
            "POCKET_CONSUMER_KEY not found.\n\n\
            To fix this, create ~/.config/pocket-calculator/.env with:\n  \
            POCKET_CONSUMER_KEY=your_key_here\n\n\
            Create a Pocket application to get a consumer key: https://getpocket.com/developer/apps/new",
        )?;

        let port = match env::var("POCKET_CALCULATOR_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid POCKET_CALCULATOR_PORT: {}", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let mut config = Self::new(consumer_key, port);

        if let Ok(host) = env::var("POCKET_CALCULATOR_HOST") {
            config.host = host;
        }
        if let Ok(public_url) = env::var("POCKET_CALCULATOR_PUBLIC_URL") {
            config.public_url = public_url;
        }
        if let Ok(api_base) = env::var("POCKET_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(raw) = env::var("POCKET_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid POCKET_TIMEOUT_SECS: {}", raw))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Port override from the command line. Keeps the public URL in step
    /// unless it was set explicitly.
    pub fn with_port(mut self, port: u16) -> Self {
        if self.public_url == format!("http://localhost:{}", self.port) {
            self.public_url = format!("http://localhost:{}", port);
        }
        self.port = port;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Where Pocket sends the browser after authorization.
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), CALLBACK_PATH)
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/pocket-calculator/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("pocket-calculator").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("key", DEFAULT_PORT);
        assert_eq!(config.bind_addr(), "127.0.0.1:8451");
        assert_eq!(config.callback_url(), "http://localhost:8451/results");
        assert_eq!(config.api_base, "https://getpocket.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_with_port_moves_default_public_url() {
        let config = Config::new("key", DEFAULT_PORT).with_port(9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.callback_url(), "http://localhost:9000/results");
    }

    #[test]
    fn test_with_port_keeps_custom_public_url() {
        let mut config = Config::new("key", DEFAULT_PORT);
        config.public_url = "https://stats.example.com/".to_string();
        let config = config.with_port(9000);
        assert_eq!(config.callback_url(), "https://stats.example.com/results");
    }
}
