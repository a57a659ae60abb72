use serde::Deserialize;
use std::time::Duration;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,
    pub history_service_url: String,
    pub history_service_token: String,
    pub diversification_api_url: Option<String>, // Simulator is off when unset
    pub session_idle_secs: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            gemini_api_key: required_secret("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: optional_http_url("GEMINI_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            alpha_vantage_api_key: required_secret("ALPHA_VANTAGE_API_KEY")?,
            alpha_vantage_base_url: optional_http_url("ALPHA_VANTAGE_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string()),
            history_service_url: optional_http_url("HISTORY_SERVICE_URL")?.ok_or_else(|| {
                anyhow::anyhow!("HISTORY_SERVICE_URL environment variable required")
            })?,
            history_service_token: required_secret("HISTORY_SERVICE_TOKEN")?,
            diversification_api_url: optional_http_url("DIVERSIFICATION_API_URL")?,
            session_idle_secs: parse_secs("SESSION_IDLE_SECS", 1800)?,
            http_timeout_secs: parse_secs("HTTP_TIMEOUT_SECS", 30)?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        config.log_summary();

        Ok(config)
    }

    /// Debug view of the loaded settings: hosts only, never credentials or keys.
    fn log_summary(&self) {
        tracing::debug!("Database host: {}", url_host(&self.database_url));
        tracing::debug!(
            "Gemini host: {} (model {})",
            url_host(&self.gemini_base_url),
            self.gemini_model
        );
        tracing::debug!("Alpha Vantage host: {}", url_host(&self.alpha_vantage_base_url));
        tracing::debug!("History service host: {}", url_host(&self.history_service_url));
        match self.diversification_api_url {
            Some(ref url) => tracing::info!("Diversification API configured: {}", url_host(url)),
            None => tracing::warn!("DIVERSIFICATION_API_URL not set, simulator disabled"),
        }
        tracing::debug!("Server Port: {}", self.port);
    }

    /// Idle time after which an untouched questionnaire or chat session is evicted.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Request timeout shared by every outbound HTTP client.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn required_secret(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn optional_http_url(name: &str) -> anyhow::Result<Option<String>> {
    let Some(raw) = std::env::var(name).ok().filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }

    Ok(Some(raw.trim_end_matches('/').to_string()))
}

/// Host part of a URL for logging. Userinfo, path and query are dropped.
fn url_host(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparseable>".to_string())
}

fn parse_secs(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", name)),
        Err(_) => Ok(default),
    }
}
