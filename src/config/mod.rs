//! Configuration management
//!
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Session lifetime and sweeping
    #[serde(default)]
    pub session: SessionConfig,
    /// Per-session rate limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Upload limits
    #[serde(default)]
    pub upload: UploadConfig,
    /// Analysis request limits
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Generative-AI provider
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds (default: 1 hour)
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
    /// How often the expiry sweep runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

impl SessionConfig {
    /// Session lifetime, clamped to `MAX_SESSION_TTL_SECONDS`
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds.min(MAX_SESSION_TTL_SECONDS) as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    300
}

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u64,
    #[serde(default = "default_tokens_per_minute")]
    pub tokens_per_minute: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            tokens_per_minute: default_tokens_per_minute(),
        }
    }
}

fn default_requests_per_minute() -> u64 {
    10
}

fn default_tokens_per_minute() -> u64 {
    250_000
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum number of files per upload
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum combined size in bytes (default: 20MB)
    #[serde(default = "default_max_total_size")]
    pub max_total_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
            max_total_size: default_max_total_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

const MULTIPART_FRAMING_BYTES: usize = 1024 * 1024;

fn default_max_files() -> usize {
    5
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_total_size() -> u64 {
    20 * 1024 * 1024 // 20MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
        "image/gif".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Request body limit for the upload route
    ///
    /// Large enough for one file over the count cap at full size, or the
    /// total cap plus one full-size file, so the count and total-size checks
    /// report their own errors instead of the transport limit.
    pub fn body_limit(&self) -> usize {
        let per_file = self.max_file_size as usize;
        let by_count = self.max_files.saturating_add(1).saturating_mul(per_file);
        let by_total = (self.max_total_size as usize).saturating_add(per_file);
        by_count.max(by_total).saturating_add(MULTIPART_FRAMING_BYTES)
    }
}

/// Analysis request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum prompt length in characters
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Maximum number of image ids per request
    #[serde(default = "default_max_image_ids")]
    pub max_image_ids: usize,
    /// Default page size for history
    #[serde(default = "default_history_limit")]
    pub default_history_limit: usize,
    /// Largest accepted history page size
    #[serde(default = "default_max_history_limit")]
    pub max_history_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            max_image_ids: default_max_image_ids(),
            default_history_limit: default_history_limit(),
            max_history_limit: default_max_history_limit(),
        }
    }
}

fn default_max_prompt_chars() -> usize {
    2000
}

fn default_max_image_ids() -> usize {
    5
}

fn default_history_limit() -> usize {
    10
}

fn default_max_history_limit() -> usize {
    50
}

/// Generative-AI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (usually supplied through GEMINI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Model used for image analysis and editing
    #[serde(default = "default_provider_model")]
    pub model: String,
    /// Model used for video generation
    #[serde(default = "default_video_model")]
    pub video_model: String,
    /// Per-call HTTP timeout (default: 5 minutes)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_video_poll_interval")]
    pub video_poll_interval_seconds: u64,
    /// Give up polling a video operation after this long (default: 6 minutes)
    #[serde(default = "default_video_timeout")]
    pub video_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            model: default_provider_model(),
            video_model: default_video_model(),
            timeout_seconds: default_provider_timeout(),
            video_poll_interval_seconds: default_video_poll_interval(),
            video_timeout_seconds: default_video_timeout(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_secs(self.video_poll_interval_seconds)
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.video_timeout_seconds)
    }
}

fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_provider_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_video_model() -> String {
    "veo-3.0-generate-preview".to_string()
}

fn default_provider_timeout() -> u64 {
    300
}

fn default_video_poll_interval() -> u64 {
    10
}

fn default_video_timeout() -> u64 {
    360
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - PROMPTLENS_SERVER_HOST
    /// - PROMPTLENS_SERVER_PORT
    /// - PROMPTLENS_SERVER_CORS_ORIGIN
    /// - PROMPTLENS_SESSION_TTL_SECONDS
    /// - PROMPTLENS_RATE_LIMIT_REQUESTS_PER_MINUTE
    /// - PROMPTLENS_RATE_LIMIT_TOKENS_PER_MINUTE
    /// - PROMPTLENS_UPLOAD_MAX_FILES
    /// - PROMPTLENS_UPLOAD_MAX_FILE_SIZE
    /// - PROMPTLENS_UPLOAD_MAX_TOTAL_SIZE
    /// - PROMPTLENS_PROVIDER_MODEL
    /// - PROMPTLENS_PROVIDER_BASE_URL
    /// - GEMINI_API_KEY
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every request fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_seconds == 0 || self.session.ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "session.ttl_seconds must be between 1 and {}",
                MAX_SESSION_TTL_SECONDS
            )));
        }
        if self.session.sweep_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "session.sweep_interval_seconds must be at least 1".into(),
            ));
        }
        if self.upload.max_files == 0 {
            return Err(ConfigError::ValidationError("upload.max_files must be at least 1".into()));
        }
        if self.upload.max_file_size == 0 || self.upload.max_total_size == 0 {
            return Err(ConfigError::ValidationError("upload size limits must be non-zero".into()));
        }
        if self.rate_limit.requests_per_minute == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.requests_per_minute must be at least 1".into(),
            ));
        }
        if self.analysis.max_prompt_chars == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.max_prompt_chars must be at least 1".into(),
            ));
        }
        if self.analysis.default_history_limit == 0
            || self.analysis.default_history_limit > self.analysis.max_history_limit
        {
            return Err(ConfigError::ValidationError(
                "analysis.default_history_limit must be between 1 and max_history_limit".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PROMPTLENS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("PROMPTLENS_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(cors_origin) = std::env::var("PROMPTLENS_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Some(ttl) = env_parse::<u64>("PROMPTLENS_SESSION_TTL_SECONDS") {
            self.session.ttl_seconds = ttl;
        }

        if let Some(rpm) = env_parse::<u64>("PROMPTLENS_RATE_LIMIT_REQUESTS_PER_MINUTE") {
            self.rate_limit.requests_per_minute = rpm;
        }
        if let Some(tpm) = env_parse::<u64>("PROMPTLENS_RATE_LIMIT_TOKENS_PER_MINUTE") {
            self.rate_limit.tokens_per_minute = tpm;
        }

        if let Some(max_files) = env_parse::<usize>("PROMPTLENS_UPLOAD_MAX_FILES") {
            self.upload.max_files = max_files;
        }
        if let Some(size) = env_parse::<u64>("PROMPTLENS_UPLOAD_MAX_FILE_SIZE") {
            self.upload.max_file_size = size;
        }
        if let Some(size) = env_parse::<u64>("PROMPTLENS_UPLOAD_MAX_TOTAL_SIZE") {
            self.upload.max_total_size = size;
        }

        if let Ok(model) = std::env::var("PROMPTLENS_PROVIDER_MODEL") {
            self.provider.model = model;
        }
        if let Ok(base_url) = std::env::var("PROMPTLENS_PROVIDER_BASE_URL") {
            self.provider.base_url = base_url;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.provider.api_key = Some(key);
            }
        }
    }
}

/// Read and parse an env var, ignoring unparsable values
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_VARS: &[&str] = &[
    "PROMPTLENS_SERVER_HOST",
    "PROMPTLENS_SERVER_PORT",
    "PROMPTLENS_SERVER_CORS_ORIGIN",
    "PROMPTLENS_SESSION_TTL_SECONDS",
    "PROMPTLENS_RATE_LIMIT_REQUESTS_PER_MINUTE",
    "PROMPTLENS_RATE_LIMIT_TOKENS_PER_MINUTE",
    "PROMPTLENS_UPLOAD_MAX_FILES",
    "PROMPTLENS_UPLOAD_MAX_FILE_SIZE",
    "PROMPTLENS_UPLOAD_MAX_TOTAL_SIZE",
    "PROMPTLENS_PROVIDER_MODEL",
    "PROMPTLENS_PROVIDER_BASE_URL",
    "GEMINI_API_KEY",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for var in super::ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.session.ttl_seconds, 3600);
        assert_eq!(config.rate_limit.requests_per_minute, 10);
        assert_eq!(config.rate_limit.tokens_per_minute, 250_000);
        assert_eq!(config.upload.max_files, 5);
        assert_eq!(config.upload.max_file_size, 5_242_880);
        assert_eq!(config.upload.max_total_size, 20_971_520);
        assert_eq!(config.analysis.max_prompt_chars, 2000);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.analysis.max_history_limit, 50);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "rate_limit:\n  requests_per_minute: 3\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.rate_limit.requests_per_minute, 3);
        assert_eq!(config.rate_limit.tokens_per_minute, 250_000);
        assert_eq!(config.upload.max_files, 5);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origin: "https://app.example.com"
session:
  ttl_seconds: 600
  sweep_interval_seconds: 30
rate_limit:
  requests_per_minute: 20
  tokens_per_minute: 1000
upload:
  max_files: 3
  max_file_size: 1024
  max_total_size: 2048
  allowed_types: ["image/png"]
analysis:
  max_prompt_chars: 500
provider:
  model: "gemini-test"
  timeout_seconds: 30
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "https://app.example.com");
        assert_eq!(config.session.ttl_seconds, 600);
        assert_eq!(config.session.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.rate_limit.requests_per_minute, 20);
        assert_eq!(config.upload.max_files, 3);
        assert!(config.upload.is_type_allowed("image/png"));
        assert!(!config.upload.is_type_allowed("image/jpeg"));
        assert_eq!(config.analysis.max_prompt_chars, 500);
        assert_eq!(config.provider.model, "gemini-test");
        assert_eq!(config.provider.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        let err_msg = err.to_string();
        assert!(err_msg.contains("parse") || err_msg.contains("invalid"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.upload.max_files = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = Config::default();
        config.analysis.default_history_limit = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let mut config = Config::default();
        config.session.sweep_interval_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bounds_session_ttl() {
        let mut config = Config::default();
        config.session.ttl_seconds = 0;
        assert!(config.validate().is_err());

        config.session.ttl_seconds = MAX_SESSION_TTL_SECONDS;
        assert!(config.validate().is_ok());

        config.session.ttl_seconds = u64::MAX;
        assert!(config.validate().is_err());
        // ttl() never overflows even on an unvalidated config
        assert_eq!(config.session.ttl(), chrono::Duration::days(365));
    }

    #[test]
    fn test_env_override_huge_ttl_fails_validation() {
        let _guard = lock_env();

        std::env::set_var("PROMPTLENS_SESSION_TTL_SECONDS", "18446744073709551615");
        let result = Config::load_with_env(std::path::Path::new("nonexistent_config.yml"));
        assert!(result.is_err());

        std::env::remove_var("PROMPTLENS_SESSION_TTL_SECONDS");
    }

    #[test]
    fn test_body_limit_covers_total_size() {
        let config = UploadConfig::default();
        assert!(config.body_limit() > config.max_total_size as usize);
    }

    #[test]
    fn test_body_limit_admits_one_file_over_count_cap() {
        let config = UploadConfig::default();
        // six full-size files must reach the count check
        let six_files = 6 * config.max_file_size as usize;
        assert!(config.body_limit() > six_files);
        assert_eq!(config.body_limit(), 31 * 1024 * 1024);

        let config = UploadConfig {
            max_files: 1,
            max_file_size: 1024,
            max_total_size: 10 * 1024 * 1024,
            ..UploadConfig::default()
        };
        assert!(config.body_limit() > 10 * 1024 * 1024 + 1024);
    }

    #[test]
    fn test_env_override_server_and_limits() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("PROMPTLENS_SERVER_HOST", "192.168.1.1");
        std::env::set_var("PROMPTLENS_SERVER_PORT", "4000");
        std::env::set_var("PROMPTLENS_RATE_LIMIT_REQUESTS_PER_MINUTE", "2");
        std::env::set_var("PROMPTLENS_UPLOAD_MAX_FILE_SIZE", "1048576");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.rate_limit.requests_per_minute, 2);
        assert_eq!(config.upload.max_file_size, 1_048_576);

        for var in super::ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_override_api_key() {
        let _guard = lock_env();

        std::env::set_var("GEMINI_API_KEY", "secret-key");
        let config = Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("secret-key"));

        std::env::set_var("GEMINI_API_KEY", "   ");
        let config = Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();
        assert!(config.provider.api_key.is_none());

        std::env::remove_var("GEMINI_API_KEY");
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("PROMPTLENS_SERVER_PORT", "not_a_number");

        let config = Config::load_with_env(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);

        std::env::remove_var("PROMPTLENS_SERVER_PORT");
    }

    #[test]
    fn test_env_override_zero_limit_fails_validation() {
        let _guard = lock_env();

        std::env::set_var("PROMPTLENS_UPLOAD_MAX_FILES", "0");
        let result = Config::load_with_env(std::path::Path::new("nonexistent_config.yml"));
        assert!(result.is_err());

        std::env::remove_var("PROMPTLENS_UPLOAD_MAX_FILES");
    }
}
