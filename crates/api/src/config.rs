use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError};
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Requester authentication
    pub auth: AuthConfig,
    /// Invitation workflow settings
    pub invite: InviteConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Bearer token verification for requesters.
///
/// Tokens are issued elsewhere. Either a shared HS256 secret or an RSA
/// public key (RS256) verifies them; the public key wins when both are set.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,

    /// RSA public key in PEM format
    #[serde(default)]
    pub public_key: String,

    /// Leeway in seconds for clock skew tolerance
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn jwt_config(&self) -> Result<JwtConfig, JwtError> {
        if !self.public_key.is_empty() {
            JwtConfig::rs256(&self.public_key, self.leeway_secs)
        } else {
            Ok(JwtConfig::hs256(&self.jwt_secret, self.leeway_secs))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    /// Product name used in invitation subjects and bodies
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Public base URL that join links are made absolute against
    pub base_url: String,

    /// Path of the join page, relative to `base_url`
    #[serde(default = "default_join_path")]
    pub join_path: String,

    /// Server-wide salt mixed into every generated token
    #[serde(default)]
    pub token_salt: String,

    /// Members of this group may invite without naming groups
    #[serde(default = "default_admin_group")]
    pub admin_group: String,

    /// Domain of the fallback sender address; derived from `base_url` when empty
    #[serde(default)]
    pub mail_domain: String,

    /// Random characters fed into each token
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

/// Email service configuration for sending invitation emails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SendGrid API key (for sendgrid provider)
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender name used when a message carries none
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sender_name: default_sender_name(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    65_536
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_product_name() -> String {
    "ownCloud".to_string()
}
fn default_join_path() -> String {
    "/invite/join".to_string()
}
fn default_admin_group() -> String {
    "admin".to_string()
}
/// Fewest random characters accepted per token.
pub const MIN_TOKEN_LENGTH: usize = 16;

fn default_token_length() -> usize {
    32
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_name() -> String {
    "ownCloud".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with INVITE__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("INVITE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds entirely from embedded defaults so tests never touch the
    /// filesystem. Validation is skipped to allow partial configs.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 65536

            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "debug"
            format = "pretty"

            [auth]
            jwt_secret = "test-jwt-secret"
            leeway_secs = 0

            [invite]
            product_name = "Example Cloud"
            base_url = "https://cloud.example.com"
            join_path = "/invite/join"
            token_salt = "test-salt"
            admin_group = "admin"
            mail_domain = ""
            token_length = 32

            [email]
            enabled = false
            provider = "console"
            sender_name = "Example Cloud"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "INVITE__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.invite.token_salt.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "INVITE__INVITE__TOKEN_SALT must be set".to_string(),
            ));
        }

        if self.invite.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "invite.base_url must be set".to_string(),
            ));
        }

        if self.auth.jwt_secret.is_empty() && self.auth.public_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "auth.jwt_secret or auth.public_key must be set".to_string(),
            ));
        }

        if self.invite.token_length < MIN_TOKEN_LENGTH {
            return Err(ConfigValidationError::InvalidValue(format!(
                "invite.token_length must be at least {}",
                MIN_TOKEN_LENGTH
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
