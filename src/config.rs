use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Minimum length of the cookie signing secret, in bytes
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Admin gate configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Shared secret compared on login
    pub secret: String,
    /// Secret the session cookie signing key is derived from
    pub session_secret: String,
}

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for any path that is not an API route
    #[serde(default)]
    pub static_dir: Option<String>,
    #[serde(default = "default_session_expiry_hours")]
    pub session_expiry_hours: u64,
    /// How often expired sessions are purged
    #[serde(default = "default_session_cleanup_secs")]
    pub session_cleanup_secs: u64,
    /// Mark the session cookie `Secure` (HTTPS only)
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_session_expiry_hours() -> u64 {
    12
}

fn default_session_cleanup_secs() -> u64 {
    300
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            session_expiry_hours: default_session_expiry_hours(),
            session_cleanup_secs: default_session_cleanup_secs(),
            secure_cookies: false,
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite://contact_inbox.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Submission limits
#[derive(Debug, Deserialize, Clone)]
pub struct MessagesConfig {
    /// Maximum length of each submitted field, in characters
    #[serde(default = "default_max_field_length")]
    pub max_field_length: usize,
}

fn default_max_field_length() -> usize {
    5000
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            max_field_length: default_max_field_length(),
        }
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub admin: AdminConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: CONTACT_INBOX_)
            // e.g., CONTACT_INBOX_ADMIN__SECRET, CONTACT_INBOX_WEB__PORT
            .add_source(
                Environment::with_prefix("CONTACT_INBOX")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables from existing deployments win over everything
            .set_override_option("web.port", std::env::var("PORT").ok())?
            .set_override_option("admin.secret", std::env::var("ADMIN_SECRET").ok())?
            .set_override_option("admin.session_secret", std::env::var("SESSION_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }

    /// Reject configurations the admin gate cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.secret.is_empty() {
            return Err(ConfigError::Message(
                "admin.secret must be set (ADMIN_SECRET or CONTACT_INBOX_ADMIN__SECRET)".to_string(),
            ));
        }
        if self.admin.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "admin.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }
        self.web.session_ttl()?;
        if self.messages.max_field_length == 0 {
            return Err(ConfigError::Message(
                "messages.max_field_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl WebConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session lifetime; fails if `session_expiry_hours` is zero or does not
    /// fit in a `chrono::Duration`.
    pub fn session_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.session_expiry_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "web.session_expiry_hours must be between 1 and {} hours, got {}",
                    chrono::Duration::MAX.num_hours(),
                    self.session_expiry_hours
                ))
            })
    }
}
