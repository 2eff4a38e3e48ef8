use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Loaded once at startup and read-only thereafter. Missing required values
/// (database URL, signing key) are fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Signing key for bearer access tokens (must be at least 32 bytes)
    pub jwt_secret: String,

    /// Access token lifetime in seconds (default: 900 = 15 minutes)
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: i64,

    /// Refresh token lifetime in seconds (default: 604800 = 7 days)
    #[serde(default = "default_refresh_token_lifetime")]
    pub refresh_token_lifetime: i64,

    /// Remember-me refresh token lifetime in seconds (default: 30 days)
    #[serde(default = "default_remember_me_lifetime")]
    pub remember_me_lifetime: i64,

    /// Invite token lifetime in seconds (default: 7 days)
    #[serde(default = "default_invite_lifetime")]
    pub invite_token_lifetime: i64,

    /// Password reset token lifetime in seconds (default: 1 hour)
    #[serde(default = "default_reset_lifetime")]
    pub reset_token_lifetime: i64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated list of allowed CORS origins
    #[serde(default)]
    pub cors_origins: String,

    /// Admin seed credentials (used by the seed-admin CLI command)
    pub admin_seed_email: Option<String>,
    pub admin_seed_password: Option<String>,

    /// Argon2 parameters; defaults follow current policy
    #[serde(default = "default_hash_time_cost")]
    pub hash_time_cost: u32,
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,

    /// SMTP mailer (optional; mail dispatch is disabled when unset)
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Optional rate-limit overrides as "category=limit/window_secs" pairs,
    /// comma-separated (e.g. "login=10/60,export=5/86400")
    #[serde(default)]
    pub rate_limit_overrides: String,
}

fn default_access_token_lifetime() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_lifetime() -> i64 {
    604_800 // 7 days
}

fn default_remember_me_lifetime() -> i64 {
    2_592_000 // 30 days
}

fn default_invite_lifetime() -> i64 {
    604_800 // 7 days
}

fn default_reset_lifetime() -> i64 {
    3_600 // 1 hour
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_hash_time_cost() -> u32 {
    2
}

fn default_hash_memory_kib() -> u32 {
    64 * 1024
}

fn default_hash_parallelism() -> u32 {
    4
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "no-reply@localhost".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let builder =
            config::Config::builder().add_source(config::Environment::default());

        let config = builder.build()?.try_deserialize::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.database_url.is_empty() {
            return Err(config::ConfigError::Message(
                "DATABASE_URL must be set".to_string(),
            ));
        }
        if self.jwt_secret.len() < 32 {
            return Err(config::ConfigError::Message(
                "JWT_SECRET must be at least 32 bytes".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed CORS origin list.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}
