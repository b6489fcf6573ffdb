//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::DEFAULT_PUBLIC_PREFIXES;
use crate::db::{Database, UserRole};
use crate::jwt::decode_signing_secret;
use crate::password::hash_password;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

/// Upper bound for `--token-ttl-minutes`: one year.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 525_600;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tollgate",
    about = "Cookie-carried JWT authentication in front of an HTTP service"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE", default_value = "tollgate.db")]
    pub database: String,

    /// Path to file containing the base64 JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Lifetime of issued tokens in minutes (at most one year)
    #[arg(long, env = "TOKEN_TTL_MINUTES", default_value = "60",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_MINUTES))]
    pub token_ttl_minutes: u64,

    /// Comma-separated path prefixes reachable without a token
    #[arg(long = "public-prefix", env = "PUBLIC_PREFIXES", value_delimiter = ',',
        default_values = DEFAULT_PUBLIC_PREFIXES.iter().copied(), value_parser = validate_prefix)]
    pub public_prefixes: Vec<String>,

    /// Upper bound on a single user lookup, in milliseconds
    #[arg(long, env = "RESOLVE_TIMEOUT_MS", default_value = "2000",
        value_parser = clap::value_parser!(u64).range(1..))]
    pub resolve_timeout_ms: u64,

    /// Set the Secure flag on the token cookie (use behind HTTPS)
    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Login submissions allowed per client IP per minute
    #[arg(long, env = "LOGIN_ATTEMPTS_PER_MINUTE", default_value = "10",
        value_parser = clap::value_parser!(u32).range(1..))]
    pub login_attempts_per_minute: u32,

    /// Create an admin user with this username on startup (password from ADMIN_PASSWORD)
    #[arg(long)]
    pub create_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_prefix(s: &str) -> Result<String, String> {
    let s = s.trim();

    if !s.starts_with('/') {
        return Err(format!("Public prefix must start with '/': {}", s));
    }

    if s == "/" {
        return Err("Public prefix '/' would expose every route".to_string());
    }

    if s.chars().any(|c| !c.is_ascii() || c.is_whitespace()) {
        return Err(format!("Public prefix contains invalid characters: {}", s));
    }

    Ok(s.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the base64 JWT secret from environment variable or file and decode it.
/// Returns None and logs an error if no usable key can be derived.
pub fn load_signing_key(jwt_secret_file: Option<&str>) -> Option<Vec<u8>> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    match decode_signing_secret(&secret) {
        Ok(key) => Some(key),
        Err(e) => {
            error!(error = %e, "Invalid JWT secret");
            None
        }
    }
}

/// Handle the --create-admin flag. Returns false if the admin could not be created.
pub async fn handle_create_admin(db: &Database, username: &str) -> bool {
    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            // SAFETY: still single-threaded startup, see load_signing_key.
            unsafe { std::env::remove_var("ADMIN_PASSWORD") };
            password
        }
        _ => {
            error!("ADMIN_PASSWORD must be set when using --create-admin");
            return false;
        }
    };

    match db.users().get_by_username(username).await {
        Ok(Some(_)) => {
            info!(username = %username, "Admin user already exists");
            return true;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            return false;
        }
    }

    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash admin password");
            return false;
        }
    };

    match db.users().create(username, &hash, UserRole::Admin).await {
        Ok(_) => {
            info!(username = %username, "Admin user created");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to create admin user");
            false
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: Vec<u8>) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret,
        token_ttl: Duration::from_secs(args.token_ttl_minutes.saturating_mul(60)),
        public_prefixes: args.public_prefixes.clone(),
        resolve_timeout: Duration::from_millis(args.resolve_timeout_ms),
        secure_cookies: args.secure_cookies,
        login_attempts_per_minute: args.login_attempts_per_minute,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
