use std::{env, path::PathBuf, time::Duration};

/// AppConfig
///
/// Holds the gate's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and the gate middleware pull it out of the
/// shared state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie security.
    pub env: Env,
    // Secret used to sign and verify session tokens (HS256).
    pub session_secret: String,
    // Lifetime of an issued session token.
    pub session_ttl: Duration,
    // Name of the cookie carrying the session token.
    pub session_cookie: String,
    // Base URL of the backend REST service (no trailing slash).
    pub backend_url: String,
    // Per-request timeout for backend calls.
    pub backend_timeout: Duration,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Directory holding the built page bundle served behind the gate.
    pub public_dir: PathBuf,
    // Optional JSON file overriding the built-in route tables.
    pub route_table_path: Option<PathBuf>,
}

/// Env
///
/// Runtime context. Production switches to JSON logs, `Secure` cookies and
/// mandatory secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_SESSION_SECRET: &str = "local-portal-session-secret-change-me";
const DEFAULT_TTL_DAYS: u64 = 30;

impl Default for AppConfig {
    /// Non-panicking configuration for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_TTL_DAYS * 24 * 60 * 60),
            session_cookie: "portal_session".to_string(),
            backend_url: "http://localhost:8000/api".to_string(),
            backend_timeout: Duration::from_secs(10),
            bind_addr: "0.0.0.0:3000".to_string(),
            public_dir: PathBuf::from("public"),
            route_table_path: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment and fails fast.
    ///
    /// # Panics
    /// Panics when `SESSION_SECRET` or `BACKEND_URL` is missing in production, or
    /// when a numeric variable cannot be parsed. The gate must never start with
    /// a guessable signing secret.
    pub fn load() -> Self {
        let defaults = Self::default();

        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => env::var("SESSION_SECRET")
                .expect("FATAL: SESSION_SECRET must be set in production."),
            Env::Local => env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
        };

        let backend_url = match env {
            Env::Production => {
                env::var("BACKEND_URL").expect("FATAL: BACKEND_URL must be set in production.")
            }
            Env::Local => env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
        };

        let session_ttl = env::var("SESSION_TTL_DAYS")
            .ok()
            .map(|days| {
                days.parse::<u64>()
                    .expect("FATAL: SESSION_TTL_DAYS must be a whole number of days")
            })
            .map(|days| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or(defaults.session_ttl);

        let backend_timeout = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .map(|secs| {
                secs.parse::<u64>()
                    .expect("FATAL: BACKEND_TIMEOUT_SECS must be a whole number of seconds")
            })
            .map(Duration::from_secs)
            .unwrap_or(defaults.backend_timeout);

        Self {
            env,
            session_secret,
            session_ttl,
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            backend_url: backend_url.trim_end_matches('/').to_string(),
            backend_timeout,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            route_table_path: env::var("ROUTE_TABLE_PATH").ok().map(PathBuf::from),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == Env::Production
    }
}
