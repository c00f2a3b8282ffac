use std::path::Path;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

use super::landing::LOGIN_PATH;

/// ConfigError
///
/// Failures while loading a route table override. These are startup errors;
/// the gate itself never produces them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read route table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid route prefix {0:?}: prefixes must start with '/'")]
    Prefix(String),
}

/// RoleGate
///
/// One entry of the role-gated table: a path prefix and the roles allowed
/// through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGate {
    pub prefix: String,
    pub roles: Vec<Role>,
}

impl RoleGate {
    pub fn new(prefix: &str, roles: &[Role]) -> Self {
        Self {
            prefix: prefix.to_string(),
            roles: roles.to_vec(),
        }
    }

    pub fn permits(&self, role: Option<Role>) -> bool {
        role.is_some_and(|role| self.roles.contains(&role))
    }
}

/// RouteTable
///
/// The route classification tables. Entries are literal path-segment
/// prefixes. Role gates are evaluated in declaration order and the first
/// matching prefix wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub public_routes: Vec<String>,
    pub auth_routes: Vec<String>,
    pub role_gated_routes: Vec<RoleGate>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_login_path() -> String {
    LOGIN_PATH.to_string()
}

impl Default for RouteTable {
    fn default() -> Self {
        let owned = |routes: &[&str]| routes.iter().map(|r| r.to_string()).collect();
        Self {
            public_routes: owned(&[
                "/",
                "/jobs",
                "/about",
                "/contact",
                "/companies",
                // Self-service company onboarding, under an otherwise staff-only prefix.
                "/admin/companies/register",
                "/forgot-password",
                "/reset-password",
                "/verify-email",
            ]),
            auth_routes: owned(&["/login", "/signup"]),
            role_gated_routes: vec![
                RoleGate::new("/admin", &[Role::Admin, Role::Hr]),
                RoleGate::new("/manager", &[Role::Manager]),
                RoleGate::new("/user", &[Role::Candidate]),
            ],
            login_path: default_login_path(),
        }
    }
}

impl RouteTable {
    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }

    pub fn is_auth_route(&self, path: &str) -> bool {
        self.auth_routes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }

    /// The first role gate whose prefix covers `path`.
    pub fn role_gate_for(&self, path: &str) -> Option<&RoleGate> {
        self.role_gated_routes
            .iter()
            .find(|gate| matches_prefix(path, &gate.prefix))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefixes = self
            .public_routes
            .iter()
            .chain(&self.auth_routes)
            .chain(self.role_gated_routes.iter().map(|gate| &gate.prefix))
            .chain(std::iter::once(&self.login_path));

        for prefix in prefixes {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Prefix(prefix.clone()));
            }
        }
        Ok(())
    }
}

/// GateExclusions
///
/// Transport-level bypass list: requests matching it never reach the gate
/// rules. Covers the API namespace, bundler/static asset namespaces, well-known
/// metadata files and link prefetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateExclusions {
    pub prefixes: Vec<String>,
    pub files: Vec<String>,
    // Header names whose presence marks a prefetch.
    pub prefetch_headers: Vec<String>,
}

impl Default for GateExclusions {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|i| i.to_string()).collect();
        Self {
            prefixes: owned(&[
                "/api",
                "/api-docs",
                "/swagger-ui",
                "/health",
                "/_next/static",
                "/_next/image",
                "/static",
                "/assets",
            ]),
            files: owned(&["/favicon.ico", "/sitemap.xml", "/robots.txt"]),
            prefetch_headers: owned(&["next-router-prefetch"]),
        }
    }
}

impl GateExclusions {
    pub fn excludes_path(&self, path: &str) -> bool {
        self.files.iter().any(|file| file == path)
            || self
                .prefixes
                .iter()
                .any(|prefix| matches_prefix(path, prefix))
    }

    /// True when the request is a link prefetch rather than a navigation.
    pub fn is_prefetch(&self, headers: &HeaderMap) -> bool {
        let named = self
            .prefetch_headers
            .iter()
            .any(|name| headers.contains_key(name.as_str()));

        // `Purpose: prefetch` and `Sec-Purpose: prefetch` are the browser-native signals.
        let purpose = ["purpose", "sec-purpose"].iter().any(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.to_ascii_lowercase().contains("prefetch"))
        });

        named || purpose
    }
}

/// GateConfig
///
/// Everything the gate needs besides the session: the classification tables
/// and the transport exclusion list. Loaded once at startup and shared
/// read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(flatten)]
    pub routes: RouteTable,
    #[serde(default)]
    pub exclusions: GateExclusions,
}

impl GateConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GateConfig = serde_json::from_str(json)?;
        config.routes.validate()?;
        Ok(config)
    }

    /// Built-in tables when `path` is `None`, otherwise the JSON file at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            public = config.routes.public_routes.len(),
            auth = config.routes.auth_routes.len(),
            gated = config.routes.role_gated_routes.len(),
            "Loaded route table override"
        );
        Ok(config)
    }
}

/// matches_prefix
///
/// Literal prefix match on a path-segment boundary: `/jobs` covers `/jobs`,
/// `/jobs/` and `/jobs/42` but not `/jobsboard`. The root entry `/` covers
/// only the root itself.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.trim_end_matches('/').is_empty();
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
