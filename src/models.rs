use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// Role
///
/// The permission class carried in every session token. The backend is the
/// authoritative source at login time; afterwards the value travels inside the
/// signed token.
///
/// Role strings the portal does not know about deserialize to `Unknown`
/// instead of failing, so a backend that grows a new role never locks its users
/// out of the token layer. Unknown roles land on the site root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Candidate,
    Manager,
    Admin,
    Hr,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Parses a backend role name. Unrecognised names become `Role::Unknown`.
    pub fn from_name(name: &str) -> Role {
        match name.trim().to_ascii_lowercase().as_str() {
            "candidate" => Role::Candidate,
            "manager" => Role::Manager,
            "admin" => Role::Admin,
            "hr" => Role::Hr,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ResolvedSession
///
/// The only session shape the gate ever sees. A request is either fully
/// authenticated (subject and role present) or anonymous; partially decoded
/// payloads collapse to `Anonymous` before they get here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSession {
    Anonymous,
    Authenticated {
        subject: String,
        role: Role,
        profile_complete: bool,
    },
}

impl ResolvedSession {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, ResolvedSession::Authenticated { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            ResolvedSession::Authenticated { role, .. } => Some(*role),
            ResolvedSession::Anonymous => None,
        }
    }

    pub fn profile_complete(&self) -> bool {
        match self {
            ResolvedSession::Authenticated {
                profile_complete, ..
            } => *profile_complete,
            ResolvedSession::Anonymous => false,
        }
    }
}

// --- Backend Schemas ---

/// Envelope
///
/// Response wrapper used by every backend REST endpoint. `success = false` is an
/// application-level rejection (bad password, locked account) and is distinct
/// from an HTTP transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// BackendUser
///
/// The principal returned by the backend after a credential exchange or a
/// profile lookup.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BackendUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    // Raw role string; converted to `Role` when the token is issued.
    pub role: Option<String>,
    #[serde(default)]
    pub profile_complete: bool,
    // Bearer token for subsequent backend calls made on behalf of this user.
    #[serde(default)]
    pub access_token: Option<String>,
}

// --- Request Payloads ---

/// LoginRequest
///
/// Credentials posted to `POST /api/auth/login`. The password is forwarded to
/// the backend and never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub password: String,
}

/// UpdateSessionRequest
///
/// Optional body for `POST /api/auth/session/update`. Used only when the
/// session carries no backend token to re-read the profile with.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateSessionRequest {
    pub profile_complete: Option<bool>,
}

// --- Response Payloads ---

/// SessionView
///
/// What the front end learns about the current session. Never includes the
/// backend access token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionView {
    pub subject: String,
    pub role: Role,
    pub profile_complete: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    // Canonical landing page for this role and onboarding state.
    pub landing: String,
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub session: SessionView,
}
