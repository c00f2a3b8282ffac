use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::AppConfig,
    errors::ApiError,
    gate::landing::resolve_landing,
    models::{BackendUser, ResolvedSession, Role, SessionView},
};

/// AuthError
///
/// Token layer failures. The gate never sees these: `SessionTokens::resolve`
/// folds every one of them into an anonymous session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token expired")]
    Expired,

    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("failed to sign session token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("account has no role assigned")]
    MissingRole,
}

/// Claims
///
/// Payload of the signed session token. `sub` and `role` are optional on the
/// wire so a token missing either still decodes and then resolves to an
/// anonymous session instead of a half-authenticated one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub profile_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    // Backend bearer token, used for REST calls made on behalf of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The gate's view of these claims.
    pub fn resolve(&self) -> ResolvedSession {
        match (&self.sub, self.role) {
            (Some(subject), Some(role)) if !subject.is_empty() => ResolvedSession::Authenticated {
                subject: subject.clone(),
                role,
                profile_complete: self.profile_complete,
            },
            _ => ResolvedSession::Anonymous,
        }
    }

    /// The front end's view of these claims, or `None` if they are not a full
    /// session.
    pub fn view(&self) -> Option<SessionView> {
        let ResolvedSession::Authenticated {
            subject,
            role,
            profile_complete,
        } = self.resolve()
        else {
            return None;
        };

        Some(SessionView {
            landing: resolve_landing(Some(role), profile_complete).to_string(),
            subject,
            role,
            profile_complete,
            name: self.name.clone(),
            email: self.email.clone(),
        })
    }
}

/// SessionTokens
///
/// Issues, verifies and re-issues HS256 session tokens with a fixed TTL.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.session_secret, config.session_ttl)
    }

    /// Creates a session for a principal the backend just authenticated.
    pub fn issue(&self, user: &BackendUser) -> Result<String, AuthError> {
        let role = user
            .role
            .as_deref()
            .filter(|role| !role.is_empty())
            .map(Role::from_name)
            .ok_or(AuthError::MissingRole)?;

        self.sign(Claims {
            sub: Some(user.id.clone()),
            role: Some(role),
            profile_complete: user.profile_complete,
            name: user.name.clone(),
            email: Some(user.email.clone()).filter(|email| !email.is_empty()),
            access_token: user.access_token.clone(),
            iat: 0,
            exp: 0,
        })
    }

    /// Signs `claims` with a fresh issue time and expiry.
    pub fn sign(&self, mut claims: Claims) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        claims.iat = now;
        claims.exp = now + self.ttl.as_secs() as i64;

        encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Re-issues a session with an updated onboarding flag.
    pub fn update(&self, claims: Claims, profile_complete: bool) -> Result<String, AuthError> {
        self.sign(Claims {
            profile_complete,
            ..claims
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e),
            })
    }

    /// Never fails: any verification problem is an anonymous session.
    pub fn resolve(&self, token: &str) -> ResolvedSession {
        match self.verify(token) {
            Ok(claims) => claims.resolve(),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected; treating request as anonymous");
                ResolvedSession::Anonymous
            }
        }
    }
}

// --- Credential Extraction ---

/// Bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Value of the cookie called `name` across all Cookie headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}

/// The request's session credential: an explicit bearer token wins over the
/// session cookie.
pub fn session_credential<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

// --- Cookies ---

/// Set-Cookie value carrying a freshly issued session token.
pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie,
        token,
        config.session_ttl.as_secs()
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value that destroys the session cookie.
pub fn expired_session_cookie(config: &AppConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.session_cookie
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

// --- Extractor ---

/// AuthSession
///
/// The verified session of an API request. Extraction fails with 401 unless
/// the request carries a valid token that resolves to a full session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub subject: String,
    pub role: Role,
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionTokens: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = SessionTokens::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = session_credential(&parts.headers, &config.session_cookie)
            .ok_or_else(|| ApiError::Unauthorized("no session".to_string()))?;

        let claims = tokens.verify(token)?;

        match claims.resolve() {
            ResolvedSession::Authenticated { subject, role, .. } => Ok(AuthSession {
                subject,
                role,
                claims,
            }),
            ResolvedSession::Anonymous => {
                Err(ApiError::Unauthorized("incomplete session".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn tokens() -> SessionTokens {
        SessionTokens::new("unit-test-secret", Duration::from_secs(3600))
    }

    fn user(role: Option<&str>, profile_complete: bool) -> BackendUser {
        BackendUser {
            id: "cand-7".to_string(),
            email: "cand@example.com".to_string(),
            name: Some("Cand Seven".to_string()),
            role: role.map(str::to_string),
            profile_complete,
            access_token: Some("backend-token".to_string()),
        }
    }

    #[test]
    fn issued_token_resolves_to_authenticated_session() {
        let tokens = tokens();
        let token = tokens.issue(&user(Some("candidate"), false)).unwrap();

        assert_eq!(
            tokens.resolve(&token),
            ResolvedSession::Authenticated {
                subject: "cand-7".to_string(),
                role: Role::Candidate,
                profile_complete: false,
            }
        );

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.access_token.as_deref(), Some("backend-token"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn unknown_backend_role_is_carried_as_unknown() {
        let tokens = tokens();
        let token = tokens.issue(&user(Some("recruiter"), true)).unwrap();
        assert_eq!(tokens.resolve(&token).role(), Some(Role::Unknown));
    }

    #[test]
    fn account_without_role_cannot_get_a_session() {
        assert!(matches!(tokens().issue(&user(None, true)), Err(AuthError::MissingRole)));
        assert!(matches!(tokens().issue(&user(Some(""), true)), Err(AuthError::MissingRole)));
    }

    #[test]
    fn garbage_and_foreign_tokens_resolve_anonymous() {
        let tokens = tokens();
        assert_eq!(tokens.resolve("not-a-jwt"), ResolvedSession::Anonymous);

        let foreign = SessionTokens::new("another-secret", Duration::from_secs(3600))
            .issue(&user(Some("admin"), true))
            .unwrap();
        assert!(matches!(tokens.verify(&foreign), Err(AuthError::Invalid(_))));
        assert_eq!(tokens.resolve(&foreign), ResolvedSession::Anonymous);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = tokens();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Some("cand-7".to_string()),
            role: Some(Role::Candidate),
            profile_complete: true,
            name: None,
            email: None,
            access_token: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("unit-test-secret".as_bytes()),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::Expired)));
        assert_eq!(tokens.resolve(&token), ResolvedSession::Anonymous);
    }

    #[test]
    fn claims_without_role_or_subject_are_anonymous() {
        let base = Claims {
            sub: Some("u".to_string()),
            role: Some(Role::Manager),
            profile_complete: false,
            name: None,
            email: None,
            access_token: None,
            iat: 0,
            exp: 0,
        };

        assert!(base.resolve().is_authenticated());
        assert_eq!(Claims { role: None, ..base.clone() }.resolve(), ResolvedSession::Anonymous);
        assert_eq!(Claims { sub: None, ..base.clone() }.resolve(), ResolvedSession::Anonymous);
        assert_eq!(
            Claims { sub: Some(String::new()), ..base }.resolve(),
            ResolvedSession::Anonymous
        );
    }

    #[test]
    fn update_merges_profile_flag_and_keeps_identity() {
        let tokens = tokens();
        let token = tokens.issue(&user(Some("candidate"), false)).unwrap();
        let claims = tokens.verify(&token).unwrap();

        let updated = tokens.update(claims, true).unwrap();
        let view = tokens.verify(&updated).unwrap().view().unwrap();

        assert_eq!(view.subject, "cand-7");
        assert!(view.profile_complete);
        assert_eq!(view.landing, "/user/dashboard");
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; portal_session=from-cookie"),
        );
        assert_eq!(session_credential(&headers, "portal_session"), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_credential(&headers, "portal_session"), Some("from-header"));
    }

    #[test]
    fn cookie_lookup_matches_whole_names_only() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("portal_session_old=stale"));
        headers.append(header::COOKIE, HeaderValue::from_static("portal_session=fresh"));

        assert_eq!(cookie_value(&headers, "portal_session"), Some("fresh"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookies_are_secure_only_in_production() {
        let mut config = AppConfig::default();
        let cookie = session_cookie(&config, "abc");
        assert!(cookie.starts_with("portal_session=abc; Path=/; HttpOnly; SameSite=Lax"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));

        config.env = crate::config::Env::Production;
        assert!(session_cookie(&config, "abc").ends_with("; Secure"));
        assert!(expired_session_cookie(&config).contains("Max-Age=0"));
    }
}
