//! The access gate applied to every navigational page request.
//!
//! The decision procedure is a pure function of `(path, session, tables)`:
//! an ordered list of named rules, evaluated top to bottom, where the first
//! rule that produces a decision wins. Precedence is
//! public > auth-route > unauthenticated > role-gated > onboarding > default.

pub mod landing;
pub mod middleware;
pub mod table;

use percent_encoding::percent_decode_str;

use crate::models::{ResolvedSession, Role};

use landing::{CANDIDATE_DASHBOARD, ONBOARDING_PATH, resolve_landing};
use table::{RouteTable, matches_prefix};

/// Decision
///
/// Outcome of a gate evaluation: let the request through unchanged, or send
/// the client elsewhere. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(String),
}

/// The inputs of one gate evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    // Raw query string of the original request, if any.
    pub query: Option<&'a str>,
    pub session: &'a ResolvedSession,
}

impl<'a> GateRequest<'a> {
    pub fn new(path: &'a str, session: &'a ResolvedSession) -> Self {
        Self {
            path,
            query: None,
            session,
        }
    }

    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    fn landing(&self) -> Decision {
        Decision::Redirect(
            resolve_landing(self.session.role(), self.session.profile_complete()).to_string(),
        )
    }

    fn original_target(&self) -> String {
        match self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.to_string(),
        }
    }
}

/// A named step of the evaluation order. `apply` returns `None` to defer to the
/// next rule.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&GateRequest<'_>, &RouteTable) -> Option<Decision>,
}

/// Evaluation order. The final rule always decides.
pub const RULES: &[Rule] = &[
    Rule {
        name: "public",
        apply: public_rule,
    },
    Rule {
        name: "auth-route",
        apply: auth_route_rule,
    },
    Rule {
        name: "unauthenticated",
        apply: unauthenticated_rule,
    },
    Rule {
        name: "role-gated",
        apply: role_gated_rule,
    },
    Rule {
        name: "onboarding",
        apply: onboarding_rule,
    },
    Rule {
        name: "default",
        apply: default_rule,
    },
];

/// The decision together with the rule that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub rule: &'static str,
    pub decision: Decision,
}

/// evaluate
///
/// Runs the rules in order and returns the first decision. Deterministic: the
/// same request and tables always produce the same verdict.
pub fn evaluate(request: &GateRequest<'_>, table: &RouteTable) -> Verdict {
    RULES
        .iter()
        .find_map(|rule| {
            (rule.apply)(request, table).map(|decision| Verdict {
                rule: rule.name,
                decision,
            })
        })
        .unwrap_or(Verdict {
            rule: "default",
            decision: Decision::Proceed,
        })
}

/// canonical_path
///
/// The path as the page service will resolve it: percent-decoded (an encoded
/// `/` becomes a separator), empty and `.` segments dropped, `..` applied
/// without climbing above the root. A trailing slash is kept so `/jobs/`
/// still reads as written. Tables are only ever checked against this form.
pub fn canonical_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if !segments.is_empty() && decoded.ends_with('/') {
        path.push('/');
    }
    path
}

fn public_rule(request: &GateRequest<'_>, table: &RouteTable) -> Option<Decision> {
    table.is_public(request.path).then_some(Decision::Proceed)
}

fn auth_route_rule(request: &GateRequest<'_>, table: &RouteTable) -> Option<Decision> {
    if !table.is_auth_route(request.path) {
        return None;
    }

    match request.session {
        ResolvedSession::Authenticated { .. } => Some(request.landing()),
        ResolvedSession::Anonymous => Some(Decision::Proceed),
    }
}

fn unauthenticated_rule(request: &GateRequest<'_>, table: &RouteTable) -> Option<Decision> {
    if request.session.is_authenticated() {
        return None;
    }

    let target: String = url::form_urlencoded::byte_serialize(request.original_target().as_bytes())
        .collect();
    Some(Decision::Redirect(format!(
        "{}?redirect={}",
        table.login_path, target
    )))
}

fn role_gated_rule(request: &GateRequest<'_>, table: &RouteTable) -> Option<Decision> {
    let gate = table.role_gate_for(request.path)?;

    if gate.permits(request.session.role()) {
        Some(Decision::Proceed)
    } else {
        Some(request.landing())
    }
}

fn onboarding_rule(request: &GateRequest<'_>, _table: &RouteTable) -> Option<Decision> {
    if !matches_prefix(request.path, ONBOARDING_PATH) {
        return None;
    }

    // Onboarding is a one-time, candidate-only flow.
    match request.session {
        ResolvedSession::Authenticated {
            role: Role::Candidate,
            profile_complete: true,
            ..
        } => Some(Decision::Redirect(CANDIDATE_DASHBOARD.to_string())),
        ResolvedSession::Authenticated {
            role: Role::Candidate,
            profile_complete: false,
            ..
        } => Some(Decision::Proceed),
        _ => Some(request.landing()),
    }
}

fn default_rule(_request: &GateRequest<'_>, _table: &RouteTable) -> Option<Decision> {
    Some(Decision::Proceed)
}
