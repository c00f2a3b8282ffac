use crate::models::Role;

pub const SITE_ROOT: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const CANDIDATE_DASHBOARD: &str = "/user/dashboard";
pub const MANAGER_DASHBOARD: &str = "/manager/dashboard";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// resolve_landing
///
/// Maps a role and onboarding state to the role's canonical landing page. Used
/// both as the post-login destination and as the redirect target when a page is
/// denied. Total over its inputs: anything unmapped, including an absent role,
/// lands on the site root.
pub fn resolve_landing(role: Option<Role>, profile_complete: bool) -> &'static str {
    match role {
        Some(Role::Candidate) if profile_complete => CANDIDATE_DASHBOARD,
        Some(Role::Candidate) => ONBOARDING_PATH,
        Some(Role::Manager) => MANAGER_DASHBOARD,
        Some(Role::Admin) | Some(Role::Hr) => ADMIN_DASHBOARD,
        Some(Role::Unknown) | None => SITE_ROOT,
    }
}
