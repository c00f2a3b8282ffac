/// Router Module Index
///
/// Splits the HTTP surface by how the access gate treats it.

/// Unauthenticated service endpoints (health). Excluded from the gate.
pub mod public;

/// The session API under `/api/auth`. Excluded from the gate; handlers enforce
/// their own session requirements through the `AuthSession` extractor.
pub mod session;

/// The page bundle. Every request that reaches it has passed the gate.
pub mod pages;
