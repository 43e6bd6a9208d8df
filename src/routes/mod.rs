/// Router Module Index
///
/// Splits the gateway's routes by how they are guarded.

/// Pages and endpoints anyone may call; they read identity but never refuse.
pub mod public;

/// The protected back-office section: gatekeeper middleware plus layout guard.
pub mod manage;

/// The `/api` proxy surface, built from a table of `ProxyRoute`s.
pub mod api;
