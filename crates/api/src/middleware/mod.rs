// API Middleware
//
// This module contains custom middleware for the API layer,
// currently the capability check in front of the assistant endpoint.

pub mod auth;

// Re-export commonly used items
pub use auth::{require_capability, AuthState, AuthenticatedIdentity};
