pub mod auth;
pub mod completions;
pub mod providers;

pub use auth::{AuthorizationService, StaticTokenAuthorizer};
pub use completions::CompletionServiceImpl;
