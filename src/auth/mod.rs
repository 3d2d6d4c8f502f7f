// Authentication module
// Validates the bearer token issued by the external authentication service
// and exposes the resulting `{id, role}` identity to handlers

pub mod error;
pub mod middleware;
pub mod models;
pub mod token;

pub use error::AuthError;
pub use models::{AuthenticatedUser, Role};
pub use token::{Claims, TokenService};
