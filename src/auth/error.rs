// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use std::fmt;

use crate::auth::models::Role;
use crate::error::ApiError;

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    ExpiredToken,
    MissingToken,
    TokenGenerationError(String),

    /// Identity's role is not among the roles allowed for the operation
    InsufficientPermissions { required: Vec<Role>, actual: Role },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::InsufficientPermissions { required, actual } => {
                write!(
                    f,
                    "Insufficient permissions: required role {}, but user has role '{}'",
                    format_roles(required),
                    actual
                )
            }
        }
    }
}

impl std::error::Error for AuthError {}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| format!("'{}'", r))
        .collect::<Vec<_>>()
        .join(" or ")
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::MissingToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::TokenGenerationError(msg) => ApiError::InternalError(msg),
            AuthError::InsufficientPermissions { ref required, .. } => ApiError::Forbidden(
                format!("Insufficient permissions: required role {}", format_roles(required)),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
