// Bearer-token extractor for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{AuthenticatedUser, Role},
    token::TokenService,
};

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let endpoint = parts.uri.path().to_string();

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| {
                warn!("Missing Authorization header for endpoint: {}", endpoint);
                AuthError::MissingToken
            })?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("Authorization header missing 'Bearer ' prefix for endpoint: {}", endpoint);
            AuthError::InvalidToken
        })?;

        let user = TokenService::from_ref(state).authenticate(token)?;
        debug!(
            "Authenticated user_id={}, role={}, endpoint={}",
            user.user_id, user.role, endpoint
        );
        Ok(user)
    }
}

impl AuthenticatedUser {
    /// Fails with `InsufficientPermissions` unless the role is one of `allowed`
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            warn!(
                "Authorization failed: user_id={}, role={}, allowed={:?}",
                self.user_id, self.role, allowed
            );
            Err(AuthError::InsufficientPermissions {
                required: allowed.to_vec(),
                actual: self.role,
            })
        }
    }
}
