//! Session extraction
//!
//! Handlers that need a logged-in user take a [`SessionUser`] argument. The
//! extractor reads the `jwt` cookie and validates it with the token service
//! held in `AppState`.

use super::cookie::extract_session_token;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::FromRef, http::request::Parts};
use tracing::debug;
use uuid::Uuid;

/// User proven by a valid session cookie
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

        let claims = app_state.jwt().validate_session_token(&token).map_err(|e| {
            debug!(error = %e, "Rejected session cookie");
            ApiError::Unauthorized("Session is invalid or has expired".to_string())
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Session is invalid or has expired".to_string()))?;

        Ok(SessionUser { user_id })
    }
}
