//! Authentication service
//!
//! Registration, login and the two-step password reset. Sessions are
//! stateless: the service only issues tokens, the route layer turns them
//! into cookies.

use crate::auth::{JwtService, PasswordService};
use crate::error::ApiError;
use crate::mail::{password_reset_mail, send_in_background, Mailer};
use crate::repositories::{NewUser, PasswordChange, UserDraft, UserStore};
use library_catalog_shared::models::{Role, User};
use library_catalog_shared::types::RegisterRequest;
use library_catalog_shared::validation::normalize_email;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a successful register or login
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user_id: Uuid,
    pub role: Role,
    /// Signed session token for the `jwt` cookie
    pub token: String,
}

/// Authentication service shared through `AppState`
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtService,
    mailer: Arc<dyn Mailer>,
    reset_link_base: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt: JwtService,
        mailer: Arc<dyn Mailer>,
        reset_link_base: impl Into<String>,
    ) -> Self {
        Self {
            users,
            jwt,
            mailer,
            reset_link_base: reset_link_base.into(),
        }
    }

    fn grant(&self, user_id: Uuid, role: Role) -> Result<SessionGrant, ApiError> {
        let token = self.jwt.generate_session_token(user_id)?;
        Ok(SessionGrant {
            user_id,
            role,
            token,
        })
    }

    /// Create an account and start a session for it
    pub async fn register(&self, req: &RegisterRequest) -> Result<SessionGrant, ApiError> {
        if req.password != req.confirm_password {
            return Err(ApiError::PasswordMismatch);
        }

        let draft = UserDraft::new(&req.name, &req.email, &req.password);
        draft.check()?;

        let password_hash = PasswordService::hash(draft.password).await?;

        let user = self
            .users
            .create(NewUser {
                name: draft.name,
                email: draft.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        self.grant(user.id, user.role())
    }

    /// Check credentials and start a session
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, ApiError> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::IncorrectEmail)?;

        let valid = PasswordService::verify(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::IncorrectPassword);
        }

        info!(user_id = %user.id, "User logged in");
        self.grant(user.id, user.role())
    }

    /// Issue a one-hour reset token and mail the link.
    ///
    /// The mail is sent in the background; delivery problems are logged
    /// and never reported to the caller.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                field: "email",
                message: "Email not found".to_string(),
            })?;

        let token = self.jwt.generate_reset_token(user.id)?;
        let link = format!("{}/{}", self.reset_link_base, token);

        send_in_background(self.mailer.clone(), password_reset_mail(&user.email, &link));
        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Set a new password using a reset token.
    ///
    /// The token is checked before the store is touched. Tokens are not
    /// single-use: a token stays valid until it expires.
    pub async fn confirm_password_reset(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let claims = self.jwt.validate_reset_token(reset_token).map_err(|e| {
            debug!(error = %e, "Rejected reset token");
            ApiError::InvalidToken
        })?;
        let user_id = claims.user_id().map_err(|_| ApiError::InvalidToken)?;

        let change = PasswordChange {
            password: new_password.to_string(),
        };
        change.check()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "Reset token for a user that no longer exists");
                ApiError::InvalidToken
            })?;

        let password_hash = PasswordService::hash(change.password).await?;
        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(ApiError::InvalidToken);
        }

        info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    /// Profile of the session user
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|record| record.to_public())
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))
    }

    /// Role of the session user, for authorization checks
    pub async fn role_of(&self, user_id: Uuid) -> Result<Role, ApiError> {
        Ok(self.current_user(user_id).await?.role)
    }
}
