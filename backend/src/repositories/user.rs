//! Credential store: user accounts

use super::StoreError;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use library_catalog_shared::models::{Role, User};
use library_catalog_shared::validation::normalize_email;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Parsed role; an unrecognized value is treated as a plain user
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            warn!(user_id = %self.id, error = %e, "Stored role not recognized");
            Role::User
        })
    }

    /// Public view without the password hash
    pub fn to_public(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            created_at: self.created_at,
        }
    }
}

/// Account data as submitted, checked before the password is hashed
#[derive(Debug, Clone, Validate)]
pub struct UserDraft {
    #[validate(length(min = 1, message = "Please enter a name"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "Please enter an email"),
        email(message = "Please enter a valid email")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter a password"))]
    pub password: String,
}

impl UserDraft {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
        }
    }

    /// Run the user schema rules
    pub fn check(&self) -> Result<(), ApiError> {
        self.validate()
            .map_err(|errors| ApiError::from_validation("user", &errors))
    }
}

/// Replacement password, held to the same rule as registration
#[derive(Debug, Clone, Validate)]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "Please enter a password"))]
    pub password: String,
}

impl PasswordChange {
    pub fn check(&self) -> Result<(), ApiError> {
        self.validate()
            .map_err(|errors| ApiError::from_validation("user", &errors))
    }
}

/// Input for inserting a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Persistent collection of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A taken email fails with
    /// [`StoreError::UniqueViolation`] on `users_email_key`.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Replace the stored hash. Returns false when no such user exists.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
