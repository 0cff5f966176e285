//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Everything in here is built once at start-up and is cheap to clone:
//! the pool and the stores are reference counted, the token service
//! shares its pre-derived keys.

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::mail::{mailer_from_config, Mailer};
use crate::repositories::{BookStore, PgBookRepository, PgUserRepository, UserStore};
use crate::services::AuthService;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly by the readiness probe
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    /// Token service with cached keys; also used by the session extractor
    pub jwt: JwtService,
    pub auth: AuthService,
    pub books: Arc<dyn BookStore>,
}

impl AppState {
    /// Production state: PostgreSQL stores and the configured mailer
    pub fn new(db: PgPool, config: AppConfig) -> Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(db.clone()));
        let books: Arc<dyn BookStore> = Arc::new(PgBookRepository::new(db.clone()));
        let mailer = mailer_from_config(&config.mail)?;

        Ok(Self::with_stores(db, config, users, books, mailer))
    }

    /// State over caller-provided stores and mailer
    pub fn with_stores(
        db: PgPool,
        config: AppConfig,
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt = JwtService::new(
            &config.jwt.secret,
            config.jwt.session_token_expiry_secs,
            config.jwt.reset_token_expiry_secs,
        );
        let auth = AuthService::new(users, jwt.clone(), mailer, config.reset_link_base());

        Self {
            db,
            config: Arc::new(config),
            jwt,
            auth,
            books,
        }
    }

    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[inline]
    pub fn books(&self) -> &dyn BookStore {
        self.books.as_ref()
    }
}
