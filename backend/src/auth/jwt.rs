//! Session and reset token signing
//!
//! Both kinds of token are HS256 JWTs signed with the same secret; the
//! `token_type` claim keeps a session token from being accepted as a reset
//! token and the other way round.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// What a token authorizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Proves a prior login; carried in the `jwt` cookie
    Session,
    /// Authorizes one password change
    Reset,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub token_type: TokenKind,
}

impl Claims {
    /// User id carried in `sub`
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| anyhow::anyhow!("Invalid user ID in token"))
    }
}

/// Signing keys, derived once from the secret
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Token service held in `AppState`
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    session_expiry_secs: i64,
    reset_expiry_secs: i64,
}

impl JwtService {
    /// Create a token service. Call once at start-up.
    pub fn new(secret: &str, session_expiry_secs: i64, reset_expiry_secs: i64) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            session_expiry_secs,
            reset_expiry_secs,
        }
    }

    /// Issue a session token for a user
    #[inline]
    pub fn generate_session_token(&self, user_id: Uuid) -> Result<String> {
        self.generate_token(user_id, TokenKind::Session, self.session_expiry_secs)
    }

    /// Issue a password reset token for a user
    #[inline]
    pub fn generate_reset_token(&self, user_id: Uuid) -> Result<String> {
        self.generate_token(user_id, TokenKind::Reset, self.reset_expiry_secs)
    }

    fn generate_token(&self, user_id: Uuid, kind: TokenKind, expiry_secs: i64) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: kind,
        };

        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate {:?} token: {}", kind, e))
    }

    /// Check signature and expiry, returning the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &Validation::default())
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }

    fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != kind {
            return Err(anyhow::anyhow!("Expected a {:?} token", kind));
        }
        Ok(claims)
    }

    #[inline]
    pub fn validate_session_token(&self, token: &str) -> Result<Claims> {
        self.validate_kind(token, TokenKind::Session)
    }

    #[inline]
    pub fn validate_reset_token(&self, token: &str) -> Result<Claims> {
        self.validate_kind(token, TokenKind::Reset)
    }

    /// Session lifetime in seconds; also the cookie max-age
    #[inline]
    pub fn session_expiry_secs(&self) -> i64 {
        self.session_expiry_secs
    }
}
