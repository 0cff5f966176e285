//! API request and response types

use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Authentication
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password reset request (step one: ask for the email)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

/// Password reset confirmation (step two: token + new password)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub reset_token: String,
    #[serde(default)]
    pub new_password: String,
}

/// Response to a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: Uuid,
}

/// Response to a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: Uuid,
    pub role: Role,
}

/// Plain confirmation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reset token echoed back for the reset form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetFormResponse {
    pub reset_token: String,
}

/// Description of a form served by the GET auth pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDescription {
    pub form: String,
    pub action: String,
    pub fields: Vec<String>,
}

/// Field-keyed error body: `{ "errors": { "<field>": "<message>" } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: BTreeMap<String, String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Sort order for listing the catalog
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    #[default]
    Title,
    PublishYear,
}

/// Query for `GET /books`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookListQuery {
    #[serde(default)]
    pub sort: BookSort,
}

/// Query for `GET /books/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSearchQuery {
    pub author: Option<String>,
    pub title: Option<String>,
}

/// Query for `GET /books/filter`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookFilterQuery {
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub min_stock: i32,
}

/// Request to add a book to the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publish_year: String,
    #[serde(default)]
    pub page_count: i32,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub cover_image: String,
}
