//! Authentication routes
//!
//! Register, login, logout and the password reset flow. Successful
//! register/login responses carry the session token in the `jwt` cookie.

use crate::auth::cookie::{cleared_session_cookie, session_cookie};
use crate::auth::SessionUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use library_catalog_shared::models::User;
use library_catalog_shared::types::{
    FormDescription, LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest,
    RegisterRequest, RegisterResponse, ResetFormResponse, ResetPasswordRequest,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/password-reset-request", post(password_reset_request))
        .route("/reset-password", post(reset_password))
        .route("/reset-password/:token", get(reset_password_form))
        .route("/me", get(me))
}

fn form(name: &str, fields: &[&str]) -> Json<FormDescription> {
    Json(FormDescription {
        form: name.to_string(),
        action: format!("/{}", name),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    })
}

fn set_session_cookie(state: &AppState, token: &str) -> [(axum::http::HeaderName, String); 1] {
    let cookie = session_cookie(
        token,
        state.jwt().session_expiry_secs(),
        state.config().app.secure_cookies,
    );
    [(SET_COOKIE, cookie.to_string())]
}

/// GET /register
async fn register_form() -> Json<FormDescription> {
    form("register", &["name", "email", "password", "confirmPassword"])
}

/// GET /login
async fn login_form() -> Json<FormDescription> {
    form("login", &["email", "password"])
}

/// POST /register
///
/// 201 `{ "user": <id> }` with the session cookie set.
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let grant = state.auth().register(&req).await?;

    Ok((
        StatusCode::CREATED,
        set_session_cookie(&state, &grant.token),
        Json(RegisterResponse {
            user: grant.user_id,
        }),
    ))
}

/// POST /login
///
/// 201 `{ "user": <id>, "role": <role> }` with the session cookie set.
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let grant = state.auth().login(&req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        set_session_cookie(&state, &grant.token),
        Json(LoginResponse {
            user: grant.user_id,
            role: grant.role,
        }),
    ))
}

/// GET /logout
///
/// Overwrites the session cookie with an expired empty value and
/// redirects home.
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = cleared_session_cookie(state.config().app.secure_cookies);
    ([(SET_COOKIE, cookie.to_string())], Redirect::to("/"))
}

/// POST /password-reset-request
async fn password_reset_request(
    State(state): State<AppState>,
    body: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = body?;
    state.auth().request_password_reset(&req.email).await?;
    Ok(Json(MessageResponse::new("Password reset email sent")))
}

/// GET /reset-password/:token
///
/// Target of the emailed link; hands the token back for the reset form.
async fn reset_password_form(Path(token): Path<String>) -> Json<ResetFormResponse> {
    Json(ResetFormResponse { reset_token: token })
}

/// POST /reset-password
async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = body?;
    state
        .auth()
        .confirm_password_reset(&req.reset_token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password successfully reset")))
}

/// GET /me (requires session)
async fn me(State(state): State<AppState>, session: SessionUser) -> ApiResult<Json<User>> {
    let user = state.auth().current_user(session.user_id).await?;
    Ok(Json(user))
}
