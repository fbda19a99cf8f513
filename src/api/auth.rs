//! HTTP handlers for accounts and tokens.

use axum::{Json, extract::State, http::StatusCode};

use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use super::error::{ApiErrorResponse, ValidationError};
use super::extract::{CurrentUser, JsonBody};
use super::handlers::AppState;
use super::validation::validate_registration;
use crate::domain::{AuthToken, NewUser, Timestamp, User};
use crate::infrastructure::{RepositoryError, hash_password_blocking, verify_password_blocking};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

async fn issue_token(state: &AppState, user: &User) -> Result<AuthResponse, ApiErrorResponse> {
    let token = state.tokens.issue(user.id, AuthToken::generate()).await?;

    Ok(AuthResponse {
        token: token.into_string(),
        user_id: user.id.value(),
        username: user.username.clone(),
    })
}

/// `POST /register`: creates an account and returns its token.
///
/// # Errors
///
/// Returns 400 on invalid fields or a taken username.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiErrorResponse> {
    let registration = validate_registration(&request)?;
    let password_hash = hash_password_blocking(registration.password).await?;

    let new_user = NewUser {
        username: registration.username,
        email: registration.email,
        password_hash,
    };
    let user = match state.users.create(new_user, Timestamp::now()).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            return Err(ValidationError::single("username", USERNAME_TAKEN).into());
        }
        Err(error) => return Err(error.into()),
    };
    tracing::info!(user_id = %user.id, username = %user.username, "Registered user");

    let response = issue_token(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /login`: exchanges a username and password for the user's token.
///
/// Missing fields are treated as bad credentials.
///
/// # Errors
///
/// Returns 401 when the credentials do not match an account.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiErrorResponse> {
    let (Some(username), Some(password)) = (request.username, request.password) else {
        tracing::warn!("Login attempt without credentials");
        return Err(ApiErrorResponse::authentication_failed(INVALID_CREDENTIALS));
    };

    let Some(credentials) = state.users.find_credentials(username.clone()).await? else {
        tracing::warn!(%username, "Login attempt for unknown user");
        return Err(ApiErrorResponse::authentication_failed(INVALID_CREDENTIALS));
    };

    if !verify_password_blocking(password, credentials.password_hash).await? {
        tracing::warn!(%username, "Login attempt with wrong password");
        return Err(ApiErrorResponse::authentication_failed(INVALID_CREDENTIALS));
    }

    Ok(Json(issue_token(&state, &credentials.user).await?))
}

/// `POST /logout`: revokes the caller's token.
///
/// # Errors
///
/// Returns 401 without valid credentials.
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, ApiErrorResponse> {
    state.tokens.revoke(user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, "Revoked token");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /me`: returns the caller's account.
///
/// # Errors
///
/// Returns 401 without valid credentials.
pub async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, ApiErrorResponse> {
    let account = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| ApiErrorResponse::authentication_failed("Invalid token."))?;

    Ok(Json(UserResponse::from(&account)))
}

/// `DELETE /me`: deletes the caller's account with all items and the token.
///
/// # Errors
///
/// Returns 401 without valid credentials.
pub async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, ApiErrorResponse> {
    state.users.delete(user.user_id).await?;
    tracing::info!(user_id = %user.user_id, "Deleted account");

    Ok(StatusCode::NO_CONTENT)
}
