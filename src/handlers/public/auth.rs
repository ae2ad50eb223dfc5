// Public session endpoints: token acquisition via registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::super::session_response;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{NewUser, UserStore};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - Create a principal and receive a session token
///
/// New accounts always start as an unsophisticated CUSTOMER; seller approval
/// and admin promotion are separate privileged workflows.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let user = state
        .store
        .create(NewUser {
            email: payload.email.trim().to_string(),
            name: payload.name.trim().to_string(),
            password: payload.password,
        })
        .await?;

    tracing::info!(user = %user.id, "registered new principal");

    let token = state.engine.codec().issue(&user)?;
    let expires_in = state.engine.codec().expires_in();
    Ok(session_response(StatusCode::CREATED, token, user.view(), expires_in))
}

/// POST /auth/login - Authenticate and receive a session token
///
/// Unknown email and wrong password produce the same response.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .verify_login(payload.email.trim(), &payload.password)
        .await?
        .ok_or_else(|| ApiError::invalid_credentials("Invalid email or password"))?;

    tracing::info!(user = %user.id, "login");

    let token = state.engine.codec().issue(&user)?;
    let expires_in = state.engine.codec().expires_in();
    Ok(session_response(StatusCode::OK, token, user.view(), expires_in))
}
