// Session endpoints for authenticated principals.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::super::session_response;
use crate::auth::{cookie, AuthContext, RequestMeta};
use crate::config;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SwitchRoleRequest {
    pub role: String,
}

/// GET /api/auth/whoami - Current principal as asserted by the session token
///
/// Authentication-only: any valid identity passes. The view is
/// claims-derived, so it reflects the token, not later server-side changes.
pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> ApiResponse<serde_json::Value> {
    ApiResponse::success(json!({
        "user": {
            "id": ctx.user_id,
            "email": ctx.email,
            "name": ctx.name,
            "role": ctx.active_role,
            "roles": ctx.granted_roles,
            "intelligenceLevel": ctx.level,
        },
        "permissions": ctx.effective_sorted(),
    }))
}

/// POST /api/auth/role - Switch the active role
///
/// Constrained to roles already granted; re-issues the session token so the
/// new active role is reflected immediately.
pub async fn switch_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(payload): Json<SwitchRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.switcher.switch(&ctx, &payload.role, &meta).await?;
    let expires_in = state.engine.codec().expires_in();
    Ok(session_response(
        StatusCode::OK,
        outcome.token,
        outcome.user.view(),
        expires_in,
    ))
}

/// DELETE /api/auth/session - Logout
///
/// Stateless tokens cannot be revoked; logout clears the cookie so the
/// client stops presenting it.
pub async fn logout() -> impl IntoResponse {
    let cookie = cookie::clear_session_cookie(&config::config().security);
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
    )
}
