use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::RequestMeta;
use crate::error::ApiError;
use crate::state::AppState;

/// Session middleware for the protected subtree: verifies the session token
/// and injects the resolved `AuthContext` (and the request's `RequestMeta`)
/// into extensions. Responds 401 itself when no valid identity is present;
/// per-route permission requirements are enforced by the handlers through
/// `AuthzEngine::require`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let meta = RequestMeta::from_headers(request.headers());
    let ctx = state.engine.authenticate(request.headers())?;

    tracing::debug!(user = %ctx.user_id, role = %ctx.active_role, "session authenticated");

    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(meta);
    Ok(next.run(request).await)
}
