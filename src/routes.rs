use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::require_session;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API (valid session required; per-route permissions
        // enforced inside the handlers)
        .merge(session_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use crate::handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn session_routes(state: AppState) -> Router<AppState> {
    use crate::handlers::{elevated, protected};

    Router::new()
        // Session management for authenticated principals
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/auth/role", post(protected::auth::switch_role))
        .route("/api/auth/session", delete(protected::auth::logout))
        // Elevated: audit trail inspection
        .route("/api/admin/audit", get(elevated::audit::index))
        .route_layer(from_fn_with_state(state, require_session))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Bazaar Auth API",
            "version": version,
            "description": "Authorization and session-token core for the Bazaar commerce platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "register": "POST /auth/register (public - token acquisition)",
                "login": "POST /auth/login (public - token acquisition)",
                "whoami": "GET /api/auth/whoami (protected)",
                "role": "POST /api/auth/role (protected - switch active role)",
                "logout": "DELETE /api/auth/session (protected)",
                "audit": "GET /api/admin/audit (restricted, requires admin:read)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
