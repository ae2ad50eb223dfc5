// HTTP API Error Types
use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

/// Response header set alongside 401 when the presented session token was
/// valid but expired, so clients can trigger a fresh login instead of
/// treating it as a hard failure.
pub const SESSION_EXPIRED_HEADER: &str = "x-session-expired";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { code: &'static str, message: String },

    // 401 Unauthorized
    Unauthorized { code: &'static str, message: String },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. } => code,
            ApiError::Unauthorized { code, .. } => code,
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { code: "BAD_REQUEST", message: message.into() }
    }

    pub fn invalid_role(message: impl Into<String>) -> Self {
        ApiError::BadRequest { code: "INVALID_ROLE", message: message.into() }
    }

    pub fn missing_token(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code: "MISSING_TOKEN", message: message.into() }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code: "INVALID_TOKEN", message: message.into() }
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code: "SESSION_EXPIRED", message: message.into() }
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { code: "INVALID_CREDENTIALS", message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert domain error types to ApiError
impl From<crate::auth::token::TokenError> for ApiError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        tracing::error!("token operation failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl From<crate::auth::engine::AuthzError> for ApiError {
    fn from(err: crate::auth::engine::AuthzError) -> Self {
        use crate::auth::engine::AuthzError;
        match err {
            AuthzError::MissingToken => {
                ApiError::missing_token("Authentication required: no session token presented")
            }
            AuthzError::InvalidToken => ApiError::invalid_token("Session token is invalid"),
            AuthzError::SessionExpired => ApiError::session_expired("Session has expired"),
            AuthzError::Forbidden => {
                ApiError::forbidden("You do not have permission to perform this action")
            }
        }
    }
}

impl From<crate::auth::switcher::RoleSwitchError> for ApiError {
    fn from(err: crate::auth::switcher::RoleSwitchError) -> Self {
        use crate::auth::switcher::RoleSwitchError;
        match err {
            RoleSwitchError::InvalidRole(name) => {
                ApiError::invalid_role(format!("'{}' is not a recognized role", name))
            }
            RoleSwitchError::Forbidden(msg) => ApiError::forbidden(msg),
            // A verified token naming a principal the store no longer knows is
            // treated the same as an invalid token rather than leaking detail.
            RoleSwitchError::UnknownPrincipal(_) => {
                ApiError::invalid_token("Session token is invalid")
            }
            RoleSwitchError::Token(e) => {
                tracing::error!("token mint failed during role switch: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            RoleSwitchError::Store(e) => e.into(),
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::DuplicateEmail(email) => {
                ApiError::conflict(format!("An account already exists for {}", email))
            }
            StoreError::UnknownUser(_) => ApiError::not_found("User not found"),
            StoreError::RoleNotGranted(role) => {
                ApiError::forbidden(format!("Role {} is not assigned to this account", role))
            }
            StoreError::Unavailable(msg) => {
                tracing::error!("user store unavailable: {}", msg);
                ApiError::service_unavailable("User store temporarily unavailable")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let expired = self.error_code() == "SESSION_EXPIRED";

        let mut response = (status, Json(self.to_json())).into_response();
        if expired {
            response.headers_mut().insert(
                HeaderName::from_static(SESSION_EXPIRED_HEADER),
                HeaderValue::from_static("true"),
            );
        }
        response
    }
}
