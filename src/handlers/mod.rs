// HTTP route handlers, grouped by exposure: public (no token), protected
// (valid session required), elevated (session plus admin permissions).

pub mod elevated;
pub mod protected;
pub mod public;

use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Json};
use serde_json::json;

use crate::auth::cookie;
use crate::config;
use crate::store::PrincipalView;

/// Session-establishing response: success envelope with the token and
/// principal, plus a Set-Cookie installing the session cookie.
pub(crate) fn session_response(
    status: StatusCode,
    token: String,
    user: PrincipalView,
    expires_in: i64,
) -> impl IntoResponse {
    let cookie = cookie::session_cookie(&token, &config::config().security);
    (
        status,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({
            "success": true,
            "data": {
                "token": token,
                "user": user,
                "expires_in": expires_in,
            }
        })),
    )
}
