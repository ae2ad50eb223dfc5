use axum::http::{header, HeaderMap};

use crate::config::SecurityConfig;

/// Session cookie name. Part of the client contract.
pub const SESSION_COOKIE: &str = "accessToken";

/// Pull the session token out of the request's Cookie header(s).
///
/// Cookie headers arrive as semicolon-delimited `key=value` pairs, possibly
/// split across several headers, with optional whitespace around pairs and
/// `=` allowed inside values.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie_value(header, SESSION_COOKIE))
}

/// Scan one Cookie header for a named cookie.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    for pair in header.split(';') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        if key != name {
            continue;
        }
        if let Some(value) = parts.next() {
            return Some(value.trim().to_string());
        }
    }
    None
}

/// Set-Cookie value installing the session token: HTTP-only, SameSite=Lax,
/// whole-site path, 7-day max-age, Secure outside development.
pub fn session_cookie(token: &str, security: &SecurityConfig) -> String {
    let max_age = security.token_ttl_days * 24 * 3600;
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token, max_age
    );
    if security.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value clearing the session: empty value, Max-Age=0.
pub fn clear_session_cookie(security: &SecurityConfig) -> String {
    let mut cookie = format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE
    );
    if security.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_many() {
        let header = "theme=dark; accessToken=abc.def.ghi; locale=en-US";
        assert_eq!(cookie_value(header, SESSION_COOKIE).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn tolerates_whitespace_and_embedded_equals() {
        let header = "  theme=dark ;  accessToken = abc=def==  ; locale=en";
        assert_eq!(cookie_value(header, SESSION_COOKIE).as_deref(), Some("abc=def=="));
    }

    #[test]
    fn does_not_match_prefixed_names() {
        let header = "accessTokenOld=zzz; other=1";
        assert_eq!(cookie_value(header, SESSION_COOKIE), None);
    }

    #[test]
    fn missing_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn scans_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("accessToken=tok123"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn set_cookie_attributes() {
        let mut security = crate::config::SecurityConfig {
            jwt_secret: String::new(),
            jwt_issuer: "iss".into(),
            jwt_audience: "aud".into(),
            token_ttl_days: 7,
            secure_cookies: false,
            enable_cors: false,
            cors_origins: vec![],
        };

        let cookie = session_cookie("tok", &security);
        assert_eq!(cookie, "accessToken=tok; Max-Age=604800; Path=/; HttpOnly; SameSite=Lax");

        security.secure_cookies = true;
        assert!(session_cookie("tok", &security).ends_with("; Secure"));
        assert!(clear_session_cookie(&security).starts_with("accessToken=; Max-Age=0;"));
    }
}
