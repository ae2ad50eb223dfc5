use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::auth::cookie;
use crate::auth::permissions::{grants_wildcard, PermissionTable, WILDCARD};
use crate::auth::token::{Claims, TokenCodec, TokenError};
use crate::types::{Role, SophisticationLevel};

/// Authorization failure taxonomy. Always terminal for the request; never
/// retried or downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("no session token presented")]
    MissingToken,
    #[error("session token is invalid")]
    InvalidToken,
    #[error("session has expired")]
    SessionExpired,
    #[error("insufficient permissions")]
    Forbidden,
}

/// Request attribution captured for audit records.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self { ip, user_agent }
    }
}

/// The authenticated principal as resolved from a verified token, with the
/// effective permission set already computed across every granted role.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub active_role: Role,
    pub granted_roles: Vec<Role>,
    pub level: SophisticationLevel,
    pub effective: HashSet<String>,
}

impl AuthContext {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.effective.contains(WILDCARD) || self.effective.contains(permission)
    }

    pub fn is_admin(&self) -> bool {
        self.granted_roles.contains(&Role::Admin)
    }

    /// Effective permissions as a sorted list, for responses and audit
    /// payloads.
    pub fn effective_sorted(&self) -> Vec<String> {
        let mut perms: Vec<String> = self.effective.iter().cloned().collect();
        perms.sort();
        perms
    }
}

/// Decides allow/deny for every protected operation. Stateless apart from
/// the injected read-only permission table; safe to share across requests.
pub struct AuthzEngine {
    codec: TokenCodec,
    table: Arc<PermissionTable>,
    sink: Arc<dyn AuditSink>,
}

impl AuthzEngine {
    pub fn new(codec: TokenCodec, table: Arc<PermissionTable>, sink: Arc<dyn AuditSink>) -> Self {
        Self { codec, table, sink }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Token extraction and verification plus effective-permission
    /// resolution; no permission comparison yet.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthzError> {
        let token = bearer_token(headers)
            .or_else(|| cookie::session_token(headers))
            .ok_or(AuthzError::MissingToken)?;

        let claims = self.codec.verify(&token).map_err(|err| match err {
            TokenError::Expired => AuthzError::SessionExpired,
            TokenError::Malformed(reason) => {
                tracing::debug!("rejected malformed session token: {}", reason);
                AuthzError::InvalidToken
            }
            // Anything unexpected is reported as an invalid token rather
            // than leaking internal detail.
            other => {
                tracing::error!("token verification failed unexpectedly: {}", other);
                AuthzError::InvalidToken
            }
        })?;

        Ok(self.context_from_claims(claims))
    }

    /// Effective permissions = union over all granted roles, plus the
    /// wildcard when any granted role carries it.
    fn context_from_claims(&self, claims: Claims) -> AuthContext {
        let granted_roles = claims.granted_roles();
        let mut effective: HashSet<String> = HashSet::new();
        for role in &granted_roles {
            effective.extend(
                self.table
                    .permissions_for(claims.intelligence_level, *role)
                    .iter()
                    .cloned(),
            );
            if grants_wildcard(claims.intelligence_level, *role) {
                effective.insert(WILDCARD.to_string());
            }
        }

        AuthContext {
            user_id: claims.user_id,
            email: claims.email,
            name: claims.name,
            active_role: claims.role,
            granted_roles,
            level: claims.intelligence_level,
            effective,
        }
    }

    /// Pure permission comparison: allowed iff every required permission is
    /// effective, or the wildcard is. An empty required set passes, which is
    /// how authentication-only routes are expressed.
    pub fn check(&self, ctx: &AuthContext, required: &[&str]) -> Result<(), AuthzError> {
        if required.is_empty() || ctx.effective.contains(WILDCARD) {
            return Ok(());
        }
        if required.iter().all(|p| ctx.effective.contains(*p)) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden)
        }
    }

    /// Permission check for an already-authenticated principal, appending an
    /// UNAUTHORIZED_ACCESS audit record on denial.
    pub fn require(
        &self,
        ctx: &AuthContext,
        required: &[&str],
        meta: &RequestMeta,
    ) -> Result<(), AuthzError> {
        self.check(ctx, required).inspect_err(|_| {
            tracing::warn!(
                user = %ctx.user_id,
                required = ?required,
                "permission denied"
            );
            self.sink.record(AuditRecord::new(
                AuditAction::UnauthorizedAccess,
                ctx.user_id,
                json!({
                    "required": required,
                    "effective": ctx.effective_sorted(),
                }),
                meta.ip.clone(),
                meta.user_agent.clone(),
            ));
        })
    }

    /// Full decision for one request: extract, verify, resolve, compare.
    /// Denials for missing/invalid/expired tokens are not audited (there is
    /// no principal to attribute them to); permission denials are.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        required: &[&str],
        meta: &RequestMeta,
    ) -> Result<AuthContext, AuthzError> {
        let ctx = self.authenticate(headers)?;
        self.require(&ctx, required, meta)?;
        Ok(ctx)
    }
}

/// `Authorization: Bearer <token>`, checked before the session cookie. A
/// header in any other scheme is treated as absent.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
