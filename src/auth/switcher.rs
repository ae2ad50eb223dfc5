use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::auth::engine::{AuthContext, RequestMeta};
use crate::auth::permissions::ROLE_SWITCH;
use crate::auth::token::{TokenCodec, TokenError};
use crate::store::{StoreError, UserRecord, UserStore};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum RoleSwitchError {
    #[error("'{0}' is not a recognized role")]
    InvalidRole(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("unknown principal {0}")]
    UnknownPrincipal(Uuid),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful switch: the updated principal and a replacement
/// token reflecting the new active role.
#[derive(Debug)]
pub struct RoleSwitch {
    pub user: UserRecord,
    pub token: String,
}

/// Validates and performs active-role changes. A switch never grants a role:
/// the target must already be in the principal's granted set as persisted,
/// for every caller including ADMIN.
pub struct RoleSwitcher {
    codec: TokenCodec,
    store: Arc<dyn UserStore>,
    sink: Arc<dyn AuditSink>,
}

impl RoleSwitcher {
    pub fn new(codec: TokenCodec, store: Arc<dyn UserStore>, sink: Arc<dyn AuditSink>) -> Self {
        Self { codec, store, sink }
    }

    pub async fn switch(
        &self,
        ctx: &AuthContext,
        target: &str,
        meta: &RequestMeta,
    ) -> Result<RoleSwitch, RoleSwitchError> {
        let target_role =
            Role::parse(target).ok_or_else(|| RoleSwitchError::InvalidRole(target.to_string()))?;

        // Switching is itself a privileged capability.
        if !(ctx.has_permission(ROLE_SWITCH) || ctx.is_admin()) {
            tracing::warn!(user = %ctx.user_id, target = %target_role, "unauthorized role switch");
            self.sink.record(AuditRecord::new(
                AuditAction::UnauthorizedRoleSwitch,
                ctx.user_id,
                json!({
                    "target": target_role,
                    "activeRole": ctx.active_role,
                }),
                meta.ip.clone(),
                meta.user_agent.clone(),
            ));
            return Err(RoleSwitchError::Forbidden(
                "You are not allowed to switch roles".to_string(),
            ));
        }

        // Membership is checked against the stored record, not the token
        // claims: a role revoked since the token was minted stays revoked.
        let record = self
            .store
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(RoleSwitchError::UnknownPrincipal(ctx.user_id))?;

        if !record.granted_roles.contains(&target_role) {
            return Err(RoleSwitchError::Forbidden(format!(
                "Role {} is not assigned to this account",
                target_role
            )));
        }

        // Switching to the role that is already active is a no-op success;
        // reissuing the token is harmless.
        if record.active_role == target_role {
            let token = self.codec.issue(&record)?;
            return Ok(RoleSwitch { user: record, token });
        }

        let previous = record.active_role;
        let updated = self.store.set_active_role(record.id, target_role).await?;
        let token = self.codec.issue(&updated)?;

        tracing::info!(user = %updated.id, from = %previous, to = %target_role, "role switched");
        self.sink.record(AuditRecord::new(
            AuditAction::RoleSwitch,
            updated.id,
            json!({
                "from": previous,
                "to": target_role,
            }),
            meta.ip.clone(),
            meta.user_agent.clone(),
        ));

        Ok(RoleSwitch { user: updated, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::auth::engine::AuthzEngine;
    use crate::auth::permissions::PermissionTable;
    use crate::store::InMemoryUserStore;
    use crate::types::SophisticationLevel;
    use axum::http::{header, HeaderMap, HeaderValue};

    struct Fixture {
        switcher: RoleSwitcher,
        engine: AuthzEngine,
        store: Arc<InMemoryUserStore>,
        sink: Arc<MemoryAuditSink>,
    }

    fn fixture() -> Fixture {
        let codec =
            TokenCodec::new("unit-test-secret", "bazaar-platform", "bazaar-clients", 7).unwrap();
        let store = Arc::new(InMemoryUserStore::new());
        let sink = Arc::new(MemoryAuditSink::new());

        Fixture {
            switcher: RoleSwitcher::new(
                codec.clone(),
                store.clone() as Arc<dyn UserStore>,
                sink.clone() as Arc<dyn AuditSink>,
            ),
            engine: AuthzEngine::new(
                codec,
                Arc::new(PermissionTable::builtin()),
                sink.clone() as Arc<dyn AuditSink>,
            ),
            store,
            sink,
        }
    }

    fn meta() -> RequestMeta {
        RequestMeta { ip: "127.0.0.1".into(), user_agent: "unit-test".into() }
    }

    /// Resolve an AuthContext the way a request would: mint and verify.
    fn ctx_for(fx: &Fixture, user: &UserRecord) -> AuthContext {
        let token = fx.engine.codec().issue(user).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        fx.engine.authenticate(&headers).unwrap()
    }

    fn seed_seller(fx: &Fixture) -> UserRecord {
        fx.store.insert(UserRecord::new(
            "seller@example.com",
            "Sam",
            "pw",
            SophisticationLevel::Sophisticated,
            vec![Role::Customer, Role::Seller],
            Role::Customer,
        ))
    }

    #[tokio::test]
    async fn switch_to_granted_role_succeeds_and_audits() {
        let fx = fixture();
        let seller = seed_seller(&fx);
        let ctx = ctx_for(&fx, &seller);

        let outcome = fx.switcher.switch(&ctx, "SELLER", &meta()).await.unwrap();
        assert_eq!(outcome.user.active_role, Role::Seller);
        assert_eq!(outcome.user.granted_roles, seller.granted_roles);

        // The replacement token reflects the new active role.
        let claims = fx.engine.codec().verify(&outcome.token).unwrap();
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.roles, seller.granted_roles);

        // Persisted too, not just in the token.
        let stored = fx.store.find_by_id(seller.id).await.unwrap().unwrap();
        assert_eq!(stored.active_role, Role::Seller);

        let records = fx.sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::RoleSwitch);
        assert_eq!(records[0].detail["from"], "CUSTOMER");
        assert_eq!(records[0].detail["to"], "SELLER");
    }

    #[tokio::test]
    async fn switch_without_capability_is_forbidden_and_audited() {
        let fx = fixture();
        let shopper = fx.store.insert(UserRecord::new(
            "shopper@example.com",
            "Casey",
            "pw",
            SophisticationLevel::Unsophisticated,
            vec![Role::Customer],
            Role::Customer,
        ));
        let ctx = ctx_for(&fx, &shopper);

        let err = fx.switcher.switch(&ctx, "ADMIN", &meta()).await.unwrap_err();
        assert!(matches!(err, RoleSwitchError::Forbidden(_)));

        let records = fx.sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::UnauthorizedRoleSwitch);
        assert_eq!(records[0].actor, shopper.id);
    }

    #[tokio::test]
    async fn unrecognized_target_is_invalid_role() {
        let fx = fixture();
        let seller = seed_seller(&fx);
        let ctx = ctx_for(&fx, &seller);

        let err = fx.switcher.switch(&ctx, "SUPERVISOR", &meta()).await.unwrap_err();
        assert!(matches!(err, RoleSwitchError::InvalidRole(_)));
        assert!(fx.sink.is_empty());
    }

    #[tokio::test]
    async fn membership_is_enforced_even_for_admin() {
        let fx = fixture();
        let admin = fx.store.insert(UserRecord::new(
            "admin@example.com",
            "Ada",
            "pw",
            SophisticationLevel::Sophisticated,
            vec![Role::Customer, Role::Admin],
            Role::Admin,
        ));
        let ctx = ctx_for(&fx, &admin);

        let err = fx.switcher.switch(&ctx, "SELLER", &meta()).await.unwrap_err();
        assert!(matches!(err, RoleSwitchError::Forbidden(_)));

        let stored = fx.store.find_by_id(admin.id).await.unwrap().unwrap();
        assert_eq!(stored.active_role, Role::Admin);
    }

    #[tokio::test]
    async fn membership_uses_the_stored_record_not_the_claims() {
        let fx = fixture();
        let seller = seed_seller(&fx);

        // A token minted before SELLER was revoked still claims it.
        let mut stale = seller.clone();
        stale.granted_roles = vec![Role::Customer, Role::Seller];
        fx.store.insert({
            let mut trimmed = seller.clone();
            trimmed.granted_roles = vec![Role::Customer];
            trimmed
        });

        let ctx = ctx_for(&fx, &stale);
        let err = fx.switcher.switch(&ctx, "SELLER", &meta()).await.unwrap_err();
        assert!(matches!(err, RoleSwitchError::Forbidden(_)));
    }

    #[tokio::test]
    async fn switching_to_the_active_role_is_a_noop_success() {
        let fx = fixture();
        let seller = seed_seller(&fx);
        let ctx = ctx_for(&fx, &seller);

        let outcome = fx.switcher.switch(&ctx, "CUSTOMER", &meta()).await.unwrap();
        assert_eq!(outcome.user.active_role, Role::Customer);

        let claims = fx.engine.codec().verify(&outcome.token).unwrap();
        assert_eq!(claims.role, Role::Customer);

        // No state change, no audit entry.
        assert!(fx.sink.is_empty());
        let stored = fx.store.find_by_id(seller.id).await.unwrap().unwrap();
        assert_eq!(stored.active_role, Role::Customer);
    }
}
