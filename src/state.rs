use std::sync::Arc;

use crate::audit::{AuditSink, MemoryAuditSink};
use crate::auth::{AuthzEngine, PermissionTable, RoleSwitcher, TokenCodec, TokenError};
use crate::config::AppConfig;
use crate::store::{InMemoryUserStore, UserStore};

/// Shared application state: the authorization engine, the role-switch
/// coordinator, and the collaborators they consume. The permission table is
/// built once here and injected; nothing mutates it afterwards.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuthzEngine>,
    pub switcher: Arc<RoleSwitcher>,
    pub store: Arc<dyn UserStore>,
    pub audit_log: Arc<MemoryAuditSink>,
}

impl AppState {
    /// Wire the core together. Fails only when the signing secret is
    /// unset, which is fatal at startup.
    pub fn from_config(config: &AppConfig) -> Result<Self, TokenError> {
        let codec = TokenCodec::from_config(&config.security)?;
        let table = Arc::new(PermissionTable::builtin());
        let audit_log = Arc::new(MemoryAuditSink::new());
        let users = Arc::new(InMemoryUserStore::new());

        if config.api.seed_demo_users {
            users.seed_demo_users();
        }

        let sink = audit_log.clone() as Arc<dyn AuditSink>;
        let store = users as Arc<dyn UserStore>;

        Ok(Self {
            engine: Arc::new(AuthzEngine::new(codec.clone(), table, sink.clone())),
            switcher: Arc::new(RoleSwitcher::new(codec, store.clone(), sink)),
            store,
            audit_log,
        })
    }
}
