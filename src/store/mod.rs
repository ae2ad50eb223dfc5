// User-record store consumed by the authorization core.
//
// The platform keeps principals in its document database; this service only
// needs lookup, credential verification and active-role persistence, so those
// are expressed as a trait with an in-memory implementation. A database-backed
// implementation lives with the rest of the persistence layer.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Role, SophisticationLevel};

/// A stored principal: the authenticated actor the authorization core
/// resolves permissions for.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub level: SophisticationLevel,
    /// Every role ever assigned; never empty, never shrunk by this service.
    pub granted_roles: Vec<Role>,
    /// Current default for permission resolution and UI context.
    /// Always a member of `granted_roles`.
    pub active_role: Role,
    pub created_at: DateTime<Utc>,
    password_salt: String,
    password_digest: String,
}

impl UserRecord {
    /// Build a record, normalizing the role invariants: granted roles are
    /// deduplicated and never empty (CUSTOMER by default), and the active
    /// role is always granted.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password: &str,
        level: SophisticationLevel,
        granted_roles: Vec<Role>,
        active_role: Role,
    ) -> Self {
        let mut granted = granted_roles;
        granted.dedup();
        if granted.is_empty() {
            granted.push(Role::Customer);
        }
        if !granted.contains(&active_role) {
            granted.push(active_role);
        }

        let salt = Uuid::new_v4().to_string();
        let digest = digest_password(&salt, password);

        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            level,
            granted_roles: granted,
            active_role,
            created_at: Utc::now(),
            password_salt: salt,
            password_digest: digest,
        }
    }

    pub fn password_matches(&self, password: &str) -> bool {
        digest_password(&self.password_salt, password) == self.password_digest
    }

    /// Client-facing projection, credential material excluded.
    pub fn view(&self) -> PrincipalView {
        PrincipalView {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.active_role,
            roles: self.granted_roles.clone(),
            intelligence_level: self.level,
        }
    }
}

/// Serializable principal shape returned by session endpoints. Field names
/// follow the token wire contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub roles: Vec<Role>,
    pub intelligence_level: SophisticationLevel,
}

/// Registration input. New principals always start as an unsophisticated
/// CUSTOMER; other roles and tiers come from privileged workflows elsewhere.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an account already exists for {0}")]
    DuplicateEmail(String),
    #[error("unknown user {0}")]
    UnknownUser(Uuid),
    #[error("role {0} is not granted to this user")]
    RoleNotGranted(Role),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup/update capability the authorization core consumes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Credential check for login. Returns `None` for unknown email or wrong
    /// password; callers should not distinguish the two.
    async fn verify_login(&self, email: &str, password: &str)
        -> Result<Option<UserRecord>, StoreError>;

    /// Persist a new active role. Never grants: fails with `RoleNotGranted`
    /// if the role is not already in the granted set, keeping the
    /// active-role invariant even under racing writers.
    async fn set_active_role(&self, id: Uuid, role: Role) -> Result<UserRecord, StoreError>;
}

/// Process-local store keyed by principal id. Writes take the lock for the
/// whole update, so concurrent role switches for one principal serialize
/// with last-writer-wins.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, e.g. seeded or test principals.
    pub fn insert(&self, record: UserRecord) -> UserRecord {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(record.id, record.clone());
        record
    }

    /// Seed the demo principals used in development and by the integration
    /// tests: one per role shape the platform cares about.
    pub fn seed_demo_users(&self) {
        self.insert(UserRecord::new(
            "admin@bazaar.dev",
            "Ada Admin",
            "admin-dev-password",
            SophisticationLevel::Sophisticated,
            vec![Role::Customer, Role::Admin],
            Role::Admin,
        ));
        self.insert(UserRecord::new(
            "seller@bazaar.dev",
            "Sam Seller",
            "seller-dev-password",
            SophisticationLevel::Sophisticated,
            vec![Role::Customer, Role::Seller],
            Role::Customer,
        ));
        self.insert(UserRecord::new(
            "shopper@bazaar.dev",
            "Casey Shopper",
            "shopper-dev-password",
            SophisticationLevel::Unsophisticated,
            vec![Role::Customer],
            Role::Customer,
        ));
        tracing::info!("seeded 3 demo principals into the in-memory user store");
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(StoreError::DuplicateEmail(new_user.email));
        }

        let record = UserRecord::new(
            new_user.email,
            new_user.name,
            &new_user.password,
            SophisticationLevel::Unsophisticated,
            vec![Role::Customer],
            Role::Customer,
        );
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn verify_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password_matches(password))
            .cloned())
    }

    async fn set_active_role(&self, id: Uuid, role: Role) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let record = users.get_mut(&id).ok_or(StoreError::UnknownUser(id))?;
        if !record.granted_roles.contains(&role) {
            return Err(StoreError::RoleNotGranted(role));
        }
        record.active_role = role;
        Ok(record.clone())
    }
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
