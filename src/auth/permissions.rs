use std::collections::{HashMap, HashSet};

use crate::types::{Role, SophisticationLevel};

/// Satisfies every permission check. Only ever appears in an effective set,
/// never as a required input.
pub const WILDCARD: &str = "*";

/// Permission gating the role-switch operation.
pub const ROLE_SWITCH: &str = "role:switch";

/// The one place the admin escalation special case is written: a
/// sophisticated ADMIN holds the wildcard, nobody else does.
pub fn grants_wildcard(level: SophisticationLevel, role: Role) -> bool {
    level == SophisticationLevel::Sophisticated && role == Role::Admin
}

/// Static mapping from (sophistication level, role) to permission strings.
/// Constructed once at startup and shared read-only; lookups for unmapped
/// combinations resolve to the empty set rather than failing.
pub struct PermissionTable {
    entries: HashMap<(SophisticationLevel, Role), HashSet<String>>,
    empty: HashSet<String>,
}

impl PermissionTable {
    pub fn new(entries: HashMap<(SophisticationLevel, Role), HashSet<String>>) -> Self {
        Self { entries, empty: HashSet::new() }
    }

    /// The production mapping.
    pub fn builtin() -> Self {
        use Role::*;
        use SophisticationLevel::*;

        let mut entries = HashMap::new();
        entries.insert(
            (Unsophisticated, Customer),
            set(&["cart:read", "cart:update", "order:read", "order:create", "profile:read", "profile:update"]),
        );
        entries.insert(
            (Sophisticated, Customer),
            set(&["cart:read", "cart:update", "order:read", "order:create", "profile:read", "profile:update", ROLE_SWITCH]),
        );
        entries.insert(
            (Unsophisticated, Seller),
            set(&["seller:read", "listing:read", "order:read", "profile:read", "profile:update"]),
        );
        entries.insert(
            (Sophisticated, Seller),
            set(&["seller:read", "seller:write", "listing:read", "listing:write", "order:read", "profile:read", "profile:update", ROLE_SWITCH]),
        );
        entries.insert(
            (Unsophisticated, Admin),
            set(&["admin:read", "profile:read", ROLE_SWITCH]),
        );
        // The sophisticated ADMIN entry lists its explicit grants; the
        // wildcard itself is attached by the engine via grants_wildcard.
        entries.insert(
            (Sophisticated, Admin),
            set(&["admin:read", "admin:write", ROLE_SWITCH]),
        );

        Self::new(entries)
    }

    /// Pure lookup. Unknown pairs mean "no permissions", not an error.
    pub fn permissions_for(&self, level: SophisticationLevel, role: Role) -> &HashSet<String> {
        self.entries.get(&(level, role)).unwrap_or(&self.empty)
    }
}

fn set(perms: &[&str]) -> HashSet<String> {
    perms.iter().map(|p| p.to_string()).collect()
}
