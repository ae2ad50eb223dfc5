// Append-only audit trail of authorization decisions of interest: permission
// denials, role switches, and unauthorized role-switch attempts.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UnauthorizedAccess,
    UnauthorizedRoleSwitch,
    RoleSwitch,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            AuditAction::UnauthorizedRoleSwitch => "UNAUTHORIZED_ROLE_SWITCH",
            AuditAction::RoleSwitch => "ROLE_SWITCH",
        }
    }
}

/// One trail entry. Records are immutable once appended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    /// The principal that performed (or attempted) the action.
    pub actor: Uuid,
    pub target: Option<Uuid>,
    /// Free-form payload: required/effective permission sets, from/to roles.
    pub detail: Value,
    pub ip: String,
    pub user_agent: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        actor: Uuid,
        detail: Value,
        ip: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            actor,
            target: None,
            detail,
            ip: ip.into(),
            user_agent: user_agent.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_target(mut self, target: Uuid) -> Self {
        self.target = Some(target);
        self
    }
}

/// Fire-and-forget append. Implementations must never propagate a write
/// failure to the triggering request: log it and move on.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Process-local trail backed by a mutex-guarded vector. This is the sink the
/// service runs with; a database-backed sink sits behind the same trait in
/// the persistence layer.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the trail, oldest first.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        tracing::debug!(
            action = record.action.as_str(),
            actor = %record.actor,
            "audit: {}",
            record.action.as_str()
        );
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(record);
    }
}

/// Emits each record as a structured tracing event, for deployments that ship
/// the trail through log collection instead of keeping it in-process.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        tracing::warn!(
            action = record.action.as_str(),
            actor = %record.actor,
            ip = %record.ip,
            user_agent = %record.user_agent,
            detail = %record.detail,
            "audit entry"
        );
    }
}
