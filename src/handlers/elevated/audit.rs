// Administrative inspection of the audit trail.

use axum::extract::State;
use axum::Extension;

use crate::audit::AuditRecord;
use crate::auth::{AuthContext, RequestMeta};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/admin/audit - The authorization audit trail, oldest first
pub async fn index(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
) -> ApiResult<Vec<AuditRecord>> {
    state.engine.require(&ctx, &["admin:read"], &meta)?;
    Ok(ApiResponse::success(state.audit_log.snapshot()))
}
