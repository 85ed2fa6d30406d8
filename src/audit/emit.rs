//! Emits ops-log entries through tracing.
//!
//! Only identifiers and counts are attached to the tracing event. Names,
//! even when the redaction policy allows them, stay in the persisted record.

use super::{OpsLogEntry, OpsLogTrail};

/// Tracing target used for ops-log events.
pub const OPS_LOG_TARGET: &str = "ops_log";

/// Emits `entry` as a structured tracing event.
///
/// # Example
///
/// ```
/// use scope_audit::audit::{emit, OpsLogEntry};
///
/// emit(&OpsLogEntry::new("tx-1", "get_obj").with_http_status(200));
/// ```
pub fn emit(entry: &OpsLogEntry) {
    let scope = entry.keystone_scope();

    tracing::info!(
        target: OPS_LOG_TARGET,
        request_id = %entry.request_id(),
        op = %entry.op(),
        bucket = %entry.bucket(),
        http_status = entry.http_status(),
        identity_type = %entry.identity_type(),
        project_id = ?scope.map(|s| s.project.id.as_str()),
        user_id = ?scope.map(|s| s.user.id.as_str()),
        roles = scope.map_or(0, |s| s.roles.len()),
        app_cred = scope.is_some_and(|s| s.app_cred.is_some()),
        "ops log entry"
    );
}

/// Emits `entry` and appends it to `trail`, returning its position.
pub fn emit_and_record(entry: &OpsLogEntry, trail: &OpsLogTrail) -> usize {
    emit(entry);
    trail.append(entry)
}
