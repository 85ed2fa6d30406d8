//! Ops-log entries and their persistence.
//!
//! This module provides:
//! - `OpsLogEntry`: the in-memory entry identity appliers write into
//! - `OpsLogRecord`: its persisted form (binary frame or JSON line)
//! - `OpsLogTrail`: append-only in-memory store of binary records
//! - `emit`: structured tracing output for an entry
//!
//! Scope is attached to an entry as the transient view and converted to the
//! persisted view when the entry becomes a record.

mod emit;
mod entry;
mod trail;

pub use emit::{emit, emit_and_record, OPS_LOG_TARGET};
pub use entry::{OpsLogEntry, OpsLogRecord, OPS_LOG_RECORD_VERSION};
pub use trail::{decode_records, OpsLogTrail};
