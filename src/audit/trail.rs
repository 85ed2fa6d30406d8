//! Append-only in-memory ops-log store.

use parking_lot::Mutex;

use super::{OpsLogEntry, OpsLogRecord};
use crate::codec::binary::{Decode, Decoder};
use crate::error::DecodeError;

/// Append-only store of binary ops-log records.
///
/// Records are appended back to back into one byte buffer; the frame
/// envelope makes each record self-delimiting, so the buffer can be replayed
/// from the start without a separate index.
///
/// # Example
///
/// ```
/// use scope_audit::audit::{OpsLogEntry, OpsLogTrail};
///
/// let trail = OpsLogTrail::new();
/// trail.append(&OpsLogEntry::new("tx-1", "get_obj"));
/// trail.append(&OpsLogEntry::new("tx-2", "put_obj"));
///
/// let records = trail.decode_all().unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].op, "put_obj");
/// ```
#[derive(Debug, Default)]
pub struct OpsLogTrail {
    inner: Mutex<TrailState>,
}

#[derive(Debug, Default)]
struct TrailState {
    bytes: Vec<u8>,
    count: usize,
}

impl OpsLogTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists `entry` and returns its position in the trail.
    pub fn append(&self, entry: &OpsLogEntry) -> usize {
        self.append_record(&entry.to_record())
    }

    /// Appends an already converted record and returns its position.
    pub fn append_record(&self, record: &OpsLogRecord) -> usize {
        let encoded = record.to_binary();
        let mut state = self.inner.lock();
        state.bytes.extend_from_slice(&encoded);
        state.count += 1;
        state.count - 1
    }

    /// Returns the number of records appended.
    pub fn len(&self) -> usize {
        self.inner.lock().count
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the raw log bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }

    /// Replays every record in append order.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] encountered.
    pub fn decode_all(&self) -> Result<Vec<OpsLogRecord>, DecodeError> {
        let bytes = self.to_bytes();
        decode_records(&bytes)
    }
}

/// Decodes a buffer of back-to-back ops-log records.
///
/// # Errors
///
/// Fails on the first record that does not decode; nothing is returned for
/// the records before it.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<OpsLogRecord>, DecodeError> {
    let mut dec = Decoder::new(bytes);
    let mut records = Vec::new();
    while !dec.is_empty() {
        records.push(OpsLogRecord::decode(&mut dec)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::KeystoneScope;

    #[test]
    fn trail_starts_empty() {
        let trail = OpsLogTrail::new();

        assert!(trail.is_empty());
        assert_eq!(trail.len(), 0);
        assert!(trail.decode_all().unwrap().is_empty());
    }

    #[test]
    fn append_returns_positions_in_order() {
        let trail = OpsLogTrail::new();

        assert_eq!(trail.append(&OpsLogEntry::new("tx-1", "get_obj")), 0);
        assert_eq!(trail.append(&OpsLogEntry::new("tx-2", "put_obj")), 1);
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn replay_preserves_order_and_scope() {
        let trail = OpsLogTrail::new();
        let mut with_scope = OpsLogEntry::new("tx-2", "put_obj");
        let mut scope = KeystoneScope::default();
        scope.project.id = "p1".to_string();
        with_scope.set_keystone_scope(scope);

        trail.append(&OpsLogEntry::new("tx-1", "get_obj"));
        trail.append(&with_scope);

        let records = trail.decode_all().unwrap();
        assert_eq!(records[0].request_id, "tx-1");
        assert!(records[0].keystone_scope.is_none());
        assert_eq!(
            records[1].keystone_scope.as_ref().map(|s| s.project.id.as_str()),
            Some("p1")
        );
    }

    #[test]
    fn truncated_tail_fails_replay() {
        let trail = OpsLogTrail::new();
        trail.append(&OpsLogEntry::new("tx-1", "get_obj"));
        trail.append(&OpsLogEntry::new("tx-2", "get_obj"));

        let bytes = trail.to_bytes();
        let result = decode_records(&bytes[..bytes.len() - 3]);

        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }
}
