//! Ops-log entry and its persisted record form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::binary::{Decode, Decoder, Encode, Encoder};
use crate::error::DecodeError;
use crate::identity::IdentityType;
use crate::scope::{KeystoneScope, ScopeInfo};

/// Current version of the ops-log record frame.
pub const OPS_LOG_RECORD_VERSION: u8 = 1;

/// One ops-log entry, as populated during request processing.
///
/// Identity appliers fill in the fields they own through
/// [`IdentityApplier::write_ops_log_entry`](crate::IdentityApplier::write_ops_log_entry).
/// The scope field has exactly one writer, the scope-logging decorator.
///
/// # Example
///
/// ```
/// use scope_audit::audit::OpsLogEntry;
///
/// let entry = OpsLogEntry::new("tx-0001", "get_obj")
///     .with_bucket("photos")
///     .with_object("cat.jpg")
///     .with_http_status(200);
///
/// assert_eq!(entry.request_id(), "tx-0001");
/// assert!(entry.keystone_scope().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpsLogEntry {
    request_id: String,
    op: String,
    bucket: String,
    object: String,
    uri: String,
    http_status: u16,
    bytes_sent: u64,
    user: String,
    identity_type: IdentityType,
    keystone_scope: Option<KeystoneScope>,
}

impl OpsLogEntry {
    /// Creates an entry for `op` within request `request_id`.
    pub fn new(request_id: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            op: op.into(),
            ..Default::default()
        }
    }

    /// Sets the bucket name.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Sets the object key.
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = object.into();
        self
    }

    /// Sets the request URI (without query string).
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Sets the HTTP status returned to the client.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }

    /// Sets the number of body bytes sent.
    pub fn with_bytes_sent(mut self, bytes: u64) -> Self {
        self.bytes_sent = bytes;
        self
    }

    /// Sets the requesting user's canonical id.
    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    /// Sets the identity type of the requester.
    pub fn set_identity_type(&mut self, identity_type: IdentityType) {
        self.identity_type = identity_type;
    }

    /// Attaches the request's scope, replacing any previous one.
    pub fn set_keystone_scope(&mut self, scope: KeystoneScope) {
        self.keystone_scope = Some(scope);
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the operation name.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the object key.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the HTTP status.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Returns the number of body bytes sent.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Returns the requesting user's canonical id.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the identity type.
    pub fn identity_type(&self) -> IdentityType {
        self.identity_type
    }

    /// Returns the attached scope, if any.
    pub fn keystone_scope(&self) -> Option<&KeystoneScope> {
        self.keystone_scope.as_ref()
    }

    /// Converts the entry into its persisted form.
    pub fn to_record(&self) -> OpsLogRecord {
        OpsLogRecord {
            request_id: self.request_id.clone(),
            op: self.op.clone(),
            bucket: self.bucket.clone(),
            object: self.object.clone(),
            uri: self.uri.clone(),
            http_status: self.http_status,
            bytes_sent: self.bytes_sent,
            user: self.user.clone(),
            identity_type: self.identity_type,
            keystone_scope: self.keystone_scope.clone().map(ScopeInfo::from),
        }
    }
}

/// Persisted ops-log record, as stored and as sent to text sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpsLogRecord {
    /// Request id
    pub request_id: String,
    /// Operation name
    pub op: String,
    /// Bucket name
    #[serde(default)]
    pub bucket: String,
    /// Object key
    #[serde(default)]
    pub object: String,
    /// Request URI
    #[serde(default)]
    pub uri: String,
    /// HTTP status
    #[serde(default)]
    pub http_status: u16,
    /// Body bytes sent
    #[serde(default)]
    pub bytes_sent: u64,
    /// Requesting user's canonical id
    #[serde(default)]
    pub user: String,
    /// Identity type of the requester
    #[serde(default)]
    pub identity_type: IdentityType,
    /// Scope, absent when capture was disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystone_scope: Option<ScopeInfo>,
}

impl Encode for OpsLogRecord {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(OPS_LOG_RECORD_VERSION, 1, |enc| {
            enc.put_str(&self.request_id);
            enc.put_str(&self.op);
            enc.put_str(&self.bucket);
            enc.put_str(&self.object);
            enc.put_str(&self.uri);
            enc.put_u16(self.http_status);
            enc.put_u64(self.bytes_sent);
            enc.put_str(&self.user);
            enc.put_u8(self.identity_type.as_u8());
            enc.put_optional(self.keystone_scope.as_ref());
        });
    }
}

impl Decode for OpsLogRecord {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.strict_frame(OPS_LOG_RECORD_VERSION, |dec, _| {
            Ok(OpsLogRecord {
                request_id: dec.get_str()?,
                op: dec.get_str()?,
                bucket: dec.get_str()?,
                object: dec.get_str()?,
                uri: dec.get_str()?,
                http_status: dec.get_u16()?,
                bytes_sent: dec.get_u64()?,
                user: dec.get_str()?,
                identity_type: IdentityType::from_u8(dec.get_u8()?)?,
                keystone_scope: dec.get_optional()?,
            })
        })
    }
}

impl OpsLogRecord {
    /// Encodes the record in the binary framing.
    pub fn to_binary(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }

    /// Decodes exactly one record from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] on version mismatch, truncation or malformed input.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut dec = Decoder::new(bytes);
        let record = OpsLogRecord::decode(&mut dec)?;
        dec.finish()?;
        Ok(record)
    }

    /// Renders the record as one JSON line for a text sink.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error. Records hold only strings, integers
    /// and bools, so this does not fail in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] for invalid JSON and
    /// [`DecodeError::Malformed`] for a missing `request_id`/`op` or an
    /// invalid scope block.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let mut value: Value = serde_json::from_str(text)?;

        let keystone_scope = match value.as_object_mut() {
            Some(object) => object.remove("keystone_scope"),
            None => return Err(DecodeError::malformed("ops-log record is not an object")),
        };
        let keystone_scope = keystone_scope.map(ScopeInfo::from_json_value).transpose()?;

        let mut record: OpsLogRecord =
            serde_json::from_value(value).map_err(|e| DecodeError::malformed(e.to_string()))?;
        record.keystone_scope = keystone_scope;
        Ok(record)
    }
}
