//! Structured-tree rendering for streaming and text sinks.
//!
//! The tree mirrors the scope model's field names. An optional block that
//! does not apply to the request is left out entirely, while a redacted
//! name is written as an explicit `""`:
//!
//! ```json
//! {
//!   "project": {"id": "p1", "name": "", "domain": {"id": "d1", "name": ""}},
//!   "user": {"id": "u1", "name": "", "domain": {"id": "d1", "name": ""}},
//!   "roles": ["reader"]
//! }
//! ```

use serde_json::Value;

use crate::error::DecodeError;
use crate::scope::ScopeInfo;

impl ScopeInfo {
    /// Renders the record as a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error. A scope holds only strings, bools
    /// and sequences of strings, so this does not fail in practice.
    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Renders the record as a compact JSON string.
    ///
    /// # Example
    ///
    /// ```
    /// use scope_audit::{Project, ScopeInfo};
    ///
    /// let info = ScopeInfo::new(Project { id: "p1".to_string(), ..Default::default() });
    /// let json = info.to_json().unwrap();
    /// assert!(json.contains(r#""roles":[]"#));
    /// assert!(!json.contains("user"));
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`ScopeInfo::to_json_value`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reads a record back from a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if `project.id` is missing or empty,
    /// or if a present field has the wrong shape.
    pub fn from_json_value(value: Value) -> Result<Self, DecodeError> {
        let project_id = value
            .get("project")
            .and_then(|project| project.get("id"))
            .and_then(Value::as_str);
        match project_id {
            Some(id) if !id.is_empty() => {}
            _ => return Err(DecodeError::malformed("missing required field project.id")),
        }

        serde_json::from_value(value).map_err(|e| DecodeError::malformed(e.to_string()))
    }

    /// Parses a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the text is not JSON at all, and the
    /// errors of [`ScopeInfo::from_json_value`] otherwise.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }
}
