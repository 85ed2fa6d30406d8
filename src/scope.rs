//! Scope model: the redaction-applied subset of a token's claims.
//!
//! There are two views of the same logical scope:
//!
//! - [`KeystoneScope`], the transient view attached to a single ops-log
//!   entry. Its user block is always structurally present; redacted or
//!   unknown values are empty strings.
//! - [`ScopeInfo`], the persisted view written to the binary store and the
//!   JSON sink. Its user and application-credential blocks are optional and
//!   absence is encoded explicitly.
//!
//! IDs are never redacted. A name is the empty string iff it was redacted
//! (or the token carried an empty name).

use serde::{Deserialize, Serialize};

/// Domain a project or user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain identifier
    #[serde(default)]
    pub id: String,
    /// Domain name, empty if redacted
    #[serde(default)]
    pub name: String,
}

impl Domain {
    /// Creates a domain from an id and a (possibly empty) name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Project (tenant) scope. Always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier, never empty in a well-formed record
    pub id: String,
    /// Project name, empty if redacted
    #[serde(default)]
    pub name: String,
    /// Owning domain
    #[serde(default)]
    pub domain: Domain,
}

/// User scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// User name, empty if redacted
    #[serde(default)]
    pub name: String,
    /// Owning domain
    #[serde(default)]
    pub domain: Domain,
}

/// Application credential used to authenticate, if any.
///
/// `restricted` is not subject to redaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCredential {
    /// Credential identifier
    pub id: String,
    /// Credential name, empty if redacted
    #[serde(default)]
    pub name: String,
    /// Whether the credential is restricted
    #[serde(default)]
    pub restricted: bool,
}

/// Transient scope attached to one ops-log entry.
///
/// Built once per request by the logging decorator and never mutated
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeystoneScope {
    /// Project scope
    pub project: Project,
    /// User scope; empty strings when the token carried no user
    pub user: User,
    /// Role names in token order; empty when excluded
    pub roles: Vec<String>,
    /// Present iff the token came from an application credential
    pub app_cred: Option<ApplicationCredential>,
}

/// Persisted scope record.
///
/// # Example
///
/// ```
/// use scope_audit::{Project, ScopeInfo};
///
/// let info = ScopeInfo::new(Project {
///     id: "p1".to_string(),
///     ..Default::default()
/// });
/// assert!(info.user.is_none());
/// assert!(info.roles.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeInfo {
    /// Project scope
    pub project: Project,
    /// User scope, absent when the request has no user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Role names in token order; always present, possibly empty
    #[serde(default)]
    pub roles: Vec<String>,
    /// Present iff the token came from an application credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_cred: Option<ApplicationCredential>,
}

impl ScopeInfo {
    /// Creates a record with only the project scope set.
    pub fn new(project: Project) -> Self {
        Self {
            project,
            user: None,
            roles: Vec::new(),
            app_cred: None,
        }
    }
}

impl From<KeystoneScope> for ScopeInfo {
    /// Persists a transient scope. The user block is dropped when the
    /// transient view carries no user id.
    fn from(scope: KeystoneScope) -> Self {
        let user = if scope.user.id.is_empty() {
            None
        } else {
            Some(scope.user)
        };

        Self {
            project: scope.project,
            user,
            roles: scope.roles,
            app_cred: scope.app_cred,
        }
    }
}
