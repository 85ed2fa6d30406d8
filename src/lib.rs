//! Privacy-aware identity scope capture for ops logging.
//!
//! Given a validated token from an external identity provider, this crate
//! produces a redaction-controlled record of who acted, as what project,
//! user and role, and via what kind of credential. The record can be
//! appended to a durable audit log in a compact binary framing or rendered
//! as JSON for a streaming sink.
//!
//! # Core Types
//!
//! - [`Token`]: validated token, moved into the decorator serving a request
//! - [`RedactionPolicy`]: decides which names and roles are disclosed
//! - [`KeystoneScope`] / [`ScopeInfo`]: transient and persisted scope views
//! - [`ScopeLoggingApplier`]: identity decorator that attaches the scope to
//!   ops-log entries
//! - [`ScopeConfig`]: process-wide, runtime-togglable switches
//!
//! # Examples
//!
//! ```
//! use scope_audit::{build_scope, Token, TokenProject, TokenRole, TokenUser};
//!
//! let token = Token::new("opaque", TokenProject {
//!     id: "p1".to_string(),
//!     name: "Proj".to_string(),
//!     ..Default::default()
//! })
//! .with_user(TokenUser { id: "u1".to_string(), name: "Alice".to_string(), ..Default::default() })
//! .with_role(TokenRole { id: "r1".to_string(), name: "admin".to_string() });
//!
//! // Names redacted, roles disclosed
//! let scope = build_scope(&token, false, true);
//! assert_eq!(scope.user.as_ref().unwrap().id, "u1");
//! assert_eq!(scope.user.as_ref().unwrap().name, "");
//! assert_eq!(scope.roles, vec!["admin".to_string()]);
//!
//! let bytes = scope.to_binary();
//! assert_eq!(scope_audit::ScopeInfo::from_binary(&bytes).unwrap(), scope);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod codec;
mod config;
mod decorator;
mod error;
mod identity;
mod policy;
mod scope;
mod secret;
mod token;

pub use config::{ScopeConfig, ScopeLogSettings};
pub use decorator::ScopeLoggingApplier;
pub use error::{ConfigError, DecodeError};
pub use identity::{
    AccountInfo, AclOwner, AclSpec, AuthInfo, IdentityApplier, IdentityType, Owner, Principal,
    RemoteApplier, RequestState, UserInfo, ACL_ALL_USERS, PERM_FULL_CONTROL, PERM_READ,
    PERM_READ_ACP, PERM_WRITE, PERM_WRITE_ACP,
};
pub use policy::{build_scope, build_scope_info, RedactionPolicy};
pub use scope::{ApplicationCredential, Domain, KeystoneScope, Project, ScopeInfo, User};
pub use secret::Secret;
pub use token::{Token, TokenAppCred, TokenDomain, TokenProject, TokenRole, TokenUser};
