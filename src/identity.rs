//! Identity capability interface and the values it exchanges.
//!
//! An [`IdentityApplier`] is produced by an authentication engine once a
//! request's credentials are accepted. The rest of the request pipeline asks
//! it ownership and permission questions and lets it record itself in the
//! ops log.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::OpsLogEntry;
use crate::error::DecodeError;

/// Permission bit: read.
pub const PERM_READ: u32 = 0x01;
/// Permission bit: write.
pub const PERM_WRITE: u32 = 0x02;
/// Permission bit: read the ACL.
pub const PERM_READ_ACP: u32 = 0x04;
/// Permission bit: write the ACL.
pub const PERM_WRITE_ACP: u32 = 0x08;
/// All permission bits.
pub const PERM_FULL_CONTROL: u32 = PERM_READ | PERM_WRITE | PERM_READ_ACP | PERM_WRITE_ACP;

/// Grantee key matching every authenticated user in an [`AclSpec`].
pub const ACL_ALL_USERS: &str = "*";

/// Grants keyed by canonical grantee id.
pub type AclSpec = BTreeMap<String, u32>;

/// Kind of identity behind a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    /// No identity (anonymous, or no applier)
    #[default]
    None,
    /// User stored in the local user database
    Local,
    /// User authenticated by an external identity provider
    Keystone,
    /// Assumed role
    Role,
}

impl IdentityType {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            IdentityType::None => 0,
            IdentityType::Local => 1,
            IdentityType::Keystone => 2,
            IdentityType::Role => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(IdentityType::None),
            1 => Ok(IdentityType::Local),
            2 => Ok(IdentityType::Keystone),
            3 => Ok(IdentityType::Role),
            other => Err(DecodeError::malformed(format!(
                "unknown identity type {other}"
            ))),
        }
    }
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityType::None => write!(f, "none"),
            IdentityType::Local => write!(f, "local"),
            IdentityType::Keystone => write!(f, "keystone"),
            IdentityType::Role => write!(f, "role"),
        }
    }
}

/// Owner of a bucket or object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A user within a tenant (empty tenant for the default namespace)
    User {
        /// Tenant
        tenant: String,
        /// User id
        id: String,
    },
    /// An account
    Account(String),
}

/// Owner recorded in ACLs for resources created by this identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclOwner {
    /// Canonical owner id
    pub id: String,
    /// Display name
    pub display_name: String,
}

/// A principal named in a policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Matches everyone
    Wildcard,
    /// Every user of a tenant
    Tenant(String),
    /// A single user (`id == "*"` matches every user of the tenant)
    User {
        /// Tenant
        tenant: String,
        /// User id
        id: String,
    },
    /// An account
    Account(String),
    /// An assumed role
    Role(String),
}

/// Account the identity belongs to, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    /// Account id
    pub id: String,
    /// Tenant of the account
    pub tenant: String,
    /// Account name
    pub name: String,
}

/// User record filled in by [`IdentityApplier::load_acct_info`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    /// User id
    pub user_id: String,
    /// Tenant
    pub tenant: String,
    /// Display name
    pub display_name: String,
    /// Owning account, if any
    pub account_id: Option<String>,
}

/// Per-request state an applier may adjust before the operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    /// Description of the authenticated identity
    pub auth_identity: String,
    /// Identity type of the requester
    pub identity_type: IdentityType,
    /// Tenant requests are resolved against
    pub tenant: String,
}

/// Capability surface of an authenticated identity.
///
/// Implementations answer for exactly one request. The trait is object safe
/// so decorators can wrap any implementation behind a `Box<dyn _>`.
pub trait IdentityApplier: Send + Sync {
    /// Adjusts request state before the operation executes.
    fn modify_request_state(&self, state: &mut RequestState);

    /// Returns the owner stamped on resources this identity creates.
    fn acl_owner(&self) -> AclOwner;

    /// Returns the permission bits granted to this identity by `aclspec`.
    fn perms_from_aclspec(&self, aclspec: &AclSpec) -> u32;

    /// Returns true if this identity administers `owner`'s resources.
    fn is_admin_of(&self, owner: &Owner) -> bool;

    /// Returns true if this identity is `owner`.
    fn is_owner_of(&self, owner: &Owner) -> bool;

    /// Returns the mask applied to every permission check.
    fn perm_mask(&self) -> u32;

    /// Writes a human-readable description of the identity.
    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result;

    /// Returns true if `principal` designates this identity.
    fn is_identity(&self, principal: &Principal) -> bool;

    /// Returns the identity type.
    fn identity_type(&self) -> IdentityType;

    /// Returns the account name.
    fn account_name(&self) -> String;

    /// Returns the subuser, empty if none.
    fn subuser(&self) -> String;

    /// Returns the tenant.
    fn tenant(&self) -> &str;

    /// Returns the account, if the identity belongs to one.
    fn account(&self) -> &Option<AccountInfo>;

    /// Fills `user_info` with this identity's user record.
    fn load_acct_info(&self, user_info: &mut UserInfo);

    /// Records identity-owned fields on an ops-log entry.
    fn write_ops_log_entry(&self, _entry: &mut OpsLogEntry) {}
}

/// Authentication result handed to a [`RemoteApplier`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    /// Tenant (project id for externally authenticated users)
    pub tenant: String,
    /// User id
    pub user_id: String,
    /// Display name
    pub display_name: String,
    /// Subuser, empty if none
    pub subuser: String,
    /// Permission mask
    pub perm_mask: u32,
    /// Whether the user holds an operator role
    pub is_admin: bool,
}

/// Identity authenticated by an external identity provider.
///
/// # Example
///
/// ```
/// use scope_audit::{AuthInfo, IdentityApplier, Owner, RemoteApplier, PERM_FULL_CONTROL};
///
/// let applier = RemoteApplier::new(AuthInfo {
///     tenant: "p1".to_string(),
///     user_id: "u1".to_string(),
///     perm_mask: PERM_FULL_CONTROL,
///     ..Default::default()
/// });
///
/// assert!(applier.is_owner_of(&Owner::User {
///     tenant: "p1".to_string(),
///     id: "u1".to_string(),
/// }));
/// ```
#[derive(Debug, Clone)]
pub struct RemoteApplier {
    info: AuthInfo,
    account: Option<AccountInfo>,
}

impl RemoteApplier {
    /// Creates an applier for `info` with no account.
    pub fn new(info: AuthInfo) -> Self {
        Self {
            info,
            account: None,
        }
    }

    /// Attaches the account the user belongs to.
    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.account = Some(account);
        self
    }

    /// Canonical `tenant$user` id, or just the user id in the default tenant.
    pub fn canonical_id(&self) -> String {
        if self.info.tenant.is_empty() {
            self.info.user_id.clone()
        } else {
            format!("{}${}", self.info.tenant, self.info.user_id)
        }
    }
}

impl IdentityApplier for RemoteApplier {
    fn modify_request_state(&self, state: &mut RequestState) {
        let mut description = String::new();
        // Writing into a String cannot fail.
        let _ = self.describe(&mut description);
        state.auth_identity = description;
        state.identity_type = IdentityType::Keystone;
        state.tenant = self.info.tenant.clone();
    }

    fn acl_owner(&self) -> AclOwner {
        AclOwner {
            id: self.canonical_id(),
            display_name: self.info.display_name.clone(),
        }
    }

    fn perms_from_aclspec(&self, aclspec: &AclSpec) -> u32 {
        let own = aclspec.get(&self.canonical_id()).copied().unwrap_or(0);
        let everyone = aclspec.get(ACL_ALL_USERS).copied().unwrap_or(0);
        own | everyone
    }

    fn is_admin_of(&self, _owner: &Owner) -> bool {
        self.info.is_admin
    }

    fn is_owner_of(&self, owner: &Owner) -> bool {
        match owner {
            Owner::User { tenant, id } => *tenant == self.info.tenant && *id == self.info.user_id,
            Owner::Account(id) => self.account.as_ref().is_some_and(|a| a.id == *id),
        }
    }

    fn perm_mask(&self) -> u32 {
        self.info.perm_mask
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            "RemoteApplier(acct_user={}, acct_name={}, perm_mask={}, is_admin={})",
            self.canonical_id(),
            self.info.display_name,
            self.info.perm_mask,
            self.info.is_admin
        )
    }

    fn is_identity(&self, principal: &Principal) -> bool {
        match principal {
            Principal::Wildcard => true,
            Principal::Tenant(tenant) => *tenant == self.info.tenant,
            Principal::User { tenant, id } => {
                *tenant == self.info.tenant && (id == "*" || *id == self.info.user_id)
            }
            Principal::Account(id) => self.account.as_ref().is_some_and(|a| a.id == *id),
            Principal::Role(_) => false,
        }
    }

    fn identity_type(&self) -> IdentityType {
        IdentityType::Keystone
    }

    fn account_name(&self) -> String {
        self.info.display_name.clone()
    }

    fn subuser(&self) -> String {
        self.info.subuser.clone()
    }

    fn tenant(&self) -> &str {
        &self.info.tenant
    }

    fn account(&self) -> &Option<AccountInfo> {
        &self.account
    }

    fn load_acct_info(&self, user_info: &mut UserInfo) {
        user_info.user_id = self.info.user_id.clone();
        user_info.tenant = self.info.tenant.clone();
        user_info.display_name = self.info.display_name.clone();
        user_info.account_id = self.account.as_ref().map(|a| a.id.clone());
    }

    fn write_ops_log_entry(&self, entry: &mut OpsLogEntry) {
        entry.set_user(self.canonical_id());
        entry.set_identity_type(IdentityType::Keystone);
    }
}
