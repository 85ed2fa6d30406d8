//! Scope-logging decorator over an identity applier.
//!
//! [`ScopeLoggingApplier`] wraps the applier produced by the authentication
//! engine and owns the validated token. Every capability call is forwarded
//! to the wrapped applier unchanged. The only added behavior is in
//! [`write_ops_log_entry`](IdentityApplier::write_ops_log_entry), which
//! attaches the request's redacted scope to the entry when both the ops-log
//! gate and the scope gate are open.

use std::fmt;
use std::sync::Arc;

use crate::audit::OpsLogEntry;
use crate::config::ScopeConfig;
use crate::identity::{
    AccountInfo, AclOwner, AclSpec, IdentityApplier, IdentityType, Owner, Principal,
    RequestState, UserInfo,
};
use crate::policy::RedactionPolicy;
use crate::token::Token;

static NO_TENANT: &str = "";
static NO_ACCOUNT: Option<AccountInfo> = None;

/// Identity applier that additionally records keystone scope in the ops log.
///
/// The wrapped applier may be absent. In that case each forwarded call
/// answers with a neutral value: `false` for checks, `0` for masks, empty
/// strings, [`IdentityType::None`], a default [`AclOwner`], and no-ops for
/// mutators.
///
/// Gates and redaction switches are read from the shared [`ScopeConfig`]
/// every time an entry is written. Without a config the scope is never
/// captured.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use scope_audit::audit::OpsLogEntry;
/// use scope_audit::{
///     AuthInfo, IdentityApplier, RemoteApplier, ScopeConfig, ScopeLogSettings,
///     ScopeLoggingApplier, Token, TokenProject,
/// };
///
/// let config = Arc::new(ScopeConfig::new(ScopeLogSettings {
///     ops_log_enabled: true,
///     scope_enabled: true,
///     ..Default::default()
/// }));
/// let token = Token::new("tok", TokenProject { id: "p1".to_string(), ..Default::default() });
/// let inner = RemoteApplier::new(AuthInfo { tenant: "p1".to_string(), ..Default::default() });
///
/// let applier = ScopeLoggingApplier::new(Some(config), Some(Box::new(inner)), token);
///
/// let mut entry = OpsLogEntry::new("tx-1", "list_bucket");
/// applier.write_ops_log_entry(&mut entry);
/// assert_eq!(entry.keystone_scope().unwrap().project.id, "p1");
/// ```
pub struct ScopeLoggingApplier {
    config: Option<Arc<ScopeConfig>>,
    inner: Option<Box<dyn IdentityApplier>>,
    token: Token,
}

impl ScopeLoggingApplier {
    /// Wraps `inner`, taking ownership of the validated `token`.
    pub fn new(
        config: Option<Arc<ScopeConfig>>,
        inner: Option<Box<dyn IdentityApplier>>,
        token: Token,
    ) -> Self {
        Self {
            config,
            inner,
            token,
        }
    }

    /// Returns the wrapped applier, if any.
    pub fn inner(&self) -> Option<&dyn IdentityApplier> {
        self.inner.as_deref()
    }

    /// Returns the owned token.
    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl fmt::Debug for ScopeLoggingApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeLoggingApplier")
            .field("has_config", &self.config.is_some())
            .field("has_inner", &self.inner.is_some())
            .field("project_id", &self.token.project().id)
            .finish_non_exhaustive()
    }
}

impl IdentityApplier for ScopeLoggingApplier {
    fn modify_request_state(&self, state: &mut RequestState) {
        if let Some(inner) = &self.inner {
            inner.modify_request_state(state);
        }
    }

    fn acl_owner(&self) -> AclOwner {
        self.inner
            .as_ref()
            .map(|inner| inner.acl_owner())
            .unwrap_or_default()
    }

    fn perms_from_aclspec(&self, aclspec: &AclSpec) -> u32 {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.perms_from_aclspec(aclspec))
    }

    fn is_admin_of(&self, owner: &Owner) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.is_admin_of(owner))
    }

    fn is_owner_of(&self, owner: &Owner) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.is_owner_of(owner))
    }

    fn perm_mask(&self) -> u32 {
        self.inner.as_ref().map_or(0, |inner| inner.perm_mask())
    }

    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match &self.inner {
            Some(inner) => inner.describe(out),
            None => Ok(()),
        }
    }

    fn is_identity(&self, principal: &Principal) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.is_identity(principal))
    }

    fn identity_type(&self) -> IdentityType {
        self.inner
            .as_ref()
            .map_or(IdentityType::None, |inner| inner.identity_type())
    }

    fn account_name(&self) -> String {
        self.inner
            .as_ref()
            .map(|inner| inner.account_name())
            .unwrap_or_default()
    }

    fn subuser(&self) -> String {
        self.inner
            .as_ref()
            .map(|inner| inner.subuser())
            .unwrap_or_default()
    }

    fn tenant(&self) -> &str {
        match &self.inner {
            Some(inner) => inner.tenant(),
            None => NO_TENANT,
        }
    }

    fn account(&self) -> &Option<AccountInfo> {
        match &self.inner {
            Some(inner) => inner.account(),
            None => &NO_ACCOUNT,
        }
    }

    fn load_acct_info(&self, user_info: &mut UserInfo) {
        if let Some(inner) = &self.inner {
            inner.load_acct_info(user_info);
        }
    }

    fn write_ops_log_entry(&self, entry: &mut OpsLogEntry) {
        if let Some(inner) = &self.inner {
            inner.write_ops_log_entry(entry);
        }

        let Some(config) = &self.config else {
            return;
        };
        let settings = config.snapshot();
        if !settings.ops_log_enabled {
            return;
        }
        if !settings.scope_enabled {
            tracing::debug!(
                request_id = %entry.request_id(),
                "keystone scope capture disabled"
            );
            return;
        }

        let scope = RedactionPolicy::from_settings(&settings).build_transient(&self.token);
        entry.set_keystone_scope(scope);

        tracing::debug!(
            request_id = %entry.request_id(),
            include_names = settings.include_names,
            include_roles = settings.include_roles,
            "injected keystone scope into ops log entry"
        );
    }
}
