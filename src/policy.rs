use crate::config::{ScopeConfig, ScopeLogSettings};
use crate::scope::{ApplicationCredential, Domain, KeystoneScope, Project, ScopeInfo, User};
use crate::token::{Token, TokenAppCred, TokenDomain, TokenUser};

/// Redaction policy applied when scope is extracted from a token.
///
/// The two switches are fixed for one build and applied uniformly:
///
/// - `include_names`: when false, every human-readable name (project,
///   project domain, user, user domain, application credential) becomes the
///   empty string. IDs always pass through.
/// - `include_roles`: when false, the role list is empty regardless of what
///   the token carried. When true, role names are copied in token order.
///
/// Application credential presence depends only on the token.
///
/// # Examples
///
/// ```
/// use scope_audit::{RedactionPolicy, Token, TokenProject};
///
/// let token = Token::new("tok", TokenProject {
///     id: "p1".to_string(),
///     name: "Proj".to_string(),
///     ..Default::default()
/// });
///
/// let scope = RedactionPolicy::new(false, true).build_persisted(&token);
/// assert_eq!(scope.project.id, "p1");
/// assert_eq!(scope.project.name, "");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionPolicy {
    include_names: bool,
    include_roles: bool,
}

impl RedactionPolicy {
    /// Creates a policy from the two redaction switches.
    pub fn new(include_names: bool, include_roles: bool) -> Self {
        Self {
            include_names,
            include_roles,
        }
    }

    /// Derives the policy from a settings snapshot.
    pub fn from_settings(settings: &ScopeLogSettings) -> Self {
        Self::new(settings.include_names, settings.include_roles)
    }

    /// Returns true if names are disclosed.
    pub fn include_names(&self) -> bool {
        self.include_names
    }

    /// Returns true if role names are disclosed.
    pub fn include_roles(&self) -> bool {
        self.include_roles
    }

    /// Builds the transient view attached to an ops-log entry.
    ///
    /// A token without a user yields an empty, structurally present user.
    pub fn build_transient(&self, token: &Token) -> KeystoneScope {
        let user = token.user().map(|u| self.user(u)).unwrap_or_default();

        let scope = KeystoneScope {
            project: self.project(token),
            user,
            roles: self.roles(token),
            app_cred: token.app_cred().map(|ac| self.app_cred(ac)),
        };

        tracing::trace!(
            project_id = %scope.project.id,
            user_id = %scope.user.id,
            roles = scope.roles.len(),
            app_cred = scope.app_cred.is_some(),
            "keystone scope extracted"
        );

        scope
    }

    /// Builds the persisted view.
    ///
    /// The user block is present iff the token identifies a user.
    pub fn build_persisted(&self, token: &Token) -> ScopeInfo {
        let info = ScopeInfo {
            project: self.project(token),
            user: token.user().map(|u| self.user(u)),
            roles: self.roles(token),
            app_cred: token.app_cred().map(|ac| self.app_cred(ac)),
        };

        tracing::trace!(
            project_id = %info.project.id,
            user = info.user.is_some(),
            roles = info.roles.len(),
            app_cred = info.app_cred.is_some(),
            "scope info extracted"
        );

        info
    }

    fn name(&self, name: &str) -> String {
        if self.include_names {
            name.to_string()
        } else {
            String::new()
        }
    }

    fn domain(&self, domain: &TokenDomain) -> Domain {
        Domain {
            id: domain.id.clone(),
            name: self.name(&domain.name),
        }
    }

    fn project(&self, token: &Token) -> Project {
        let project = token.project();
        Project {
            id: project.id.clone(),
            name: self.name(&project.name),
            domain: self.domain(&project.domain),
        }
    }

    fn user(&self, user: &TokenUser) -> User {
        User {
            id: user.id.clone(),
            name: self.name(&user.name),
            domain: self.domain(&user.domain),
        }
    }

    fn roles(&self, token: &Token) -> Vec<String> {
        if !self.include_roles {
            return Vec::new();
        }
        token.roles().iter().map(|role| role.name.clone()).collect()
    }

    fn app_cred(&self, app_cred: &TokenAppCred) -> ApplicationCredential {
        ApplicationCredential {
            id: app_cred.id.clone(),
            name: self.name(&app_cred.name),
            restricted: app_cred.restricted,
        }
    }
}

/// Builds the persisted scope for `token` under the given switches.
pub fn build_scope(token: &Token, include_names: bool, include_roles: bool) -> ScopeInfo {
    RedactionPolicy::new(include_names, include_roles).build_persisted(token)
}

/// Builds the persisted scope for `token` if scope capture is enabled.
///
/// The settings are read once; both gates must be open. Redaction follows
/// the switches of that same snapshot.
///
/// # Example
///
/// ```
/// use scope_audit::{build_scope_info, ScopeConfig, ScopeLogSettings, Token, TokenProject};
///
/// let token = Token::new("tok", TokenProject { id: "p1".to_string(), ..Default::default() });
/// let config = ScopeConfig::new(ScopeLogSettings::default());
/// assert!(build_scope_info(&config, &token).is_none());
///
/// config.set_ops_log_enabled(true);
/// config.set_scope_enabled(true);
/// assert_eq!(build_scope_info(&config, &token).unwrap().project.id, "p1");
/// ```
pub fn build_scope_info(config: &ScopeConfig, token: &Token) -> Option<ScopeInfo> {
    let settings = config.snapshot();
    if !settings.capture_enabled() {
        return None;
    }
    Some(RedactionPolicy::from_settings(&settings).build_persisted(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TokenProject, TokenRole};

    fn full_token() -> Token {
        Token::new(
            "tok",
            TokenProject {
                id: "p1".to_string(),
                name: "Proj".to_string(),
                domain: TokenDomain {
                    id: "pd1".to_string(),
                    name: "ProjDomain".to_string(),
                },
            },
        )
        .with_user(TokenUser {
            id: "u1".to_string(),
            name: "Alice".to_string(),
            domain: TokenDomain {
                id: "ud1".to_string(),
                name: "UserDomain".to_string(),
            },
        })
        .with_role(TokenRole {
            id: "r1".to_string(),
            name: "admin".to_string(),
        })
        .with_role(TokenRole {
            id: "r2".to_string(),
            name: "reader".to_string(),
        })
        .with_app_cred(TokenAppCred {
            id: "ac1".to_string(),
            name: "ci-bot".to_string(),
            restricted: true,
        })
    }

    fn settings(ops_log_enabled: bool, scope_enabled: bool) -> ScopeLogSettings {
        ScopeLogSettings {
            ops_log_enabled,
            scope_enabled,
            include_names: false,
            include_roles: true,
        }
    }

    #[test]
    fn gated_builder_needs_both_gates() {
        let token = full_token();

        for (ops_log, scope) in [(false, false), (false, true), (true, false)] {
            let config = ScopeConfig::new(settings(ops_log, scope));
            assert!(build_scope_info(&config, &token).is_none());
        }
    }

    #[test]
    fn gated_builder_applies_snapshot_redaction() {
        let token = full_token();
        let config = ScopeConfig::new(settings(true, true));

        let info = build_scope_info(&config, &token).expect("both gates open");
        assert_eq!(info, build_scope(&token, false, true));
        assert_eq!(info.user.map(|u| u.name), Some(String::new()));

        config.set_include_names(true);
        config.set_include_roles(false);
        let info = build_scope_info(&config, &token).expect("both gates open");
        assert_eq!(info.project.name, "Proj");
        assert!(info.roles.is_empty());
    }

    #[test]
    fn names_included_pass_through() {
        let info = build_scope(&full_token(), true, true);

        assert_eq!(info.project.name, "Proj");
        assert_eq!(info.project.domain.name, "ProjDomain");
        let user = info.user.expect("token has a user");
        assert_eq!(user.name, "Alice");
        assert_eq!(user.domain.name, "UserDomain");
        assert_eq!(info.app_cred.map(|ac| ac.name), Some("ci-bot".to_string()));
    }

    #[test]
    fn names_excluded_clears_every_name_but_keeps_ids() {
        let info = build_scope(&full_token(), false, true);

        assert_eq!(info.project.id, "p1");
        assert_eq!(info.project.name, "");
        assert_eq!(info.project.domain.id, "pd1");
        assert_eq!(info.project.domain.name, "");

        let user = info.user.expect("redaction keeps the block");
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "");
        assert_eq!(user.domain.id, "ud1");
        assert_eq!(user.domain.name, "");

        let app_cred = info.app_cred.expect("app cred kept");
        assert_eq!(app_cred.id, "ac1");
        assert_eq!(app_cred.name, "");
        assert!(app_cred.restricted);
    }

    #[test]
    fn roles_excluded_yields_empty_list() {
        let info = build_scope(&full_token(), true, false);
        assert!(info.roles.is_empty());
    }

    #[test]
    fn roles_included_keep_order_and_drop_ids() {
        let info = build_scope(&full_token(), true, true);
        assert_eq!(info.roles, vec!["admin".to_string(), "reader".to_string()]);
    }

    #[test]
    fn absent_optionals_stay_absent() {
        let token = Token::new(
            "tok",
            TokenProject {
                id: "p1".to_string(),
                ..Default::default()
            },
        );
        let info = build_scope(&token, true, true);

        assert!(info.user.is_none());
        assert!(info.app_cred.is_none());
        assert!(info.roles.is_empty());
    }

    #[test]
    fn transient_view_always_has_a_user() {
        let token = Token::new(
            "tok",
            TokenProject {
                id: "p1".to_string(),
                ..Default::default()
            },
        );
        let scope = RedactionPolicy::new(true, true).build_transient(&token);

        assert_eq!(scope.user, User::default());
    }

    #[test]
    fn roles_survive_without_a_user() {
        let token = Token::new(
            "tok",
            TokenProject {
                id: "p1".to_string(),
                ..Default::default()
            },
        )
        .with_role(TokenRole {
            id: "r1".to_string(),
            name: "member".to_string(),
        });
        let info = build_scope(&token, false, true);

        assert!(info.user.is_none());
        assert_eq!(info.roles, vec!["member".to_string()]);
    }

    #[test]
    fn both_views_agree_on_a_user_without_id() {
        let token = Token::new(
            "tok",
            TokenProject {
                id: "p1".to_string(),
                ..Default::default()
            },
        )
        .with_user(TokenUser {
            id: String::new(),
            name: "Alice".to_string(),
            ..Default::default()
        });
        let policy = RedactionPolicy::new(true, true);

        let persisted = policy.build_persisted(&token);
        assert!(persisted.user.is_none());
        assert_eq!(ScopeInfo::from(policy.build_transient(&token)), persisted);
    }

    #[test]
    fn both_views_agree_when_the_user_exists() {
        let token = full_token();
        let policy = RedactionPolicy::new(false, true);

        let persisted = policy.build_persisted(&token);
        let transient = policy.build_transient(&token);

        assert_eq!(ScopeInfo::from(transient), persisted);
    }
}
