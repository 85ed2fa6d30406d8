//! Property tests for scope redaction and the two persisted formats.

use proptest::prelude::*;
use scope_audit::{
    build_scope, ApplicationCredential, Domain, Project, RedactionPolicy, ScopeInfo, Token,
    TokenAppCred, TokenDomain, TokenProject, TokenRole, TokenUser, User,
};

fn arb_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,12}").unwrap()
}

fn arb_user_id() -> impl Strategy<Value = String> {
    prop_oneof![1 => Just(String::new()), 4 => arb_id()]
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 ._-]{0,16}").unwrap()
}

fn arb_domain() -> impl Strategy<Value = TokenDomain> {
    (arb_id(), arb_name()).prop_map(|(id, name)| TokenDomain { id, name })
}

// Token owns a secret and is not Clone, so strategies produce its parts.
#[derive(Debug, Clone)]
struct TokenParts {
    project: TokenProject,
    user: Option<TokenUser>,
    roles: Vec<TokenRole>,
    app_cred: Option<TokenAppCred>,
}

impl TokenParts {
    // A user claim without an id identifies nobody.
    fn identified_user(&self) -> Option<&TokenUser> {
        self.user.as_ref().filter(|user| !user.id.is_empty())
    }

    fn token(&self) -> Token {
        let mut token = Token::new("opaque-token", self.project.clone())
            .with_roles(self.roles.clone());
        if let Some(user) = &self.user {
            token = token.with_user(user.clone());
        }
        if let Some(app_cred) = &self.app_cred {
            token = token.with_app_cred(app_cred.clone());
        }
        token
    }
}

fn arb_token() -> impl Strategy<Value = TokenParts> {
    let project = (arb_id(), arb_name(), arb_domain())
        .prop_map(|(id, name, domain)| TokenProject { id, name, domain });
    let user = (arb_user_id(), arb_name(), arb_domain())
        .prop_map(|(id, name, domain)| TokenUser { id, name, domain });
    let role = (arb_id(), arb_name()).prop_map(|(id, name)| TokenRole { id, name });
    let app_cred = (arb_id(), arb_name(), any::<bool>())
        .prop_map(|(id, name, restricted)| TokenAppCred {
            id,
            name,
            restricted,
        });

    (
        project,
        prop::option::of(user),
        prop::collection::vec(role, 0..6),
        prop::option::of(app_cred),
    )
        .prop_map(|(project, user, roles, app_cred)| TokenParts {
            project,
            user,
            roles,
            app_cred,
        })
}

fn arb_scope_domain() -> impl Strategy<Value = Domain> {
    (any::<String>(), any::<String>()).prop_map(|(id, name)| Domain { id, name })
}

fn arb_scope_info(project_id: BoxedStrategy<String>) -> impl Strategy<Value = ScopeInfo> {
    let project = (project_id, any::<String>(), arb_scope_domain())
        .prop_map(|(id, name, domain)| Project { id, name, domain });
    let user = (any::<String>(), any::<String>(), arb_scope_domain())
        .prop_map(|(id, name, domain)| User { id, name, domain });
    let app_cred = (any::<String>(), any::<String>(), any::<bool>()).prop_map(
        |(id, name, restricted)| ApplicationCredential {
            id,
            name,
            restricted,
        },
    );

    (
        project,
        prop::option::of(user),
        prop::collection::vec(any::<String>(), 0..5),
        prop::option::of(app_cred),
    )
        .prop_map(|(project, user, roles, app_cred)| ScopeInfo {
            project,
            user,
            roles,
            app_cred,
        })
}

proptest! {
    /// With names excluded no name survives anywhere and every id does.
    #[test]
    fn proptest_names_excluded_redacts_every_name(
        parts in arb_token(),
        include_roles in any::<bool>()
    ) {
        let info = build_scope(&parts.token(), false, include_roles);

        prop_assert_eq!(&info.project.id, &parts.project.id);
        prop_assert_eq!(&info.project.domain.id, &parts.project.domain.id);
        prop_assert!(info.project.name.is_empty());
        prop_assert!(info.project.domain.name.is_empty());

        if let (Some(user), Some(expected)) = (&info.user, parts.identified_user()) {
            prop_assert_eq!(&user.id, &expected.id);
            prop_assert_eq!(&user.domain.id, &expected.domain.id);
            prop_assert!(user.name.is_empty());
            prop_assert!(user.domain.name.is_empty());
        }
        if let Some(app_cred) = &info.app_cred {
            prop_assert!(app_cred.name.is_empty());
        }
    }

    /// With names included every name is copied verbatim.
    #[test]
    fn proptest_names_included_pass_through(parts in arb_token()) {
        let info = build_scope(&parts.token(), true, true);

        prop_assert_eq!(&info.project.name, &parts.project.name);
        prop_assert_eq!(
            info.user.map(|u| u.name),
            parts.identified_user().map(|u| u.name.clone())
        );
        prop_assert_eq!(
            info.app_cred.map(|ac| ac.name),
            parts.app_cred.map(|ac| ac.name)
        );
    }

    /// Roles are either the token's names in order or nothing at all.
    #[test]
    fn proptest_role_gating(parts in arb_token(), include_names in any::<bool>()) {
        let token = parts.token();
        let expected: Vec<String> = parts.roles.iter().map(|r| r.name.clone()).collect();

        prop_assert_eq!(build_scope(&token, include_names, true).roles, expected);
        prop_assert!(build_scope(&token, include_names, false).roles.is_empty());
    }

    /// Optional blocks follow the token, never the switches.
    #[test]
    fn proptest_presence_independent_of_switches(
        parts in arb_token(),
        include_names in any::<bool>(),
        include_roles in any::<bool>()
    ) {
        let info = build_scope(&parts.token(), include_names, include_roles);

        prop_assert_eq!(info.user.is_some(), parts.identified_user().is_some());
        prop_assert_eq!(info.app_cred.is_some(), parts.app_cred.is_some());
        prop_assert_eq!(
            info.app_cred.map(|ac| ac.restricted),
            parts.app_cred.map(|ac| ac.restricted)
        );
    }

    /// Persisting the transient view gives the same record as building the
    /// persisted view directly.
    #[test]
    fn proptest_transient_and_persisted_views_agree(
        parts in arb_token(),
        include_names in any::<bool>(),
        include_roles in any::<bool>()
    ) {
        let token = parts.token();
        let policy = RedactionPolicy::new(include_names, include_roles);

        prop_assert_eq!(
            ScopeInfo::from(policy.build_transient(&token)),
            policy.build_persisted(&token)
        );
    }

    /// Any record survives the binary framing unchanged.
    #[test]
    fn proptest_binary_round_trip(info in arb_scope_info(any::<String>().boxed())) {
        let decoded = ScopeInfo::from_binary(&info.to_binary()).unwrap();
        prop_assert_eq!(decoded, info);
    }

    /// Any record with a project id survives JSON unchanged.
    #[test]
    fn proptest_json_round_trip(info in arb_scope_info(arb_id().boxed())) {
        let decoded = ScopeInfo::from_json(&info.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded, info);
    }

    /// Every strict prefix of a valid encoding is rejected.
    #[test]
    fn proptest_truncated_binary_is_rejected(
        info in arb_scope_info(arb_id().boxed()),
        cut in any::<prop::sample::Index>()
    ) {
        let bytes = info.to_binary();
        let at = cut.index(bytes.len());

        prop_assert!(ScopeInfo::from_binary(&bytes[..at]).is_err());
    }

    /// Decoding arbitrary bytes returns an error instead of panicking.
    #[test]
    fn proptest_arbitrary_bytes_never_panic(
        bytes in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let _ = ScopeInfo::from_binary(&bytes);
    }
}
