//! The validated token handed over by the external authentication engine.
//!
//! Validation happens elsewhere; values of these types are assumed to be
//! well-formed claims from the identity provider.

use crate::secret::Secret;

/// A domain claim (namespace for projects and users).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDomain {
    /// Opaque domain identifier
    pub id: String,
    /// Human-readable domain name
    pub name: String,
}

/// The project (tenant) the token is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenProject {
    /// Opaque project identifier
    pub id: String,
    /// Human-readable project name
    pub name: String,
    /// Domain owning the project
    pub domain: TokenDomain,
}

/// The user the token was issued to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUser {
    /// Opaque user identifier
    pub id: String,
    /// Human-readable user name
    pub name: String,
    /// Domain owning the user
    pub domain: TokenDomain,
}

/// A role assignment carried by the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRole {
    /// Opaque role identifier (never logged)
    pub id: String,
    /// Role name
    pub name: String,
}

/// Application credential details, present only for credential-based auth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAppCred {
    /// Opaque credential identifier
    pub id: String,
    /// Human-readable credential name
    pub name: String,
    /// Whether the credential is restricted from creating further credentials
    pub restricted: bool,
}

/// A validated token.
///
/// The token is moved into the decorator that serves the request and is
/// never cloned; only redacted, derived fields leave it.
///
/// # Example
///
/// ```
/// use scope_audit::{Token, TokenProject, TokenRole};
///
/// let token = Token::new("opaque-token-id", TokenProject {
///     id: "p1".to_string(),
///     name: "Proj".to_string(),
///     ..Default::default()
/// })
/// .with_role(TokenRole { id: "r1".to_string(), name: "admin".to_string() });
///
/// assert_eq!(token.project().id, "p1");
/// assert_eq!(token.roles().len(), 1);
/// assert!(!format!("{:?}", token).contains("opaque-token-id"));
/// ```
#[derive(Debug)]
pub struct Token {
    id: Secret<String>,
    project: TokenProject,
    user: Option<TokenUser>,
    roles: Vec<TokenRole>,
    app_cred: Option<TokenAppCred>,
}

impl Token {
    /// Creates a token scoped to `project` with no user, roles or app-cred.
    pub fn new(id: impl Into<String>, project: TokenProject) -> Self {
        Self {
            id: Secret::new(id.into()),
            project,
            user: None,
            roles: Vec::new(),
            app_cred: None,
        }
    }

    /// Sets the user block.
    ///
    /// A user claim with an empty id identifies nobody and leaves the token
    /// without a user.
    pub fn with_user(mut self, user: TokenUser) -> Self {
        self.user = Some(user).filter(|user| !user.id.is_empty());
        self
    }

    /// Appends a role, preserving insertion order.
    pub fn with_role(mut self, role: TokenRole) -> Self {
        self.roles.push(role);
        self
    }

    /// Replaces the role list.
    pub fn with_roles(mut self, roles: Vec<TokenRole>) -> Self {
        self.roles = roles;
        self
    }

    /// Marks the token as issued through an application credential.
    pub fn with_app_cred(mut self, app_cred: TokenAppCred) -> Self {
        self.app_cred = Some(app_cred);
        self
    }

    /// Returns the opaque token id.
    pub fn id(&self) -> &Secret<String> {
        &self.id
    }

    /// Returns the project claim.
    pub fn project(&self) -> &TokenProject {
        &self.project
    }

    /// Returns the user claim, if the token identifies a user.
    pub fn user(&self) -> Option<&TokenUser> {
        self.user.as_ref()
    }

    /// Returns the role assignments in token order.
    pub fn roles(&self) -> &[TokenRole] {
        &self.roles
    }

    /// Returns the application credential block, if any.
    pub fn app_cred(&self) -> Option<&TokenAppCred> {
        self.app_cred.as_ref()
    }
}
