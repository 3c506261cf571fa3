//! Admin session authentication as an ordered chain of independent checks.
//!
//! Every check can fail closed on its own. The chain passes only when all of
//! them pass and one of them has established an admin identity.

use std::sync::Arc;

use crate::error::AuthError;
use crate::models::{AdminIdentity, ADMIN_ROLE, EXTERNAL_ROLE};
use crate::traits::AuthProvider;

/// Whatever the request carried that could prove who it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Signed admin token from the session cookie.
    pub admin_token: Option<String>,
    /// Role flag issued by the external identity provider.
    pub external_role: Option<String>,
}

/// What a passing check contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// A capability the request holds, without naming anyone.
    Capability,
    /// The admin the request acts as.
    Identity(AdminIdentity),
}

pub trait AccessCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, credentials: &SessionCredentials) -> Result<Grant, AuthError>;
}

/// Requires the external identity provider to have granted the `confess` role.
pub struct ExternalRoleCheck {
    required_role: String,
}

impl ExternalRoleCheck {
    pub fn new(required_role: impl Into<String>) -> Self {
        Self {
            required_role: required_role.into(),
        }
    }
}

impl Default for ExternalRoleCheck {
    fn default() -> Self {
        Self::new(EXTERNAL_ROLE)
    }
}

impl AccessCheck for ExternalRoleCheck {
    fn name(&self) -> &'static str {
        "external-role"
    }

    fn check(&self, credentials: &SessionCredentials) -> Result<Grant, AuthError> {
        match credentials.external_role.as_deref() {
            Some(role) if role == self.required_role => Ok(Grant::Capability),
            _ => Err(AuthError::ExternalRoleMissing),
        }
    }
}

/// Verifies the signed session token and its `admin` role claim.
pub struct SignedTokenCheck {
    provider: Arc<dyn AuthProvider>,
}

impl SignedTokenCheck {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

impl AccessCheck for SignedTokenCheck {
    fn name(&self) -> &'static str {
        "signed-token"
    }

    fn check(&self, credentials: &SessionCredentials) -> Result<Grant, AuthError> {
        let token = credentials
            .admin_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        // Every decode failure maps to one error.
        let claims = self
            .provider
            .decode_token(token)
            .map_err(|_| AuthError::InvalidOrExpiredToken)?;

        if claims.role != ADMIN_ROLE {
            return Err(AuthError::InvalidRole);
        }
        Ok(Grant::Identity(claims.into()))
    }
}

/// Runs its checks in order and stops at the first failure.
pub struct AdminAuthenticator {
    checks: Vec<Box<dyn AccessCheck>>,
}

impl AdminAuthenticator {
    pub fn new(checks: Vec<Box<dyn AccessCheck>>) -> Self {
        Self { checks }
    }

    /// Token-only chain, optionally preceded by the external role gate.
    pub fn standard(provider: Arc<dyn AuthProvider>, require_external_role: bool) -> Self {
        let mut checks: Vec<Box<dyn AccessCheck>> = Vec::new();
        if require_external_role {
            checks.push(Box::new(ExternalRoleCheck::default()));
        }
        checks.push(Box::new(SignedTokenCheck::new(provider)));
        Self::new(checks)
    }

    pub fn authenticate(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<AdminIdentity, AuthError> {
        let mut identity = None;
        for check in &self.checks {
            match check.check(credentials) {
                Ok(Grant::Identity(who)) => identity = Some(who),
                Ok(Grant::Capability) => {}
                Err(err) => {
                    tracing::debug!(check = check.name(), error = %err, "access check failed");
                    return Err(err);
                }
            }
        }
        identity.ok_or(AuthError::MissingToken)
    }
}
