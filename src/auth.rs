// Caller identity
//
// Services never look up the caller themselves: the transport resolves a
// verified identity (or none) and passes it into each call.

use async_trait::async_trait;
use std::collections::HashMap;

/// Verified caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub uid: String,
}

impl CallerIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// Resolves a bearer credential to a caller
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the credential is unknown or invalid
    async fn verify(&self, token: &str) -> Option<CallerIdentity>;
}

/// Identity provider backed by a fixed token → uid table from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<CallerIdentity> {
        self.tokens
            .get(token)
            .filter(|uid| !uid.trim().is_empty())
            .map(|uid| CallerIdentity::new(uid.clone()))
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
