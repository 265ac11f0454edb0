//! Requester identity and the bearer-token gate.
//!
//! Identity issuance lives outside this crate; here a credential presented
//! by the caller is only mapped to an identity or rejected.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::config::ConfigError;

/// Authenticated caller identifier (e.g. an email address). Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequesterIdentity(String);

impl RequesterIdentity {
    /// Returns `None` for blank identities.
    pub fn new(identity: impl Into<String>) -> Option<Self> {
        let identity = identity.into();
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(RequesterIdentity(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequesterIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a presented credential to a requester.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Option<RequesterIdentity>;
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Static token table. Only SHA-256 digests of tokens are kept in memory.
#[derive(Debug, Default, Clone)]
pub struct TokenDigestResolver {
    identities: HashMap<String, RequesterIdentity>,
}

impl TokenDigestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `token` to `identity`.
    pub fn with_token(mut self, token: &str, identity: RequesterIdentity) -> Self {
        self.identities.insert(token_digest(token), identity);
        self
    }

    /// Parse `token:identity` pairs separated by commas.
    pub fn from_spec(spec: &str) -> Result<Self, ConfigError> {
        let mut resolver = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = || ConfigError::InvalidValue {
                var: "IMAGEGEN_ACCESS_TOKENS",
                value: "<entry without token:identity>".to_string(),
            };
            let (token, identity) = entry.split_once(':').ok_or_else(invalid)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid());
            }
            let identity = RequesterIdentity::new(identity).ok_or_else(invalid)?;
            resolver = resolver.with_token(token, identity);
        }
        Ok(resolver)
    }

    /// Create from `IMAGEGEN_ACCESS_TOKENS` (required).
    pub fn from_env() -> Result<Self, ConfigError> {
        let spec = std::env::var("IMAGEGEN_ACCESS_TOKENS")
            .map_err(|_| ConfigError::MissingVar("IMAGEGEN_ACCESS_TOKENS"))?;
        Self::from_spec(&spec)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl IdentityResolver for TokenDigestResolver {
    fn resolve(&self, credential: &str) -> Option<RequesterIdentity> {
        self.identities.get(&token_digest(credential)).cloned()
    }
}
