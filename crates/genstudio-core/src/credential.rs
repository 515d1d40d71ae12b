//! Core credential types
//!
//! Defines credentials, where they came from, and the ordered candidate set
//! a single request rotates through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of trailing characters kept when redacting a token.
pub const DEFAULT_REDACT_SUFFIX_LEN: usize = 4;

/// Where a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOrigin {
    /// The current user's own token, tried first
    Personal,
    /// One of the pool of tokens available to all users
    Shared,
    /// Supplied directly by the caller, bypassing rotation
    Explicit,
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Personal => write!(f, "Personal"),
            CredentialOrigin::Shared => write!(f, "Shared"),
            CredentialOrigin::Explicit => write!(f, "Explicit"),
        }
    }
}

/// An opaque bearer token plus its provenance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The secret token value
    pub value: String,
    /// Where the token came from
    pub origin: CredentialOrigin,
    /// When the token was issued, `None` if unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(value: impl Into<String>, origin: CredentialOrigin) -> Self {
        Self {
            value: value.into(),
            origin,
            issued_at: None,
        }
    }

    pub fn personal(value: impl Into<String>) -> Self {
        Self::new(value, CredentialOrigin::Personal)
    }

    pub fn shared(value: impl Into<String>) -> Self {
        Self::new(value, CredentialOrigin::Shared)
    }

    pub fn explicit(value: impl Into<String>) -> Self {
        Self::new(value, CredentialOrigin::Explicit)
    }

    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn is_personal(&self) -> bool {
        self.origin == CredentialOrigin::Personal
    }

    /// Display-safe form of the token: only the last `suffix_len` characters.
    pub fn redacted(&self, suffix_len: usize) -> String {
        redact(&self.value, suffix_len)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &self.redacted(DEFAULT_REDACT_SUFFIX_LEN))
            .field("origin", &self.origin)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Mask a token, keeping only its trailing characters.
pub fn redact(value: &str, suffix_len: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= suffix_len {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("...{tail}")
}

/// A credential paired with its position in the rotation.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub credential: Credential,
    /// Zero-based position in the whole set
    pub index: usize,
    /// Human-readable label used in audit entries
    pub label: String,
}

/// Ordered candidates for one request.
///
/// The personal credential always comes first, followed by shared credentials
/// in the order the source returned them.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    candidates: Vec<Candidate>,
}

impl CredentialSet {
    pub fn build(personal: Option<Credential>, shared: Vec<Credential>) -> Self {
        let mut credentials = Vec::with_capacity(shared.len() + 1);
        credentials.extend(personal);
        credentials.extend(shared);
        Self::from_ordered(credentials)
    }

    /// Singleton set used when the caller pins a token.
    pub fn explicit(value: impl Into<String>) -> Self {
        Self::from_ordered(vec![Credential::explicit(value)])
    }

    fn from_ordered(credentials: Vec<Credential>) -> Self {
        let mut shared_position = 0;
        let candidates = credentials
            .into_iter()
            .enumerate()
            .map(|(index, credential)| {
                let label = match credential.origin {
                    CredentialOrigin::Personal => "Personal Credential".to_string(),
                    CredentialOrigin::Shared => {
                        shared_position += 1;
                        format!("Shared Credential #{shared_position}")
                    }
                    CredentialOrigin::Explicit => "Explicit Credential".to_string(),
                };
                Candidate {
                    credential,
                    index,
                    label,
                }
            })
            .collect();
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

impl IntoIterator for CredentialSet {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
