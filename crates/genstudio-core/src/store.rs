//! Local credential stores and the production [`CredentialSource`].
//!
//! - [`SessionCache`] holds the shared pool for the lifetime of the process.
//! - [`ProfileStore`] persists the user's personal token in a JSON profile.
//! - [`StoreCredentialSource`] composes both with an optional remote fetcher.

use crate::credential::Credential;
use crate::error::StoreError;
use crate::fetcher::SharedCredentialFetcher;
use crate::source::CredentialSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Session-scoped shared credential cache.
///
/// Concurrent writers simply overwrite each other; the cache is an
/// optimization, not a source of truth.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    shared: Arc<RwLock<Vec<Credential>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(credentials: Vec<Credential>) -> Self {
        Self {
            shared: Arc::new(RwLock::new(credentials)),
        }
    }

    pub fn get(&self) -> Vec<Credential> {
        self.shared.read().clone()
    }

    pub fn set(&self, credentials: &[Credential]) {
        *self.shared.write() = credentials.to_vec();
    }

    pub fn clear(&self) {
        self.shared.write().clear();
    }
}

/// On-disk shape of the user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_token_issued_at: Option<DateTime<Utc>>,
}

/// Per-user profile store backed by a JSON file.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profile: RwLock<UserProfile>,
}

impl ProfileStore {
    /// Load the profile at `path`; a missing file yields an empty profile.
    pub fn load(path: impl Into<PathBuf>) -> std::result::Result<Self, StoreError> {
        let path = path.into();
        let profile = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            UserProfile::default()
        };

        Ok(Self {
            path,
            profile: RwLock::new(profile),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn personal_credential(&self) -> Option<Credential> {
        let profile = self.profile.read();
        let token = profile
            .personal_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?;
        let credential = Credential::personal(token);
        Some(match profile.personal_token_issued_at {
            Some(at) => credential.with_issued_at(at),
            None => credential,
        })
    }

    /// Replace the personal token. Blank tokens are rejected and leave the
    /// stored profile untouched.
    pub fn set_personal_token(&self, token: &str) -> std::result::Result<(), StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StoreError::EmptyToken);
        }
        {
            let mut profile = self.profile.write();
            profile.personal_token = Some(token.to_string());
            profile.personal_token_issued_at = Some(Utc::now());
        }
        self.save()?;
        info!(path = %self.path.display(), "Personal token saved");
        Ok(())
    }

    pub fn clear_personal_token(&self) -> std::result::Result<(), StoreError> {
        {
            let mut profile = self.profile.write();
            profile.personal_token = None;
            profile.personal_token_issued_at = None;
        }
        self.save()?;
        info!(path = %self.path.display(), "Personal token cleared");
        Ok(())
    }

    fn save(&self) -> std::result::Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&*self.profile.read())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Production credential source.
pub struct StoreCredentialSource {
    profile: Option<Arc<ProfileStore>>,
    cache: SessionCache,
    fetcher: Option<Arc<dyn SharedCredentialFetcher>>,
}

impl StoreCredentialSource {
    pub fn new(cache: SessionCache) -> Self {
        Self {
            profile: None,
            cache,
            fetcher: None,
        }
    }

    pub fn with_profile(mut self, profile: Arc<ProfileStore>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SharedCredentialFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }
}

#[async_trait]
impl CredentialSource for StoreCredentialSource {
    fn personal_credential(&self) -> Option<Credential> {
        self.profile.as_ref()?.personal_credential()
    }

    fn cached_shared_credentials(&self) -> Vec<Credential> {
        self.cache.get()
    }

    async fn refresh_shared_credentials(&self) -> Result<Vec<Credential>> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| anyhow!("No shared credential pool configured"))?;
        let credentials = fetcher.fetch().await?;
        debug!(count = credentials.len(), "Fetched shared credential pool");
        Ok(credentials)
    }

    fn persist_shared_credentials(&self, credentials: &[Credential]) {
        self.cache.set(credentials);
    }
}
