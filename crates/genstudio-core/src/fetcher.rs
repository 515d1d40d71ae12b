//! Remote shared-credential pool fetchers.

use crate::credential::Credential;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

#[async_trait]
pub trait SharedCredentialFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Credential>>;
}

/// Fetches the shared pool with a plain `GET` from a pool endpoint.
#[derive(Debug, Clone)]
pub struct HttpSharedCredentialFetcher {
    client: Client,
    url: String,
}

/// Accepted pool payloads: `{"tokens": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PoolResponse {
    Wrapped { tokens: Vec<PoolEntry> },
    Bare(Vec<PoolEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PoolEntry {
    Plain(String),
    Detailed {
        token: String,
        #[serde(default)]
        issued_at: Option<DateTime<Utc>>,
    },
}

impl PoolEntry {
    fn into_credential(self) -> Option<Credential> {
        let (token, issued_at) = match self {
            PoolEntry::Plain(token) => (token, None),
            PoolEntry::Detailed { token, issued_at } => (token, issued_at),
        };
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let credential = Credential::shared(token);
        Some(match issued_at {
            Some(at) => credential.with_issued_at(at),
            None => credential,
        })
    }
}

impl HttpSharedCredentialFetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SharedCredentialFetcher for HttpSharedCredentialFetcher {
    async fn fetch(&self) -> Result<Vec<Credential>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to send shared credential request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Shared credential pool returned {}",
                status.as_u16()
            ));
        }

        let pool = response
            .json::<PoolResponse>()
            .await
            .context("Failed to parse shared credential pool")?;

        let entries = match pool {
            PoolResponse::Wrapped { tokens } => tokens,
            PoolResponse::Bare(tokens) => tokens,
        };

        Ok(entries
            .into_iter()
            .filter_map(PoolEntry::into_credential)
            .collect())
    }
}
