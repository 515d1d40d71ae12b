//! Credential-rotating requester
//!
//! Sends a JSON `POST` to a generation endpoint, trying each candidate
//! credential in priority order until one succeeds:
//!
//! 1. the caller's explicit credential, if given, and nothing else;
//! 2. otherwise the personal credential followed by the shared pool.
//!
//! Attempts are strictly sequential. Every attempt is audited, a failing
//! personal credential is announced on the notification bus, and once every
//! candidate has failed the error from the last one is returned.

use crate::audit::{AuditEntry, AuditSink};
use crate::config::RequesterConfig;
use crate::credential::{Candidate, CredentialSet};
use crate::error::{RequestError, Result};
use crate::events::{NotificationBus, NotificationEvent};
use crate::source::CredentialSource;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Successful outcome of a rotating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationResponse {
    /// Parsed response body
    pub data: Value,
    /// Token that produced the response, reusable as an explicit credential
    pub used_credential: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    Success,
    Error,
}

/// What happened to one candidate. Only lives long enough to be audited.
struct AttemptRecord<'a> {
    candidate: &'a Candidate,
    outcome: AttemptOutcome,
    detail: Option<String>,
}

pub struct CredentialRotatingRequester {
    client: Client,
    config: RequesterConfig,
    source: Arc<dyn CredentialSource>,
    audit: Arc<dyn AuditSink>,
    bus: Arc<dyn NotificationBus>,
}

impl CredentialRotatingRequester {
    pub fn new(
        client: Client,
        config: RequesterConfig,
        source: Arc<dyn CredentialSource>,
        audit: Arc<dyn AuditSink>,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            client,
            config,
            source,
            audit,
            bus,
        }
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// POST `payload` to `endpoint`, rotating credentials on failure.
    ///
    /// `context` only labels log and audit entries. When `explicit_credential`
    /// is set no other credential is consulted.
    pub async fn execute<P>(
        &self,
        endpoint: &str,
        payload: &P,
        context: &str,
        explicit_credential: Option<&str>,
    ) -> Result<RotationResponse>
    where
        P: Serialize + ?Sized + Sync,
    {
        let credentials = match explicit_credential {
            Some(value) => CredentialSet::explicit(value),
            None => self.build_credential_set().await,
        };

        if credentials.is_empty() {
            warn!(context, "No credentials available, skipping request");
            return Err(RequestError::NoCredentialsAvailable {
                context: context.to_string(),
            });
        }

        let total = credentials.len();
        let mut last_error = None;

        for candidate in credentials.iter() {
            debug!(
                context,
                attempt = candidate.index + 1,
                total,
                credential = %self.identity(candidate),
                "Attempting request"
            );

            match self.attempt(endpoint, payload, candidate).await {
                Ok(data) => {
                    self.record(
                        context,
                        AttemptRecord {
                            candidate,
                            outcome: AttemptOutcome::Success,
                            detail: None,
                        },
                    );
                    debug!(context, credential = %self.identity(candidate), "Request succeeded");
                    return Ok(RotationResponse {
                        data,
                        used_credential: candidate.credential.value.clone(),
                    });
                }
                Err(error) => {
                    self.record(
                        context,
                        AttemptRecord {
                            candidate,
                            outcome: AttemptOutcome::Error,
                            detail: Some(error.to_string()),
                        },
                    );
                    if candidate.credential.is_personal() {
                        self.bus.publish(NotificationEvent::PersonalTokenFailed);
                    }
                    last_error = Some(error);
                }
            }
        }

        debug_assert!(
            last_error.is_some(),
            "non-empty credential set finished without an error"
        );
        let Some(error) = last_error else {
            return Err(RequestError::NoCredentialsAvailable {
                context: context.to_string(),
            });
        };

        debug!(context, attempts = total, error = %error, "All credentials exhausted");
        self.audit.record(AuditEntry::error(
            context,
            format!("All {total} credential(s) failed"),
            format!("{total} attempt(s)"),
            error.to_string(),
        ));
        Err(error)
    }

    /// Personal credential first, then the shared pool (refreshed when empty).
    async fn build_credential_set(&self) -> CredentialSet {
        let personal = self.source.personal_credential();
        let mut shared = self.source.cached_shared_credentials();

        if shared.is_empty() {
            match self.source.refresh_shared_credentials().await {
                Ok(refreshed) => {
                    debug!(count = refreshed.len(), "Refreshed shared credentials");
                    self.source.persist_shared_credentials(&refreshed);
                    shared = refreshed;
                }
                Err(error) => {
                    warn!(%error, "Failed to refresh shared credentials");
                }
            }
        }

        CredentialSet::build(personal, shared)
    }

    async fn attempt<P>(&self, endpoint: &str, payload: &P, candidate: &Candidate) -> Result<Value>
    where
        P: Serialize + ?Sized + Sync,
    {
        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", candidate.credential.value))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body)?;

        if !status.is_success() {
            return Err(RequestError::RemoteRejection {
                status: status.as_u16(),
                message: rejection_message(&data, status.as_u16()),
            });
        }

        Ok(data)
    }

    fn record(&self, context: &str, record: AttemptRecord<'_>) {
        let identity = self.identity(record.candidate);
        let entry = match record.outcome {
            AttemptOutcome::Success => AuditEntry::success(
                context,
                format!("Request succeeded with {}", record.candidate.label),
                identity,
            ),
            AttemptOutcome::Error => AuditEntry::error(
                context,
                format!("Request failed with {}", record.candidate.label),
                identity,
                record.detail.unwrap_or_default(),
            ),
        };
        self.audit.record(entry);
    }

    fn identity(&self, candidate: &Candidate) -> String {
        format!(
            "{} ({})",
            candidate.label,
            candidate.credential.redacted(self.config.redact_suffix_len)
        )
    }
}

/// Error text from a rejected response: `error.message`, then `message`,
/// then a generic status line.
fn rejection_message(body: &Value, status: u16) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("API call failed ({status})"))
}
