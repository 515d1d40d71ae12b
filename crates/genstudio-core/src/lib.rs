//! GenStudio Core - credential-rotating request layer.
//!
//! This crate provides the pieces the generation suite uses to call its remote
//! generation API:
//! - `Credential`, `CredentialSet`: candidate tokens and their trial order
//! - `CredentialSource`: personal token + shared pool, with remote refresh
//! - `AuditSink`, `NotificationBus`: injected observability collaborators
//! - `CredentialRotatingRequester`: the attempt loop itself

pub mod audit;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod http;
pub mod paths;
pub mod requester;
pub mod source;
pub mod store;

pub use audit::{
    AuditEntry, AuditSink, AuditStatus, FanoutAuditSink, MemoryAuditSink, TracingAuditSink,
};
pub use config::RequesterConfig;
pub use credential::{Candidate, Credential, CredentialOrigin, CredentialSet, redact};
pub use error::{RequestError, StoreError};
pub use events::{BroadcastNotificationBus, NotificationBus, NotificationEvent};
pub use fetcher::{HttpSharedCredentialFetcher, SharedCredentialFetcher};
pub use http::build_http_client;
pub use requester::{CredentialRotatingRequester, RotationResponse};
pub use source::CredentialSource;
#[cfg(any(test, feature = "test-utils"))]
pub use source::InMemoryCredentialSource;
pub use store::{ProfileStore, SessionCache, StoreCredentialSource, UserProfile};
