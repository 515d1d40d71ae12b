//! Credential sources consumed by the requester

use crate::credential::Credential;
use anyhow::Result;
use async_trait::async_trait;

/// Supplies the personal credential and the shared pool.
///
/// Local reads are synchronous. Only the remote refresh suspends.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn personal_credential(&self) -> Option<Credential>;

    /// Shared credentials currently cached for this session, possibly empty.
    fn cached_shared_credentials(&self) -> Vec<Credential>;

    /// Fetch the shared pool from its remote origin.
    async fn refresh_shared_credentials(&self) -> Result<Vec<Credential>>;

    /// Best-effort write of a freshly fetched pool into the session cache.
    fn persist_shared_credentials(&self, credentials: &[Credential]);
}

#[cfg(any(test, feature = "test-utils"))]
pub use in_memory::InMemoryCredentialSource;

#[cfg(any(test, feature = "test-utils"))]
mod in_memory {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source with scripted refresh behaviour and call counters.
    #[derive(Debug, Default)]
    pub struct InMemoryCredentialSource {
        personal: Mutex<Option<Credential>>,
        cached: Mutex<Vec<Credential>>,
        refresh_result: Mutex<Option<std::result::Result<Vec<Credential>, String>>>,
        refresh_calls: AtomicUsize,
        persist_calls: AtomicUsize,
        personal_reads: AtomicUsize,
    }

    impl InMemoryCredentialSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_personal(self, value: impl Into<String>) -> Self {
            *self.personal.lock() = Some(Credential::personal(value));
            self
        }

        pub fn with_shared(self, values: &[&str]) -> Self {
            *self.cached.lock() = values.iter().map(|v| Credential::shared(*v)).collect();
            self
        }

        /// Script a successful refresh returning these tokens.
        pub fn with_refresh(self, values: &[&str]) -> Self {
            *self.refresh_result.lock() =
                Some(Ok(values.iter().map(|v| Credential::shared(*v)).collect()));
            self
        }

        /// Script a failing refresh.
        pub fn with_refresh_error(self, message: impl Into<String>) -> Self {
            *self.refresh_result.lock() = Some(Err(message.into()));
            self
        }

        pub fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        pub fn persist_calls(&self) -> usize {
            self.persist_calls.load(Ordering::SeqCst)
        }

        pub fn personal_reads(&self) -> usize {
            self.personal_reads.load(Ordering::SeqCst)
        }

        pub fn cached(&self) -> Vec<Credential> {
            self.cached.lock().clone()
        }
    }

    #[async_trait]
    impl CredentialSource for InMemoryCredentialSource {
        fn personal_credential(&self) -> Option<Credential> {
            self.personal_reads.fetch_add(1, Ordering::SeqCst);
            self.personal.lock().clone()
        }

        fn cached_shared_credentials(&self) -> Vec<Credential> {
            self.cached.lock().clone()
        }

        async fn refresh_shared_credentials(&self) -> Result<Vec<Credential>> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.refresh_result.lock().clone();
            match scripted {
                Some(Ok(credentials)) => Ok(credentials),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Ok(Vec::new()),
            }
        }

        fn persist_shared_credentials(&self, credentials: &[Credential]) {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            *self.cached.lock() = credentials.to_vec();
        }
    }
}
