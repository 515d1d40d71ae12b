//! CLI setup module
//!
//! Wires the GenStudio request layer together for CLI usage.

use anyhow::{Context, Result};
use genstudio_core::{
    AuditSink, BroadcastNotificationBus, CredentialRotatingRequester, FanoutAuditSink,
    HttpSharedCredentialFetcher, MemoryAuditSink, ProfileStore, SessionCache,
    StoreCredentialSource, TracingAuditSink, build_http_client,
};
use std::sync::Arc;

use crate::config::CliConfig;

/// Everything a command needs to issue rotating requests
pub struct Session {
    pub requester: CredentialRotatingRequester,
    pub bus: BroadcastNotificationBus,
    pub audit: MemoryAuditSink,
}

/// Open the user profile configured for this CLI
pub fn open_profile(config: &CliConfig) -> Result<ProfileStore> {
    let path = config.profile_path()?;
    ProfileStore::load(&path).with_context(|| format!("Failed to load profile {}", path.display()))
}

/// Build the requester from config: profile, seeded cache and shared pool
pub fn prepare_session(config: &CliConfig) -> Result<Session> {
    let client = build_http_client(&config.http).context("Failed to build HTTP client")?;

    let mut source = StoreCredentialSource::new(SessionCache::seeded(
        config.credentials.seeded_shared(),
    ))
    .with_profile(Arc::new(open_profile(config)?));

    if let Some(url) = &config.credentials.shared_pool_url {
        source = source.with_fetcher(Arc::new(HttpSharedCredentialFetcher::new(
            client.clone(),
            url.clone(),
        )));
    }

    let audit = MemoryAuditSink::new();
    let sinks: Vec<Arc<dyn AuditSink>> = vec![Arc::new(TracingAuditSink), Arc::new(audit.clone())];
    let bus = BroadcastNotificationBus::new();

    let requester = CredentialRotatingRequester::new(
        client,
        config.http.clone(),
        Arc::new(source),
        Arc::new(FanoutAuditSink::new(sinks)),
        Arc::new(bus.clone()),
    );

    Ok(Session {
        requester,
        bus,
        audit,
    })
}
