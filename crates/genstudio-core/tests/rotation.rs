use std::sync::Arc;

use genstudio_core::{
    AuditStatus, BroadcastNotificationBus, CredentialRotatingRequester, InMemoryCredentialSource,
    MemoryAuditSink, NotificationEvent, RequestError, RequesterConfig,
};
use serde_json::json;
use tokio::sync::broadcast;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    requester: CredentialRotatingRequester,
    source: Arc<InMemoryCredentialSource>,
    audit: MemoryAuditSink,
    events: broadcast::Receiver<NotificationEvent>,
}

fn harness(source: InMemoryCredentialSource) -> Harness {
    let source = Arc::new(source);
    let audit = MemoryAuditSink::new();
    let bus = BroadcastNotificationBus::new();
    let events = bus.subscribe();
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let requester = CredentialRotatingRequester::new(
        client,
        RequesterConfig::default(),
        source.clone(),
        Arc::new(audit.clone()),
        Arc::new(bus),
    );

    Harness {
        requester,
        source,
        audit,
        events,
    }
}

fn drain(events: &mut broadcast::Receiver<NotificationEvent>) -> Vec<NotificationEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

async fn mount_for_token(server: &MockServer, token: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

/// An address nothing is listening on.
fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/generate")
}

#[tokio::test]
async fn test_first_success_stops_rotation() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "S1",
        ResponseTemplate::new(200).set_body_json(json!({"id": 1})),
        1,
    )
    .await;
    mount_for_token(&server, "S2", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;

    let mut h = harness(InMemoryCredentialSource::new().with_shared(&["S1", "S2"]));
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image Generation", None)
        .await
        .unwrap();

    assert_eq!(response.used_credential, "S1");
    assert_eq!(response.data, json!({"id": 1}));
    assert_eq!(h.audit.entries().len(), 1);
    assert_eq!(h.audit.entries()[0].status, AuditStatus::Success);
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.source.refresh_calls(), 0);
}

#[tokio::test]
async fn test_shared_quota_failure_falls_back_to_next_shared() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "S1",
        ResponseTemplate::new(500).set_body_json(json!({"error": {"message": "quota exceeded"}})),
        1,
    )
    .await;
    mount_for_token(
        &server,
        "S2",
        ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})),
        1,
    )
    .await;

    let mut h = harness(InMemoryCredentialSource::new().with_shared(&["S1", "S2"]));
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({"prompt": "cat"}), "Video", None)
        .await
        .unwrap();

    assert_eq!(response.data, json!({"result": "ok"}));
    assert_eq!(response.used_credential, "S2");

    let entries = h.audit.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].status, AuditStatus::Error);
    assert!(
        entries[0]
            .error_detail
            .as_deref()
            .unwrap()
            .contains("quota exceeded")
    );
    assert!(entries[0].redacted_detail.starts_with("Shared Credential #1"));
    assert_eq!(entries[1].status, AuditStatus::Success);
    assert!(entries[1].redacted_detail.starts_with("Shared Credential #2"));
    assert!(entries.iter().all(|e| e.context == "Video"));

    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_all_failures_return_last_error() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "P1",
        ResponseTemplate::new(401).set_body_json(json!({"message": "invalid token"})),
        1,
    )
    .await;
    mount_for_token(
        &server,
        "S1",
        ResponseTemplate::new(500).set_body_json(json!({"error": {"message": "quota exceeded"}})),
        1,
    )
    .await;
    mount_for_token(&server, "S2", ResponseTemplate::new(503).set_body_json(json!({})), 1).await;

    let mut h = harness(
        InMemoryCredentialSource::new()
            .with_personal("P1")
            .with_shared(&["S1", "S2"]),
    );
    let err = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Upscale", None)
        .await
        .unwrap_err();

    match err {
        RequestError::RemoteRejection { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "API call failed (503)");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let entries = h.audit.entries();
    // One entry per candidate plus the exhaustion summary.
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.status == AuditStatus::Error));
    assert!(entries[0].error_detail.as_deref().unwrap().contains("invalid token"));
    assert!(entries[3].description.contains("All 3"));

    assert_eq!(
        drain(&mut h.events),
        vec![NotificationEvent::PersonalTokenFailed]
    );
}

#[tokio::test]
async fn test_personal_failure_notifies_even_when_fallback_succeeds() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "P1",
        ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})),
        1,
    )
    .await;
    mount_for_token(
        &server,
        "S1",
        ResponseTemplate::new(200).set_body_json(json!({"job": "abc"})),
        1,
    )
    .await;

    let mut h = harness(
        InMemoryCredentialSource::new()
            .with_personal("P1")
            .with_shared(&["S1"]),
    );
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap();

    assert_eq!(response.used_credential, "S1");
    assert_eq!(
        drain(&mut h.events),
        vec![NotificationEvent::PersonalTokenFailed]
    );
    let entries = h.audit.entries();
    assert!(entries[0].redacted_detail.starts_with("Personal Credential"));
}

#[tokio::test]
async fn test_personal_success_is_tried_first() {
    let server = MockServer::start().await;
    mount_for_token(&server, "P1", ResponseTemplate::new(200).set_body_json(json!({})), 1).await;
    mount_for_token(&server, "S1", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;

    let mut h = harness(
        InMemoryCredentialSource::new()
            .with_personal("P1")
            .with_shared(&["S1"]),
    );
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap();

    assert_eq!(response.used_credential, "P1");
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_empty_cache_refreshes_and_persists() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(json!({"ok": true})),
        1,
    )
    .await;

    let h = harness(InMemoryCredentialSource::new().with_refresh(&["R1", "R2"]));
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap();

    assert_eq!(response.used_credential, "R1");
    assert_eq!(h.source.refresh_calls(), 1);
    assert_eq!(h.source.persist_calls(), 1);
    let cached: Vec<_> = h.source.cached().into_iter().map(|c| c.value).collect();
    assert_eq!(cached, vec!["R1", "R2"]);
}

#[tokio::test]
async fn test_failed_refresh_without_personal_has_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(InMemoryCredentialSource::new().with_refresh_error("pool offline"));
    let err = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Inpaint", None)
        .await
        .unwrap_err();

    assert!(err.is_no_credentials());
    assert!(err.to_string().contains("Inpaint"));
    assert_eq!(h.source.refresh_calls(), 1);
    assert_eq!(h.source.persist_calls(), 0);
    assert!(h.audit.entries().is_empty());
}

#[tokio::test]
async fn test_empty_refresh_without_personal_has_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(InMemoryCredentialSource::new().with_refresh(&[]));
    let err = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Inpaint", None)
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::NoCredentialsAvailable { .. }));
    assert_eq!(h.source.refresh_calls(), 1);
    // A successful but empty refresh is still written back to the cache.
    assert_eq!(h.source.persist_calls(), 1);
    assert!(h.source.cached().is_empty());
    assert!(h.audit.entries().is_empty());
}

#[tokio::test]
async fn test_cached_shared_skips_refresh() {
    let server = MockServer::start().await;
    mount_for_token(&server, "S1", ResponseTemplate::new(200).set_body_json(json!({})), 1).await;

    let h = harness(
        InMemoryCredentialSource::new()
            .with_shared(&["S1"])
            .with_refresh(&["R1"]),
    );
    h.requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap();

    assert_eq!(h.source.refresh_calls(), 0);
}

#[tokio::test]
async fn test_explicit_credential_bypasses_sources() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "E1",
        ResponseTemplate::new(200).set_body_json(json!({"status": "done"})),
        1,
    )
    .await;
    mount_for_token(&server, "P1", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;
    mount_for_token(&server, "S1", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;

    let h = harness(
        InMemoryCredentialSource::new()
            .with_personal("P1")
            .with_shared(&["S1"]),
    );
    let response = h
        .requester
        .execute(
            &format!("{}/generate", server.uri()),
            &json!({"job_id": "abc"}),
            "Status Poll",
            Some("E1"),
        )
        .await
        .unwrap();

    assert_eq!(response.used_credential, "E1");
    assert_eq!(h.source.personal_reads(), 0);
    assert_eq!(h.source.refresh_calls(), 0);
    assert!(h.audit.entries()[0].redacted_detail.starts_with("Explicit Credential"));
}

#[tokio::test]
async fn test_explicit_credential_failure_does_not_notify() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "E1",
        ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden"})),
        1,
    )
    .await;

    let mut h = harness(InMemoryCredentialSource::new().with_personal("P1"));
    let err = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Status Poll", Some("E1"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "forbidden");
    assert_eq!(err.status(), Some(403));
    assert!(drain(&mut h.events).is_empty());
    // One failed attempt plus the exhaustion summary.
    assert_eq!(h.audit.errors().len(), 2);
}

#[tokio::test]
async fn test_personal_network_failure_is_returned() {
    let mut h = harness(InMemoryCredentialSource::new().with_personal("P1"));
    let err = h
        .requester
        .execute(&closed_endpoint(), &json!({}), "Image", None)
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Network(_)));
    assert_eq!(h.source.refresh_calls(), 1);
    assert_eq!(
        drain(&mut h.events),
        vec![NotificationEvent::PersonalTokenFailed]
    );
    assert_eq!(h.audit.errors().len(), 2);
}

#[tokio::test]
async fn test_malformed_body_is_attempt_error() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "S1",
        ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
        1,
    )
    .await;
    mount_for_token(
        &server,
        "S2",
        ResponseTemplate::new(502).set_body_string("Bad Gateway"),
        1,
    )
    .await;

    let h = harness(InMemoryCredentialSource::new().with_shared(&["S1", "S2"]));
    let err = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap_err();

    // A non-JSON body wins over the HTTP status.
    assert!(matches!(err, RequestError::MalformedResponse(_)));
    assert_eq!(h.audit.errors().len(), 3);
}

#[tokio::test]
async fn test_request_carries_payload_and_headers() {
    let server = MockServer::start().await;
    let payload = json!({"prompt": "a red fox", "steps": 30, "loras": ["film"]});
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("Authorization", "Bearer S1"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queued": true})))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(InMemoryCredentialSource::new().with_shared(&["S1"]));
    let response = h
        .requester
        .execute(&format!("{}/generate", server.uri()), &payload, "Image", None)
        .await
        .unwrap();

    assert_eq!(response.data, json!({"queued": true}));
}

#[tokio::test]
async fn test_audit_never_leaks_full_token() {
    let server = MockServer::start().await;
    mount_for_token(
        &server,
        "shared-secret-token-a9f3",
        ResponseTemplate::new(200).set_body_json(json!({})),
        1,
    )
    .await;

    let h = harness(InMemoryCredentialSource::new().with_shared(&["shared-secret-token-a9f3"]));
    h.requester
        .execute(&format!("{}/generate", server.uri()), &json!({}), "Image", None)
        .await
        .unwrap();

    let entries = h.audit.entries();
    let entry = &entries[0];
    assert_eq!(entry.redacted_detail, "Shared Credential #1 (...a9f3)");
    assert!(!entry.description.contains("shared-secret"));
}
