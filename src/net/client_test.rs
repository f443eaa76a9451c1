use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::*;
use crate::net::test_helpers::{ScriptedTransport, token_not_valid_body};
use crate::net::types::{CREDENTIALS_NOT_PROVIDED_DETAIL, Method};
use crate::storage::MemoryStore;

fn client() -> (Arc<ScriptedTransport>, ApiClient) {
    let transport = Arc::new(ScriptedTransport::new());
    let tokens = TokenStorage::new(Arc::new(MemoryStore::new()));
    let client = ApiClient::new(transport.clone(), tokens);
    (transport, client)
}

fn counting_hook() -> (Arc<AtomicUsize>, Arc<dyn AuthFailureHook>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let hook: Arc<dyn AuthFailureHook> = Arc::new(move |_: &ApiError| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (hits, hook)
}

// =============================================================================
// Outgoing middleware
// =============================================================================

#[tokio::test]
async fn bearer_header_attached_when_token_present() {
    let (transport, client) = client();
    client.tokens().set_token("abc.def.ghi");
    transport.ok(200, json!([]));

    client.get("/snippets/", &[]).await.unwrap();

    assert_eq!(transport.last_request().authorization.as_deref(), Some("Bearer abc.def.ghi"));
}

#[tokio::test]
async fn no_header_without_token() {
    let (transport, client) = client();
    transport.ok(200, json!([]));

    client.get("/search/", &[]).await.unwrap();

    assert_eq!(transport.last_request().authorization, None);
}

#[tokio::test]
async fn token_is_reread_for_every_request() {
    let (transport, client) = client();
    transport.ok(200, Value::Null).ok(200, Value::Null).ok(200, Value::Null);

    client.tokens().set_token("first");
    client.get("/profile/", &[]).await.unwrap();
    client.tokens().set_token("second");
    client.get("/profile/", &[]).await.unwrap();
    client.tokens().remove_tokens();
    client.get("/profile/", &[]).await.unwrap();

    let auths: Vec<_> = transport
        .requests()
        .into_iter()
        .map(|r| r.authorization)
        .collect();
    assert_eq!(
        auths,
        vec![Some("Bearer first".to_owned()), Some("Bearer second".to_owned()), None]
    );
}

#[tokio::test]
async fn helpers_build_expected_requests() {
    let (transport, client) = client();
    for _ in 0..4 {
        transport.ok(200, Value::Null);
    }

    client
        .get("/search/", &[("q".to_owned(), "rust".to_owned())])
        .await
        .unwrap();
    client.post("/snippets/", json!({ "title": "t" })).await.unwrap();
    client.put("/snippets/3/", json!({ "title": "u" })).await.unwrap();
    client.delete("/snippets/3/").await.unwrap();

    let reqs = transport.requests();
    assert_eq!(reqs[0].method, Method::Get);
    assert_eq!(reqs[0].query, vec![("q".to_owned(), "rust".to_owned())]);
    assert_eq!(reqs[1].method, Method::Post);
    assert_eq!(reqs[1].body, Some(json!({ "title": "t" })));
    assert_eq!(reqs[2].method, Method::Put);
    assert_eq!(reqs[2].path, "/snippets/3/");
    assert_eq!(reqs[3].method, Method::Delete);
    assert_eq!(reqs[3].body, None);
}

// =============================================================================
// Incoming middleware
// =============================================================================

#[tokio::test]
async fn success_response_passes_through() {
    let (transport, client) = client();
    transport.ok(200, json!({ "results": [], "count": 0 }));

    let resp = client.get("/snippets/", &[]).await.unwrap();
    assert_eq!(resp, ApiResponse { status: 200, body: json!({ "results": [], "count": 0 }) });
}

#[tokio::test]
async fn invalid_token_fires_hook_and_is_reraised() {
    let (transport, client) = client();
    let (hits, hook) = counting_hook();
    client.install_auth_failure_hook(hook).unwrap();
    transport.ok(401, token_not_valid_body());

    let err = client.get("/snippets/", &[]).await.unwrap_err();

    assert!(matches!(err, ApiError::AuthInvalidated { status: 401, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn credentials_not_provided_fires_hook() {
    let (transport, client) = client();
    let (hits, hook) = counting_hook();
    client.install_auth_failure_hook(hook).unwrap();
    transport.ok(403, json!({ "detail": CREDENTIALS_NOT_PROVIDED_DETAIL }));

    let err = client.delete("/snippets/9/").await.unwrap_err();

    assert!(matches!(err, ApiError::AuthInvalidated { status: 403, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ordinary_failures_do_not_fire_hook() {
    let (transport, client) = client();
    let (hits, hook) = counting_hook();
    client.install_auth_failure_hook(hook).unwrap();
    transport
        .ok(404, json!({ "detail": "Not found." }))
        .ok(500, json!("<h1>Server Error</h1>"))
        .push(Err(ApiError::Timeout));

    let e1 = client.get("/snippet/detail/1/", &[]).await.unwrap_err();
    let e2 = client.get("/snippets/", &[]).await.unwrap_err();
    let e3 = client.get("/snippets/", &[]).await.unwrap_err();

    assert!(matches!(e1, ApiError::Status { status: 404, .. }));
    assert!(matches!(e2, ApiError::Status { status: 500, .. }));
    assert!(matches!(e3, ApiError::Timeout));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_failure_without_hook_is_still_tagged() {
    let (transport, client) = client();
    transport.ok(401, token_not_valid_body());

    let err = client.get("/profile/", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::AuthInvalidated { .. }));
}

#[test]
fn hook_installs_only_once() {
    let (_transport, client) = client();
    let (_, first) = counting_hook();
    let (_, second) = counting_hook();

    assert!(!client.has_auth_failure_hook());
    assert_eq!(client.install_auth_failure_hook(first), Ok(()));
    assert_eq!(client.install_auth_failure_hook(second), Err(HookAlreadyInstalled));
    assert!(client.has_auth_failure_hook());
}
