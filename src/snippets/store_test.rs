use serde_json::json;

use super::*;
use crate::net::Method;
use crate::net::test_helpers::ScriptedTransport;
use crate::storage::{MemoryStore, TokenStorage};

fn store() -> (Arc<ScriptedTransport>, SnippetStore) {
    let transport = Arc::new(ScriptedTransport::new());
    let tokens = TokenStorage::new(Arc::new(MemoryStore::new()));
    let client = Arc::new(ApiClient::new(transport.clone(), tokens));
    (transport, SnippetStore::new(client))
}

fn snippet(id: i64, title: &str) -> Value {
    json!({ "id": id, "title": title, "code": "print(1)", "language": "python" })
}

fn page(ids: &[i64], count: u64) -> Value {
    let results: Vec<Value> = ids.iter().map(|id| snippet(*id, &format!("s{id}"))).collect();
    json!({ "count": count, "next": null, "previous": null, "results": results })
}

fn ids(snippets: &[Snippet]) -> Vec<SnippetId> {
    snippets.iter().map(|s| s.id.clone()).collect()
}

fn int_ids(raw: &[i64]) -> Vec<SnippetId> {
    raw.iter().copied().map(SnippetId::from).collect()
}

/// Load `[1, 2, 3]` into the collection.
async fn seeded() -> (Arc<ScriptedTransport>, SnippetStore) {
    let (transport, store) = store();
    transport.ok(200, page(&[1, 2, 3], 3));
    store.list(&QueryParams::new()).await.unwrap();
    (transport, store)
}

// =============================================================================
// defaults
// =============================================================================

#[test]
fn initial_state() {
    let (_t, store) = store();
    let s = store.snapshot();
    assert!(s.snippets.is_empty());
    assert!(s.search_results.is_empty());
    assert!(s.current.is_none());
    assert_eq!(s.total_pages, 1);
    assert_eq!(s.current_page, 1);
}

// =============================================================================
// list / search
// =============================================================================

#[tokio::test]
async fn list_replaces_collection_and_page_count() {
    let (transport, store) = store();
    transport.ok(200, page(&[4, 5], 95));

    let result = store
        .list(&QueryParams::new().page(3))
        .await
        .unwrap();

    assert_eq!(result.count, 95);
    let s = store.snapshot();
    assert_eq!(ids(&s.snippets), int_ids(&[4, 5]));
    assert_eq!(s.total_pages, 10);
    assert_eq!(s.current_page, 3);

    let req = transport.last_request();
    assert_eq!((req.method, req.path.as_str()), (Method::Get, "/snippets/"));
    assert_eq!(req.query, vec![("page".to_owned(), "3".to_owned())]);
}

#[tokio::test]
async fn list_with_zero_results_has_zero_pages() {
    let (transport, store) = store();
    transport.ok(200, page(&[], 0));

    store.list(&QueryParams::new()).await.unwrap();

    assert_eq!(store.total_pages(), 0);
    assert!(store.snippets().is_empty());
}

#[tokio::test]
async fn search_fills_search_results_only() {
    let (transport, store) = seeded().await;
    transport.ok(200, page(&[9], 21));

    store
        .search(&QueryParams::new().search("fizz"))
        .await
        .unwrap();

    let s = store.snapshot();
    assert_eq!(ids(&s.search_results), int_ids(&[9]));
    assert_eq!(ids(&s.snippets), int_ids(&[1, 2, 3]));
    assert_eq!(s.total_pages, 3);
    assert_eq!(transport.last_request().path, "/search/");
    assert_eq!(transport.last_request().query, vec![("search".to_owned(), "fizz".to_owned())]);
}

#[tokio::test]
async fn list_failure_keeps_previous_state() {
    let (transport, store) = seeded().await;
    transport.ok(500, json!({ "detail": "boom" }));

    let err = store.list(&QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(ids(&store.snippets()), int_ids(&[1, 2, 3]));
}

#[tokio::test]
async fn malformed_page_is_decode_error() {
    let (transport, store) = store();
    transport.ok(200, json!({ "items": [] }));

    let err = store.list(&QueryParams::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

// =============================================================================
// get
// =============================================================================

#[tokio::test]
async fn get_sets_current_snippet() {
    let (transport, store) = store();
    transport.ok(200, snippet(8, "detail"));

    let got = store.get(&SnippetId::Int(8)).await.unwrap();

    assert_eq!(got.field("title"), Some(&json!("detail")));
    assert_eq!(store.current(), Some(got));
    assert_eq!(transport.last_request().path, "/snippet/detail/8/");
}

// =============================================================================
// create
// =============================================================================

#[tokio::test]
async fn create_prepends_and_list_restores_server_order() {
    let (transport, store) = seeded().await;
    transport.ok(201, snippet(10, "new"));

    let created = store
        .create(&json!({ "title": "new", "code": "x", "language": "rust" }))
        .await
        .unwrap();

    assert_eq!(created.id, SnippetId::Int(10));
    assert_eq!(ids(&store.snippets()), int_ids(&[10, 1, 2, 3]));
    let req = transport.last_request();
    assert_eq!((req.method, req.path.as_str()), (Method::Post, "/snippets/"));

    transport.ok(200, page(&[1, 10, 2, 3], 4));
    store.list(&QueryParams::new()).await.unwrap();
    assert_eq!(ids(&store.snippets()), int_ids(&[1, 10, 2, 3]));
}

#[tokio::test]
async fn create_failure_leaves_collection() {
    let (transport, store) = seeded().await;
    transport.ok(400, json!({ "code": ["This field may not be blank."] }));

    let err = store.create(&json!({ "title": "t" })).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(ids(&store.snippets()), int_ids(&[1, 2, 3]));
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn update_replaces_in_place_and_sets_current() {
    let (transport, store) = seeded().await;
    transport.ok(200, snippet(2, "renamed"));

    store
        .update(&SnippetId::Int(2), &json!({ "title": "renamed" }))
        .await
        .unwrap();

    let s = store.snapshot();
    assert_eq!(ids(&s.snippets), int_ids(&[1, 2, 3]));
    assert_eq!(s.snippets[1].field("title"), Some(&json!("renamed")));
    assert_eq!(s.current.as_ref().map(|c| &c.id), Some(&SnippetId::Int(2)));
    let req = transport.last_request();
    assert_eq!((req.method, req.path.as_str()), (Method::Put, "/snippets/2/"));
}

#[tokio::test]
async fn update_of_unloaded_snippet_sets_current_only() {
    let (transport, store) = seeded().await;
    transport.ok(200, snippet(77, "elsewhere"));

    store
        .update(&SnippetId::Int(77), &json!({ "title": "elsewhere" }))
        .await
        .unwrap();

    let s = store.snapshot();
    assert_eq!(ids(&s.snippets), int_ids(&[1, 2, 3]));
    assert_eq!(s.current.map(|c| c.id), Some(SnippetId::Int(77)));
}

// =============================================================================
// delete
// =============================================================================

#[tokio::test]
async fn delete_removes_exactly_the_match() {
    let (transport, store) = seeded().await;
    transport.ok(204, Value::Null);

    store.delete(&SnippetId::Int(2)).await.unwrap();

    assert_eq!(ids(&store.snippets()), int_ids(&[1, 3]));
    let req = transport.last_request();
    assert_eq!((req.method, req.path.as_str()), (Method::Delete, "/snippets/2/"));
}

#[tokio::test]
async fn delete_matches_string_ids_from_the_server() {
    let (transport, store) = store();
    transport
        .ok(200, json!({ "count": 2, "results": [{ "id": "12" }, { "id": "13" }] }))
        .ok(204, Value::Null);
    store.list(&QueryParams::new()).await.unwrap();

    store.delete(&SnippetId::from("12")).await.unwrap();

    assert_eq!(ids(&store.snippets()), vec![SnippetId::Text("13".into())]);
    assert_eq!(transport.last_request().path, "/snippets/12/");
}

#[tokio::test]
async fn delete_unknown_id_still_calls_server() {
    let (transport, store) = seeded().await;
    transport.ok(204, Value::Null);

    store.delete(&SnippetId::Int(99)).await.unwrap();

    assert_eq!(ids(&store.snippets()), int_ids(&[1, 2, 3]));
    assert_eq!(transport.last_request().path, "/snippets/99/");
}

#[tokio::test]
async fn delete_failure_keeps_entry() {
    let (transport, store) = seeded().await;
    transport.ok(404, json!({ "detail": "Not found." }));

    assert!(store.delete(&SnippetId::Int(1)).await.is_err());
    assert_eq!(ids(&store.snippets()), int_ids(&[1, 2, 3]));
}

// =============================================================================
// analytics
// =============================================================================

#[tokio::test]
async fn analytics_returns_raw_response_without_mutation() {
    let (transport, store) = seeded().await;
    let before = store.snapshot();
    transport.ok(200, json!({ "views": 12, "copies": 3 }));

    let resp = store.analytics(&SnippetId::Int(1)).await.unwrap();

    assert_eq!(resp, ApiResponse { status: 200, body: json!({ "views": 12, "copies": 3 }) });
    assert_eq!(store.snapshot(), before);
    assert_eq!(transport.last_request().path, "/snippets/1/analytics/");
}

#[test]
fn paths_format_ids() {
    let id = SnippetId::Text("abc".into());
    assert_eq!(detail_path(&id), "/snippet/detail/abc/");
    assert_eq!(item_path(&id), "/snippets/abc/");
    assert_eq!(analytics_path(&id), "/snippets/abc/analytics/");
}
