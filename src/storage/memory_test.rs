use super::*;

#[test]
fn set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k"), None);

    store.set("k", "v1", None);
    assert_eq!(store.get("k").as_deref(), Some("v1"));

    store.set("k", "v2", Some(Duration::from_secs(60)));
    assert_eq!(store.get("k").as_deref(), Some("v2"));
    assert_eq!(store.len(), 1);

    store.remove("k");
    assert_eq!(store.get("k"), None);
    assert!(store.is_empty());
}

#[test]
fn expired_entries_read_as_none() {
    let store = MemoryStore::new();
    store.set("gone", "x", Some(Duration::ZERO));
    assert_eq!(store.get("gone"), None);
    assert!(store.is_empty());
}

#[test]
fn removing_missing_key_is_noop() {
    let store = MemoryStore::new();
    store.remove("nope");
    assert!(store.is_empty());
}
