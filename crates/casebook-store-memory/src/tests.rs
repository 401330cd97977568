//! Tests for `InMemoryStore`.

use std::collections::HashSet;

use casebook_core::{
  model::{Action, Case, CaseFilter, Knowledge},
  pagination::Cursor,
  store::{ActionStore, CaseStore, KnowledgeStore, Repository},
};

use crate::InMemoryStore;

casebook_core::conformance_suite!(InMemoryStore::new());

// ─── Adapter specifics ───────────────────────────────────────────────────────

#[tokio::test]
async fn clones_share_state() {
  let a = InMemoryStore::new();
  let b = a.clone();

  let created = a.case().create("ws", Case::new("shared", "")).await.unwrap();
  let fetched = b.case().get("ws", created.id).await.unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn separate_stores_do_not_share_state() {
  let a = InMemoryStore::new();
  let b = InMemoryStore::default();

  a.case().create("ws", Case::new("only a", "")).await.unwrap();
  assert!(b.case().list("ws", CaseFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
  let store = InMemoryStore::new();

  let mut handles = Vec::new();
  for i in 0..32 {
    let store = store.clone();
    handles.push(tokio::spawn(async move {
      store.case().create("ws", Case::new(format!("c{i}"), "")).await.unwrap().id
    }));
  }

  let mut ids = HashSet::new();
  for handle in handles {
    ids.insert(handle.await.unwrap());
  }
  assert_eq!(ids, (1..=32).collect::<HashSet<i64>>());
}

#[tokio::test]
async fn cascade_only_touches_its_workspace() {
  let store = InMemoryStore::new();
  let c1 = store.case().create("ws1", Case::new("c", "")).await.unwrap();
  let c2 = store.case().create("ws2", Case::new("c", "")).await.unwrap();
  assert_eq!(c1.id, c2.id);

  store.action().create("ws1", Action::new(c1.id, "a")).await.unwrap();
  store.action().create("ws2", Action::new(c2.id, "a")).await.unwrap();

  store.case().delete("ws1", c1.id).await.unwrap();
  assert_eq!(store.action().get_by_case("ws2", c2.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_cursor_is_rejected() {
  let store = InMemoryStore::new();
  store
    .knowledge()
    .create("ws", Knowledge { title: "k".into(), ..Default::default() })
    .await
    .unwrap();

  let bogus: Cursor = serde_json_cursor("%%% not base64 %%%");
  let err = store.knowledge().list_paged("ws", 10, Some(&bogus)).await.unwrap_err();
  assert!(err.is_validation());
}

#[tokio::test]
async fn default_page_size_applies_to_zero_limit() {
  let store = InMemoryStore::new();
  for i in 0..120 {
    store
      .knowledge()
      .create("ws", Knowledge { title: format!("k{i}"), ..Default::default() })
      .await
      .unwrap();
  }

  let first = store.knowledge().list_paged("ws", 0, None).await.unwrap();
  assert_eq!(first.items.len(), 100);
  let rest = store
    .knowledge()
    .list_paged("ws", 0, first.next_cursor.as_ref())
    .await
    .unwrap();
  assert_eq!(rest.items.len(), 20);
  assert!(rest.next_cursor.is_none());
}

/// `Cursor` cannot be built from an arbitrary string through `FromStr`
/// (which validates), so go through its transparent serde form.
fn serde_json_cursor(raw: &str) -> Cursor {
  serde_json::from_value(serde_json::Value::String(raw.to_owned())).unwrap()
}
