//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::path::PathBuf;

use casebook_core::{
  model::{Action, Case, CaseFilter, Knowledge, SlackUser},
  store::{ActionStore, CaseStore, KnowledgeStore, Repository, SlackUserStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A fresh database path under the system temp directory.
fn temp_db() -> PathBuf {
  std::env::temp_dir().join(format!("casebook-test-{}.db", Uuid::new_v4()))
}

casebook_core::conformance_suite!(store().await);

// ─── Batching ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_many_spans_write_batches() {
  let s = store().await;
  let users: Vec<SlackUser> = (0..1200)
    .map(|i| SlackUser { id: format!("U{i:05}"), name: format!("user{i}"), ..Default::default() })
    .collect();
  s.slack_user().save_many(users).await.unwrap();

  let all = s.slack_user().get_all().await.unwrap();
  assert_eq!(all.len(), 1200);
  assert_eq!(all[1199].id, "U01199");

  s.slack_user().delete_all().await.unwrap();
  assert!(s.slack_user().get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn multi_get_spans_get_batches() {
  let s = store().await;
  let users: Vec<SlackUser> = (0..60)
    .map(|i| SlackUser { id: format!("U{i:02}"), ..Default::default() })
    .collect();
  s.slack_user().save_many(users).await.unwrap();

  let wanted: Vec<String> = (0..45).map(|i| format!("U{i:02}")).collect();
  let found = s.slack_user().get_by_ids(&wanted).await.unwrap();
  assert_eq!(found.len(), 45);
  assert!(wanted.iter().all(|id| found.contains_key(id)));
}

#[tokio::test]
async fn grouped_lookup_spans_in_batches() {
  let s = store().await;
  let mut case_ids = Vec::new();
  for i in 0..25 {
    let case = s.case().create("ws", Case::new(format!("c{i}"), "")).await.unwrap();
    s.action().create("ws", Action::new(case.id, "a")).await.unwrap();
    case_ids.push(case.id);
  }
  // Duplicates must not double up results.
  case_ids.push(case_ids[0]);

  let grouped = s.action().get_by_cases("ws", &case_ids).await.unwrap();
  assert_eq!(grouped.len(), 25);
  assert!(grouped.values().all(|actions| actions.len() == 1));
}

// ─── Collections ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn prefixes_isolate_deployments_in_one_file() {
  let path = temp_db();
  let blue = SqliteStore::open_with_prefix(&path, "blue_").await.unwrap();
  let green = SqliteStore::open_with_prefix(&path, "green_").await.unwrap();

  let b = blue.case().create("ws", Case::new("blue", "")).await.unwrap();
  let g = green.case().create("ws", Case::new("green", "")).await.unwrap();
  assert_eq!((b.id, g.id), (1, 1), "counters are per prefix");

  let listed = green.case().list("ws", CaseFilter::default()).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].title, "green");

  drop((blue, green));
  let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn overlapping_prefixes_stay_isolated() {
  let path = temp_db();
  let short = SqliteStore::open_with_prefix(&path, "t1").await.unwrap();
  let long = SqliteStore::open_with_prefix(&path, "t10").await.unwrap();

  short.case().create("0ws", Case::new("tenant t1 secret", "")).await.unwrap();
  short.case().create("a/b", Case::new("slashed workspace", "")).await.unwrap();

  assert!(long.case().list("ws", CaseFilter::default()).await.unwrap().is_empty());
  assert!(short.case().list("a", CaseFilter::default()).await.unwrap().is_empty());
  let created = long.case().create("ws", Case::new("tenant t10", "")).await.unwrap();
  assert_eq!(created.id, 1, "counters are not shared across tenants");

  drop((short, long));
  let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn data_survives_reopen() {
  let path = temp_db();
  let knowledge_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.case().create("ws", Case::new("persisted", "")).await.unwrap();
    s.knowledge()
      .create("ws", Knowledge { title: "kept".into(), embedding: vec![0.25, 0.5], ..Default::default() })
      .await
      .unwrap()
      .id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.case().get("ws", 1).await.unwrap().title, "persisted");
  let k = s.knowledge().get("ws", &knowledge_id).await.unwrap();
  assert_eq!(k.embedding, vec![0.25, 0.5]);

  // The counter carries on from where the first connection left it.
  let next = s.case().create("ws", Case::new("second", "")).await.unwrap();
  assert_eq!(next.id, 2);

  drop(s);
  let _ = std::fs::remove_file(&path);
}
