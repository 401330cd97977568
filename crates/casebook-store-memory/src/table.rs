//! [`Table`]: one workspace-partitioned map guarded by its own lock.

use std::collections::HashMap;

use casebook_core::{
  Error, Result,
  record::{self, Opaque, Record, Sequential},
};
use tokio::sync::RwLock;

struct Bucket<R: Record> {
  rows:     HashMap<R::Id, R>,
  /// Last ID handed out by the workspace's counter.
  last_seq: i64,
}

impl<R: Record> Default for Bucket<R> {
  fn default() -> Self { Self { rows: HashMap::new(), last_seq: 0 } }
}

/// Records of one kind, partitioned by workspace.
///
/// Buckets are created lazily by the first write; reads against a missing
/// bucket behave exactly like reads against an empty one.
pub(crate) struct Table<R: Record> {
  buckets: RwLock<HashMap<String, Bucket<R>>>,
}

impl<R: Record> Default for Table<R> {
  fn default() -> Self { Self { buckets: RwLock::new(HashMap::new()) } }
}

impl<R: Record> Table<R> {
  pub async fn get(&self, workspace: &str, id: &R::Id) -> Result<R> {
    let buckets = self.buckets.read().await;
    buckets
      .get(workspace)
      .and_then(|b| b.rows.get(id))
      .cloned()
      .ok_or_else(|| Error::not_found(R::KIND, workspace, id))
  }

  pub async fn contains(&self, workspace: &str, id: &R::Id) -> bool {
    let buckets = self.buckets.read().await;
    buckets.get(workspace).is_some_and(|b| b.rows.contains_key(id))
  }

  /// Clones of every record matching `pred`, in no particular order.
  pub async fn scan(&self, workspace: &str, pred: impl Fn(&R) -> bool) -> Vec<R> {
    let buckets = self.buckets.read().await;
    buckets
      .get(workspace)
      .map(|b| b.rows.values().filter(|r| pred(*r)).cloned().collect())
      .unwrap_or_default()
  }

  /// Replace an existing record, keeping its `created_at`.
  pub async fn update(&self, workspace: &str, mut record: R) -> Result<R> {
    record.validate()?;
    let mut buckets = self.buckets.write().await;
    let id = record.id();
    let existing = buckets
      .get_mut(workspace)
      .and_then(|b| b.rows.get_mut(&id))
      .ok_or_else(|| Error::not_found(R::KIND, workspace, &id))?;

    record::stamp_updated(&mut record, existing);
    *existing = record.clone();
    Ok(record)
  }

  pub async fn remove(&self, workspace: &str, id: &R::Id) -> Result<R> {
    let mut buckets = self.buckets.write().await;
    buckets
      .get_mut(workspace)
      .and_then(|b| b.rows.remove(id))
      .ok_or_else(|| Error::not_found(R::KIND, workspace, id))
  }

  /// Remove every record matching `pred`; returns how many were removed.
  pub async fn remove_where(&self, workspace: &str, pred: impl Fn(&R) -> bool) -> usize {
    let mut buckets = self.buckets.write().await;
    let Some(bucket) = buckets.get_mut(workspace) else { return 0 };
    let before = bucket.rows.len();
    bucket.rows.retain(|_, r| !pred(&*r));
    before - bucket.rows.len()
  }
}

impl<R: Sequential> Table<R> {
  /// Insert with the next ID from the workspace counter.
  pub async fn create_sequential(&self, workspace: &str, mut record: R) -> Result<R> {
    record.validate()?;
    let mut buckets = self.buckets.write().await;
    let bucket = buckets.entry(workspace.to_owned()).or_default();
    bucket.last_seq += 1;
    record.set_id(bucket.last_seq);
    record::stamp_created(&mut record);
    bucket.rows.insert(record.id(), record.clone());
    Ok(record)
  }
}

impl<R: Opaque> Table<R> {
  /// Insert with a generated ID, or with the caller's ID if one was given.
  pub async fn create_opaque(&self, workspace: &str, mut record: R) -> Result<R> {
    record.validate()?;
    record::ensure_opaque_id(&mut record);
    record::stamp_created(&mut record);

    let mut buckets = self.buckets.write().await;
    let bucket = buckets.entry(workspace.to_owned()).or_default();
    if bucket.rows.contains_key(&record.id()) {
      return Err(Error::validation(format!(
        "{} {} already exists",
        R::KIND,
        record.id()
      )));
    }
    bucket.rows.insert(record.id(), record.clone());
    Ok(record)
  }
}
