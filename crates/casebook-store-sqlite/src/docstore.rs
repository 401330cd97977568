//! [`DocStore`]: JSON documents grouped into named collections.
//!
//! The raw layer moves document bodies in and out of SQLite and knows
//! nothing about record types. The typed layer on top maps collections to
//! [`Record`] kinds and produces the core error values (`NotFound`,
//! `Validation`) the store traits promise.
//!
//! Bulk operations are split into batches the way a hosted document store
//! requires, and every batch of one call runs inside a single transaction:
//! a call either applies all of its batches or none of them.

use std::sync::Arc;

use casebook_core::{
  Error as CoreError,
  record::{self, EntityKind, Opaque, Record, Sequential},
};
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};

use crate::{
  Error, Result,
  encode::{self, decode, decode_all, encode, in_call},
  schema::SCHEMA,
};

/// Documents written per batch.
pub const WRITE_BATCH: usize = 500;
/// Documents fetched per multi-get.
pub const GET_BATCH: usize = 20;
/// Values per `IN` filter.
pub const IN_BATCH: usize = 10;

/// `?{start}, ?{start+1}, ...` for `n` positional parameters.
fn placeholders(start: usize, n: usize) -> String {
  (start..start + n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

#[derive(Clone)]
pub(crate) struct DocStore {
  conn:   tokio_rusqlite::Connection,
  prefix: Arc<str>,
}

impl DocStore {
  pub async fn new(conn: tokio_rusqlite::Connection, prefix: &str) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, prefix: Arc::from(prefix) })
  }

  pub fn collection(&self, workspace: &str, kind: EntityKind) -> String {
    encode::workspace_collection(&self.prefix, workspace, kind)
  }

  pub fn timeline(&self, workspace: &str, case_id: i64) -> String {
    encode::timeline_collection(&self.prefix, workspace, case_id)
  }

  pub fn global(&self, name: &str) -> String { encode::global_collection(&self.prefix, name) }

  // ─── Raw documents ─────────────────────────────────────────────────────────

  pub async fn get_body(&self, collection: String, id: String) -> Result<Option<String>> {
    let body = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
              params![collection, id],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(body)
  }

  /// Bodies of the documents in `ids` that exist, fetched [`GET_BATCH`] at a
  /// time.
  pub async fn get_bodies(&self, collection: String, ids: Vec<String>) -> Result<Vec<String>> {
    let bodies = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut bodies = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(GET_BATCH) {
          let sql = format!(
            "SELECT body FROM documents WHERE collection = ?1 AND doc_id IN ({})",
            placeholders(2, chunk.len())
          );
          let mut stmt = tx.prepare(&sql)?;
          let params = std::iter::once(Value::Text(collection.clone()))
            .chain(chunk.iter().cloned().map(Value::Text));
          let rows = stmt.query_map(params_from_iter(params), |r| r.get::<_, String>(0))?;
          for row in rows {
            bodies.push(row?);
          }
        }
        tx.commit()?;
        Ok(bodies)
      })
      .await?;
    Ok(bodies)
  }

  pub async fn scan_bodies(&self, collection: String) -> Result<Vec<String>> {
    let bodies = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY doc_id")?;
        let rows = stmt.query_map(params![collection], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    Ok(bodies)
  }

  /// Bodies whose JSON field at `path` equals `value`.
  pub async fn query_bodies(
    &self,
    collection: String,
    path: &'static str,
    value: Value,
  ) -> Result<Vec<String>> {
    let bodies = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT body FROM documents
           WHERE collection = ?1 AND json_extract(body, ?2) = ?3
           ORDER BY doc_id",
        )?;
        let rows = stmt.query_map(params![collection, path, value], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    Ok(bodies)
  }

  /// Bodies whose integer field at `path` is one of `values`, filtered
  /// [`IN_BATCH`] values at a time.
  pub async fn query_bodies_in(
    &self,
    collection: String,
    path: &'static str,
    values: Vec<i64>,
  ) -> Result<Vec<String>> {
    let bodies = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut bodies = Vec::new();
        for chunk in values.chunks(IN_BATCH) {
          let sql = format!(
            "SELECT body FROM documents
             WHERE collection = ?1 AND json_extract(body, ?2) IN ({})
             ORDER BY doc_id",
            placeholders(3, chunk.len())
          );
          let mut stmt = tx.prepare(&sql)?;
          let params = [Value::Text(collection.clone()), Value::Text(path.to_owned())]
            .into_iter()
            .chain(chunk.iter().copied().map(Value::Integer));
          let rows = stmt.query_map(params_from_iter(params), |r| r.get::<_, String>(0))?;
          for row in rows {
            bodies.push(row?);
          }
        }
        tx.commit()?;
        Ok(bodies)
      })
      .await?;
    Ok(bodies)
  }

  /// IDs of the documents whose JSON field at `path` equals `value`.
  pub async fn query_ids(
    &self,
    collection: String,
    path: &'static str,
    value: Value,
  ) -> Result<Vec<String>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id FROM documents WHERE collection = ?1 AND json_extract(body, ?2) = ?3",
        )?;
        let rows = stmt.query_map(params![collection, path, value], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    Ok(ids)
  }

  /// Insert unless a document with `id` already exists; returns whether it
  /// was inserted.
  pub async fn insert_new(&self, collection: String, id: String, body: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)
           ON CONFLICT (collection, doc_id) DO NOTHING",
          params![collection, id, body],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  pub async fn upsert(&self, collection: String, id: String, body: String) -> Result<()> {
    self.put_many(collection, vec![(id, body)]).await
  }

  /// Upsert `(id, body)` pairs, [`WRITE_BATCH`] per statement.
  pub async fn put_many(&self, collection: String, docs: Vec<(String, String)>) -> Result<()> {
    if docs.is_empty() {
      return Ok(());
    }
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for chunk in docs.chunks(WRITE_BATCH) {
          let rows = (0..chunk.len())
            .map(|i| format!("(?1, ?{}, ?{})", 2 + 2 * i, 3 + 2 * i))
            .collect::<Vec<_>>()
            .join(", ");
          let sql = format!(
            "INSERT INTO documents (collection, doc_id, body) VALUES {rows}
             ON CONFLICT (collection, doc_id) DO UPDATE SET body = excluded.body"
          );
          let params = std::iter::once(Value::Text(collection.clone())).chain(
            chunk
              .iter()
              .flat_map(|(id, body)| [Value::Text(id.clone()), Value::Text(body.clone())]),
          );
          tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn delete(&self, collection: String, id: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          params![collection, id],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  /// Delete the documents in `ids`, [`WRITE_BATCH`] per statement; returns
  /// how many existed.
  pub async fn delete_ids(&self, collection: String, ids: Vec<String>) -> Result<usize> {
    if ids.is_empty() {
      return Ok(0);
    }
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        for chunk in ids.chunks(WRITE_BATCH) {
          let sql = format!(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id IN ({})",
            placeholders(2, chunk.len())
          );
          let params = std::iter::once(Value::Text(collection.clone()))
            .chain(chunk.iter().cloned().map(Value::Text));
          removed += tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed)
  }

  pub async fn all_ids(&self, collection: String) -> Result<Vec<String>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT doc_id FROM documents WHERE collection = ?1")?;
        let rows = stmt.query_map(params![collection], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    Ok(ids)
  }

  // ─── Typed records ─────────────────────────────────────────────────────────

  pub async fn get<R: Record>(&self, workspace: &str, id: &R::Id) -> casebook_core::Result<R> {
    let collection = self.collection(workspace, R::KIND);
    match self.get_body(collection.clone(), id.to_string()).await? {
      Some(body) => Ok(decode(&collection, &body)?),
      None => Err(CoreError::not_found(R::KIND, workspace, id)),
    }
  }

  pub async fn contains<R: Record>(&self, workspace: &str, id: &R::Id) -> casebook_core::Result<bool> {
    let collection = self.collection(workspace, R::KIND);
    Ok(self.get_body(collection, id.to_string()).await?.is_some())
  }

  /// Every record of kind `R` in the workspace, in document-ID order.
  pub async fn scan<R: Record>(&self, workspace: &str) -> casebook_core::Result<Vec<R>> {
    let collection = self.collection(workspace, R::KIND);
    let bodies = self.scan_bodies(collection.clone()).await?;
    Ok(decode_all(&collection, bodies)?)
  }

  pub async fn query<R: Record>(
    &self,
    workspace: &str,
    path: &'static str,
    value: Value,
  ) -> casebook_core::Result<Vec<R>> {
    let collection = self.collection(workspace, R::KIND);
    let bodies = self.query_bodies(collection.clone(), path, value).await?;
    Ok(decode_all(&collection, bodies)?)
  }

  pub async fn query_in<R: Record>(
    &self,
    workspace: &str,
    path: &'static str,
    values: &[i64],
  ) -> casebook_core::Result<Vec<R>> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values.dedup();

    let collection = self.collection(workspace, R::KIND);
    let bodies = self.query_bodies_in(collection.clone(), path, values).await?;
    Ok(decode_all(&collection, bodies)?)
  }

  /// Insert with the next value of the collection's counter as ID.
  pub async fn create_sequential<R: Sequential>(
    &self,
    workspace: &str,
    mut record: R,
  ) -> casebook_core::Result<R> {
    record.validate()?;
    record::stamp_created(&mut record);
    let collection = self.collection(workspace, R::KIND);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id: i64 = tx.query_row(
          "INSERT INTO counters (collection, value) VALUES (?1, 1)
           ON CONFLICT (collection) DO UPDATE SET value = value + 1
           RETURNING value",
          params![collection],
          |r| r.get(0),
        )?;
        record.set_id(id);
        let body = serde_json::to_string(&record).map_err(in_call)?;
        tx.execute(
          "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
          params![collection, id.to_string(), body],
        )?;
        tx.commit()?;
        Ok(record)
      })
      .await
      .map_err(Error::from)?;
    Ok(created)
  }

  /// Insert with a generated ID, or with the caller's ID if one was given.
  pub async fn create_opaque<R: Opaque>(
    &self,
    workspace: &str,
    mut record: R,
  ) -> casebook_core::Result<R> {
    record.validate()?;
    record::ensure_opaque_id(&mut record);
    record::stamp_created(&mut record);

    let collection = self.collection(workspace, R::KIND);
    let body = encode(&record)?;
    if !self.insert_new(collection, record.id(), body).await? {
      return Err(CoreError::validation(format!("{} {} already exists", R::KIND, record.id())));
    }
    Ok(record)
  }

  /// Replace an existing record, keeping its `created_at`. The read and the
  /// write share one transaction.
  pub async fn update<R: Record>(&self, workspace: &str, mut record: R) -> casebook_core::Result<R> {
    record.validate()?;
    let collection = self.collection(workspace, R::KIND);
    let id = record.id().to_string();
    let doc_id = id.clone();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, doc_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(existing) = existing else { return Ok(None) };

        let existing: R = serde_json::from_str(&existing).map_err(in_call)?;
        record::stamp_updated(&mut record, &existing);
        let body = serde_json::to_string(&record).map_err(in_call)?;
        tx.execute(
          "UPDATE documents SET body = ?3 WHERE collection = ?1 AND doc_id = ?2",
          params![collection, doc_id, body],
        )?;
        tx.commit()?;
        Ok(Some(record))
      })
      .await
      .map_err(Error::from)?;

    updated.ok_or_else(|| CoreError::not_found(R::KIND, workspace, id))
  }

  pub async fn remove<R: Record>(&self, workspace: &str, id: &R::Id) -> casebook_core::Result<()> {
    let collection = self.collection(workspace, R::KIND);
    if !self.delete(collection, id.to_string()).await? {
      return Err(CoreError::not_found(R::KIND, workspace, id));
    }
    Ok(())
  }

  /// Remove every record of kind `R` whose field at `path` equals `value`.
  pub async fn remove_where<R: Record>(
    &self,
    workspace: &str,
    path: &'static str,
    value: Value,
  ) -> casebook_core::Result<usize> {
    let collection = self.collection(workspace, R::KIND);
    let ids = self.query_ids(collection.clone(), path, value).await?;
    Ok(self.delete_ids(collection, ids).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::placeholders;

  #[test]
  fn placeholder_lists() {
    assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
    assert_eq!(placeholders(1, 1), "?1");
  }
}
