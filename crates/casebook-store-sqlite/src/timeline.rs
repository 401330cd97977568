//! Per-case timelines: mirrored Slack messages and assistant run logs.

use casebook_core::{
  Result,
  model::{AssistLog, CaseMessage},
  pagination::{self, Cursor, Page},
  store::{AssistLogStore, CaseMessageStore},
};
use chrono::{DateTime, Utc};

use crate::{
  docstore::DocStore,
  encode::{self, decode_all},
};

// ─── Case messages ───────────────────────────────────────────────────────────

/// Messages live in a sub-collection per case, keyed by Slack message ID.
#[derive(Clone)]
pub struct CaseMessages {
  db: DocStore,
}

impl CaseMessages {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }

  async fn timeline(&self, workspace: &str, case_id: i64) -> Result<Vec<CaseMessage>> {
    let collection = self.db.timeline(workspace, case_id);
    let bodies = self.db.scan_bodies(collection.clone()).await?;
    Ok(decode_all(&collection, bodies)?)
  }
}

impl CaseMessageStore for CaseMessages {
  async fn put(&self, workspace: &str, message: CaseMessage) -> Result<CaseMessage> {
    let collection = self.db.timeline(workspace, message.case_id);
    let body = encode::encode(&message)?;
    self.db.upsert(collection, message.id.clone(), body).await?;
    Ok(message)
  }

  async fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<CaseMessage>> {
    let messages = self.timeline(workspace, case_id).await?;
    pagination::paginate(messages, limit, cursor)
  }

  async fn prune(&self, workspace: &str, case_id: i64, before: DateTime<Utc>) -> Result<usize> {
    let stale: Vec<String> = self
      .timeline(workspace, case_id)
      .await?
      .into_iter()
      .filter(|m| m.created_at < before)
      .map(|m| m.id)
      .collect();

    let collection = self.db.timeline(workspace, case_id);
    let removed = self.db.delete_ids(collection, stale).await?;

    tracing::debug!(workspace, case_id, removed, "pruned case messages");
    Ok(removed)
  }
}

// ─── Assist logs ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AssistLogs {
  db: DocStore,
}

impl AssistLogs {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl AssistLogStore for AssistLogs {
  async fn create(&self, workspace: &str, log: AssistLog) -> Result<AssistLog> {
    self.db.create_opaque(workspace, log).await
  }

  async fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<AssistLog>> {
    let logs: Vec<AssistLog> =
      self.db.query(workspace, "$.case_id", encode::integer(case_id)).await?;
    pagination::paginate(logs, limit, cursor)
  }
}
