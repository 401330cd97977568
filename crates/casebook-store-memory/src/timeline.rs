//! Per-case timelines: mirrored Slack messages and assistant run logs.

use std::sync::Arc;

use casebook_core::{
  Result,
  model::{AssistLog, CaseMessage},
  pagination::{self, Cursor, Page},
  store::{AssistLogStore, CaseMessageStore},
};
use chrono::{DateTime, Utc};

use crate::store::Tables;

// ─── Case messages ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CaseMessages {
  tables: Arc<Tables>,
}

impl CaseMessages {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl CaseMessageStore for CaseMessages {
  async fn put(&self, workspace: &str, message: CaseMessage) -> Result<CaseMessage> {
    let mut timelines = self.tables.case_messages.write().await;
    timelines
      .entry((workspace.to_owned(), message.case_id))
      .or_default()
      .insert(message.id.clone(), message.clone());
    Ok(message)
  }

  async fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<CaseMessage>> {
    let messages: Vec<CaseMessage> = {
      let timelines = self.tables.case_messages.read().await;
      timelines
        .get(&(workspace.to_owned(), case_id))
        .map(|t| t.values().cloned().collect())
        .unwrap_or_default()
    };
    pagination::paginate(messages, limit, cursor)
  }

  async fn prune(&self, workspace: &str, case_id: i64, before: DateTime<Utc>) -> Result<usize> {
    let mut timelines = self.tables.case_messages.write().await;
    let Some(timeline) = timelines.get_mut(&(workspace.to_owned(), case_id)) else {
      return Ok(0);
    };
    let count = timeline.len();
    timeline.retain(|_, m| m.created_at >= before);
    let removed = count - timeline.len();

    tracing::debug!(workspace, case_id, removed, "pruned case messages");
    Ok(removed)
  }
}

// ─── Assist logs ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AssistLogs {
  tables: Arc<Tables>,
}

impl AssistLogs {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl AssistLogStore for AssistLogs {
  async fn create(&self, workspace: &str, log: AssistLog) -> Result<AssistLog> {
    self.tables.assist_logs.create_opaque(workspace, log).await
  }

  async fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<AssistLog>> {
    let logs = self.tables.assist_logs.scan(workspace, |l| l.case_id == case_id).await;
    pagination::paginate(logs, limit, cursor)
  }
}
