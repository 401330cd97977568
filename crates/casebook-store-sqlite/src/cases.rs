//! Case and action stores.

use std::collections::{HashMap, HashSet};

use casebook_core::{
  Result,
  field::{self, FieldType, FieldValueCount},
  model::{Action, Case, CaseFilter, Knowledge, Memory},
  store::{ActionStore, CaseStore},
};

use crate::{docstore::DocStore, encode};

// ─── Cases ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Cases {
  db: DocStore,
}

impl Cases {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }

  /// Every case in the workspace, ordered by ID.
  async fn all(&self, workspace: &str) -> Result<Vec<Case>> {
    let mut cases: Vec<Case> = self.db.scan(workspace).await?;
    cases.sort_by_key(|c| c.id);
    Ok(cases)
  }
}

impl CaseStore for Cases {
  async fn create(&self, workspace: &str, case: Case) -> Result<Case> {
    self.db.create_sequential(workspace, case).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Case> {
    self.db.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, case: Case) -> Result<Case> {
    self.db.update(workspace, case).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.db.remove::<Case>(workspace, &id).await?;

    // Each dependent collection is cleared in its own transaction.
    let case_id = encode::integer(id);
    let actions = self.db.remove_where::<Action>(workspace, "$.case_id", case_id.clone()).await?;
    let knowledge =
      self.db.remove_where::<Knowledge>(workspace, "$.case_id", case_id.clone()).await?;
    let memories = self.db.remove_where::<Memory>(workspace, "$.case_id", case_id).await?;

    tracing::debug!(workspace, case_id = id, actions, knowledge, memories, "cascaded case delete");
    Ok(())
  }

  async fn list(&self, workspace: &str, filter: CaseFilter) -> Result<Vec<Case>> {
    let mut cases: Vec<Case> = match filter.status {
      Some(status) => {
        self.db.query(workspace, "$.status", encode::text(status.to_string())).await?
      }
      None => self.db.scan(workspace).await?,
    };
    cases.retain(|c| filter.matches(c));
    cases.sort_by_key(|c| c.id);
    Ok(cases)
  }

  async fn get_by_slack_channel_id(
    &self,
    workspace: &str,
    channel_id: &str,
  ) -> Result<Option<Case>> {
    let mut matches: Vec<Case> = self
      .db
      .query(workspace, "$.slack_channel_id", encode::text(channel_id))
      .await?;
    matches.sort_by_key(|c| c.id);
    Ok(matches.into_iter().next())
  }

  async fn count_field_values(
    &self,
    workspace: &str,
    field_id: &str,
    field_type: FieldType,
    options: Option<&HashSet<String>>,
  ) -> Result<FieldValueCount> {
    let cases = self.all(workspace).await?;
    Ok(field::count_field_values(&cases, field_id, field_type, options))
  }

  async fn find_case_with_invalid_field_value(
    &self,
    workspace: &str,
    field_id: &str,
    field_type: FieldType,
    options: Option<&HashSet<String>>,
  ) -> Result<Option<Case>> {
    let cases = self.all(workspace).await?;
    Ok(field::find_invalid(&cases, field_id, field_type, options).cloned())
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Actions {
  db: DocStore,
}

impl Actions {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl ActionStore for Actions {
  async fn create(&self, workspace: &str, action: Action) -> Result<Action> {
    self.db.create_sequential(workspace, action).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Action> {
    self.db.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, action: Action) -> Result<Action> {
    self.db.update(workspace, action).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.db.remove::<Action>(workspace, &id).await
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Action>> {
    let mut actions: Vec<Action> = self.db.scan(workspace).await?;
    actions.sort_by_key(|a| a.id);
    Ok(actions)
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Action>> {
    let mut actions: Vec<Action> =
      self.db.query(workspace, "$.case_id", encode::integer(case_id)).await?;
    actions.sort_by_key(|a| a.id);
    Ok(actions)
  }

  async fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Action>>> {
    let mut actions: Vec<Action> = self.db.query_in(workspace, "$.case_id", case_ids).await?;
    actions.sort_by_key(|a| a.id);

    let mut grouped: HashMap<i64, Vec<Action>> =
      case_ids.iter().map(|id| (*id, Vec::new())).collect();
    for action in actions {
      grouped.entry(action.case_id).or_default().push(action);
    }
    Ok(grouped)
  }

  async fn get_by_slack_message_ts(&self, workspace: &str, ts: &str) -> Result<Option<Action>> {
    let mut matches: Vec<Action> =
      self.db.query(workspace, "$.slack_message_ts", encode::text(ts)).await?;
    matches.sort_by_key(|a| a.id);
    Ok(matches.into_iter().next())
  }
}
