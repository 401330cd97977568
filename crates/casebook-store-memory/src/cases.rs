//! Case and action stores.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use casebook_core::{
  Result,
  field::{self, FieldType, FieldValueCount},
  model::{Action, Case, CaseFilter},
  store::{ActionStore, CaseStore},
};

use crate::store::Tables;

// ─── Cases ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Cases {
  tables: Arc<Tables>,
}

impl Cases {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }

  /// Every case in the workspace, ordered by ID.
  async fn all(&self, workspace: &str) -> Vec<Case> {
    let mut cases = self.tables.cases.scan(workspace, |_| true).await;
    cases.sort_by_key(|c| c.id);
    cases
  }
}

impl CaseStore for Cases {
  async fn create(&self, workspace: &str, case: Case) -> Result<Case> {
    self.tables.cases.create_sequential(workspace, case).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Case> {
    self.tables.cases.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, case: Case) -> Result<Case> {
    self.tables.cases.update(workspace, case).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.tables.cases.remove(workspace, &id).await?;

    // Each dependent table is locked on its own; readers may briefly observe
    // children of a case that is already gone.
    let actions = self.tables.actions.remove_where(workspace, |a| a.case_id == id).await;
    let knowledge = self.tables.knowledge.remove_where(workspace, |k| k.case_id == id).await;
    let memories = self.tables.memories.remove_where(workspace, |m| m.case_id == id).await;

    tracing::debug!(workspace, case_id = id, actions, knowledge, memories, "cascaded case delete");
    Ok(())
  }

  async fn list(&self, workspace: &str, filter: CaseFilter) -> Result<Vec<Case>> {
    let mut cases = self.tables.cases.scan(workspace, |c| filter.matches(c)).await;
    cases.sort_by_key(|c| c.id);
    Ok(cases)
  }

  async fn get_by_slack_channel_id(
    &self,
    workspace: &str,
    channel_id: &str,
  ) -> Result<Option<Case>> {
    let mut matches = self
      .tables
      .cases
      .scan(workspace, |c| c.slack_channel_id.as_deref() == Some(channel_id))
      .await;
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
    let cases = self.all(workspace).await;
    Ok(field::count_field_values(&cases, field_id, field_type, options))
  }

  async fn find_case_with_invalid_field_value(
    &self,
    workspace: &str,
    field_id: &str,
    field_type: FieldType,
    options: Option<&HashSet<String>>,
  ) -> Result<Option<Case>> {
    let cases = self.all(workspace).await;
    Ok(field::find_invalid(&cases, field_id, field_type, options).cloned())
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Actions {
  tables: Arc<Tables>,
}

impl Actions {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl ActionStore for Actions {
  async fn create(&self, workspace: &str, action: Action) -> Result<Action> {
    self.tables.actions.create_sequential(workspace, action).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Action> {
    self.tables.actions.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, action: Action) -> Result<Action> {
    self.tables.actions.update(workspace, action).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.tables.actions.remove(workspace, &id).await.map(|_| ())
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Action>> {
    let mut actions = self.tables.actions.scan(workspace, |_| true).await;
    actions.sort_by_key(|a| a.id);
    Ok(actions)
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Action>> {
    let mut actions = self.tables.actions.scan(workspace, |a| a.case_id == case_id).await;
    actions.sort_by_key(|a| a.id);
    Ok(actions)
  }

  async fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Action>>> {
    let wanted: HashSet<i64> = case_ids.iter().copied().collect();
    let mut actions = self.tables.actions.scan(workspace, |a| wanted.contains(&a.case_id)).await;
    actions.sort_by_key(|a| a.id);

    let mut grouped: HashMap<i64, Vec<Action>> =
      case_ids.iter().map(|id| (*id, Vec::new())).collect();
    for action in actions {
      grouped.entry(action.case_id).or_default().push(action);
    }
    Ok(grouped)
  }

  async fn get_by_slack_message_ts(&self, workspace: &str, ts: &str) -> Result<Option<Action>> {
    let mut matches = self
      .tables
      .actions
      .scan(workspace, |a| a.slack_message_ts.as_deref() == Some(ts))
      .await;
    matches.sort_by_key(|a| a.id);
    Ok(matches.into_iter().next())
  }
}
