//! Installation-wide Slack user cache.

use std::{collections::HashMap, sync::Arc};

use casebook_core::{
  Error, Result, clock,
  model::{SlackUser, SlackUserMetadata},
  record::EntityKind,
  store::SlackUserStore,
};

use crate::store::Tables;

#[derive(Clone)]
pub struct SlackUsers {
  tables: Arc<Tables>,
}

impl SlackUsers {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl SlackUserStore for SlackUsers {
  async fn get_all(&self) -> Result<Vec<SlackUser>> {
    let users = self.tables.slack_users.read().await;
    Ok(users.values().cloned().collect())
  }

  async fn get_by_id(&self, id: &str) -> Result<SlackUser> {
    let users = self.tables.slack_users.read().await;
    users
      .get(id)
      .cloned()
      .ok_or_else(|| Error::global_not_found(EntityKind::SlackUser, id))
  }

  async fn get_by_ids(&self, ids: &[String]) -> Result<HashMap<String, SlackUser>> {
    let users = self.tables.slack_users.read().await;
    Ok(
      ids
        .iter()
        .filter_map(|id| users.get(id).map(|u| (id.clone(), u.clone())))
        .collect(),
    )
  }

  async fn save_many(&self, users: Vec<SlackUser>) -> Result<()> {
    let now = clock::now();
    let mut stored = self.tables.slack_users.write().await;
    for mut user in users {
      user.updated_at = now;
      stored.insert(user.id.clone(), user);
    }
    Ok(())
  }

  async fn delete_all(&self) -> Result<()> {
    self.tables.slack_users.write().await.clear();
    Ok(())
  }

  async fn get_metadata(&self) -> Result<SlackUserMetadata> {
    Ok(self.tables.slack_meta.read().await.clone().unwrap_or_default())
  }

  async fn save_metadata(&self, metadata: SlackUserMetadata) -> Result<()> {
    *self.tables.slack_meta.write().await = Some(metadata);
    Ok(())
  }
}
