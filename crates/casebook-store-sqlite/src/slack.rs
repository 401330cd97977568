//! Installation-wide Slack user cache.

use std::collections::HashMap;

use casebook_core::{
  Error, Result, clock,
  model::{SlackUser, SlackUserMetadata},
  record::EntityKind,
  store::SlackUserStore,
};

use crate::{
  docstore::DocStore,
  encode::{decode, decode_all, encode},
};

const USERS: &str = "slack_users";
const METADATA: &str = "slack_user_metadata";
const METADATA_DOC: &str = "metadata";

#[derive(Clone)]
pub struct SlackUsers {
  db: DocStore,
}

impl SlackUsers {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl SlackUserStore for SlackUsers {
  async fn get_all(&self) -> Result<Vec<SlackUser>> {
    let collection = self.db.global(USERS);
    let bodies = self.db.scan_bodies(collection.clone()).await?;
    let mut users: Vec<SlackUser> = decode_all(&collection, bodies)?;
    users.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(users)
  }

  async fn get_by_id(&self, id: &str) -> Result<SlackUser> {
    let collection = self.db.global(USERS);
    match self.db.get_body(collection.clone(), id.to_owned()).await? {
      Some(body) => Ok(decode(&collection, &body)?),
      None => Err(Error::global_not_found(EntityKind::SlackUser, id)),
    }
  }

  async fn get_by_ids(&self, ids: &[String]) -> Result<HashMap<String, SlackUser>> {
    let collection = self.db.global(USERS);
    let bodies = self.db.get_bodies(collection.clone(), ids.to_vec()).await?;
    let users: Vec<SlackUser> = decode_all(&collection, bodies)?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
  }

  async fn save_many(&self, users: Vec<SlackUser>) -> Result<()> {
    let now = clock::now();
    let count = users.len();
    let docs = users
      .into_iter()
      .map(|mut user| {
        user.updated_at = now;
        Ok((user.id.clone(), encode(&user)?))
      })
      .collect::<crate::Result<Vec<_>>>()?;

    self.db.put_many(self.db.global(USERS), docs).await?;
    tracing::debug!(count, "saved slack users");
    Ok(())
  }

  async fn delete_all(&self) -> Result<()> {
    let collection = self.db.global(USERS);
    let ids = self.db.all_ids(collection.clone()).await?;
    let removed = self.db.delete_ids(collection, ids).await?;
    tracing::debug!(removed, "cleared slack user cache");
    Ok(())
  }

  async fn get_metadata(&self) -> Result<SlackUserMetadata> {
    let collection = self.db.global(METADATA);
    match self.db.get_body(collection.clone(), METADATA_DOC.to_owned()).await? {
      Some(body) => Ok(decode(&collection, &body)?),
      None => Ok(SlackUserMetadata::default()),
    }
  }

  async fn save_metadata(&self, metadata: SlackUserMetadata) -> Result<()> {
    let body = encode(&metadata)?;
    self.db.upsert(self.db.global(METADATA), METADATA_DOC.to_owned(), body).await?;
    Ok(())
  }
}
