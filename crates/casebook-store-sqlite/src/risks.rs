//! Risk and response stores, and the join collection linking them.

use std::collections::HashMap;

use casebook_core::{
  Error, Result, clock,
  model::{Response, Risk, RiskResponseLink},
  record::{EntityKind, Record},
  store::{ResponseStore, RiskResponseStore, RiskStore},
};

use crate::{
  docstore::DocStore,
  encode::{self, decode_all},
};

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Responses {
  db: DocStore,
}

impl Responses {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl ResponseStore for Responses {
  async fn create(&self, workspace: &str, response: Response) -> Result<Response> {
    self.db.create_sequential(workspace, response).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Response> {
    self.db.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, response: Response) -> Result<Response> {
    self.db.update(workspace, response).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.db.remove::<Response>(workspace, &id).await
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Response>> {
    let mut responses: Vec<Response> = self.db.scan(workspace).await?;
    responses.sort_by_key(|r| r.id);
    Ok(responses)
  }
}

// ─── Risks ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Risks {
  db: DocStore,
}

impl Risks {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl RiskStore for Risks {
  async fn create(&self, workspace: &str, risk: Risk) -> Result<Risk> {
    self.db.create_sequential(workspace, risk).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Risk> {
    self.db.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, risk: Risk) -> Result<Risk> {
    self.db.update(workspace, risk).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.db.remove::<Risk>(workspace, &id).await
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Risk>> {
    let mut risks: Vec<Risk> = self.db.scan(workspace).await?;
    risks.sort_by_key(|r| r.id);
    Ok(risks)
  }
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// Link documents are keyed `"{risk_id}:{response_id}"`, which makes linking
/// the same pair twice a no-op.
#[derive(Clone)]
pub struct RiskResponses {
  db: DocStore,
}

impl RiskResponses {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }

  fn collection(&self, workspace: &str) -> String {
    self.db.collection(workspace, EntityKind::RiskResponse)
  }

  /// Links whose field at `path` equals `id`, oldest first.
  async fn links(
    &self,
    workspace: &str,
    path: &'static str,
    id: i64,
  ) -> Result<Vec<RiskResponseLink>> {
    let collection = self.collection(workspace);
    let bodies = self.db.query_bodies(collection.clone(), path, encode::integer(id)).await?;
    let mut links: Vec<RiskResponseLink> = decode_all(&collection, bodies)?;
    links.sort_by_key(|l| (l.created_at, l.risk_id, l.response_id));
    Ok(links)
  }

  async fn remove_links(&self, workspace: &str, path: &'static str, id: i64) -> Result<usize> {
    let collection = self.collection(workspace);
    let ids = self.db.query_ids(collection.clone(), path, encode::integer(id)).await?;
    Ok(self.db.delete_ids(collection, ids).await?)
  }

  /// Fetch the records named by `ids` in order, skipping any that no longer
  /// exist.
  async fn resolve<R: Record<Id = i64>>(&self, workspace: &str, ids: Vec<i64>) -> Result<Vec<R>> {
    let collection = self.db.collection(workspace, R::KIND);
    let doc_ids = ids.iter().map(i64::to_string).collect();
    let bodies = self.db.get_bodies(collection.clone(), doc_ids).await?;
    let found: HashMap<i64, R> = decode_all::<R>(&collection, bodies)?
      .into_iter()
      .map(|r| (r.id(), r))
      .collect();

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
      match found.get(&id) {
        Some(record) => resolved.push(record.clone()),
        None => tracing::warn!(workspace, kind = %R::KIND, id, "skipping link to deleted record"),
      }
    }
    Ok(resolved)
  }
}

impl RiskResponseStore for RiskResponses {
  async fn link(&self, workspace: &str, risk_id: i64, response_id: i64) -> Result<()> {
    if !self.db.contains::<Risk>(workspace, &risk_id).await? {
      return Err(Error::not_found(EntityKind::Risk, workspace, risk_id));
    }
    if !self.db.contains::<Response>(workspace, &response_id).await? {
      return Err(Error::not_found(EntityKind::Response, workspace, response_id));
    }

    let link = RiskResponseLink { risk_id, response_id, created_at: clock::now() };
    let body = encode::encode(&link)?;
    let key = RiskResponseLink::key(risk_id, response_id);
    self.db.insert_new(self.collection(workspace), key, body).await?;
    Ok(())
  }

  async fn unlink(&self, workspace: &str, risk_id: i64, response_id: i64) -> Result<()> {
    let key = RiskResponseLink::key(risk_id, response_id);
    if !self.db.delete(self.collection(workspace), key.clone()).await? {
      return Err(Error::not_found(EntityKind::RiskResponse, workspace, key));
    }
    Ok(())
  }

  async fn get_responses_by_risk(&self, workspace: &str, risk_id: i64) -> Result<Vec<Response>> {
    let links = self.links(workspace, "$.risk_id", risk_id).await?;
    self.resolve(workspace, links.iter().map(|l| l.response_id).collect()).await
  }

  async fn get_responses_by_risks(
    &self,
    workspace: &str,
    risk_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Response>>> {
    let mut grouped = HashMap::with_capacity(risk_ids.len());
    for &risk_id in risk_ids {
      grouped.insert(risk_id, self.get_responses_by_risk(workspace, risk_id).await?);
    }
    Ok(grouped)
  }

  async fn get_risks_by_response(&self, workspace: &str, response_id: i64) -> Result<Vec<Risk>> {
    let links = self.links(workspace, "$.response_id", response_id).await?;
    self.resolve(workspace, links.iter().map(|l| l.risk_id).collect()).await
  }

  async fn get_risks_by_responses(
    &self,
    workspace: &str,
    response_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Risk>>> {
    let mut grouped = HashMap::with_capacity(response_ids.len());
    for &response_id in response_ids {
      grouped.insert(response_id, self.get_risks_by_response(workspace, response_id).await?);
    }
    Ok(grouped)
  }

  async fn delete_by_risk(&self, workspace: &str, risk_id: i64) -> Result<()> {
    let removed = self.remove_links(workspace, "$.risk_id", risk_id).await?;
    tracing::debug!(workspace, risk_id, removed, "removed links for risk");
    Ok(())
  }

  async fn delete_by_response(&self, workspace: &str, response_id: i64) -> Result<()> {
    let removed = self.remove_links(workspace, "$.response_id", response_id).await?;
    tracing::debug!(workspace, response_id, removed, "removed links for response");
    Ok(())
  }
}
