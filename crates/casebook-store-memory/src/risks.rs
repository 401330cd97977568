//! Risk and response stores, and the join table linking them.

use std::{collections::HashMap, sync::Arc};

use casebook_core::{
  Error, Result, clock,
  model::{Response, Risk, RiskResponseLink},
  record::EntityKind,
  store::{ResponseStore, RiskResponseStore, RiskStore},
};

use crate::store::Tables;

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Responses {
  tables: Arc<Tables>,
}

impl Responses {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl ResponseStore for Responses {
  async fn create(&self, workspace: &str, response: Response) -> Result<Response> {
    self.tables.responses.create_sequential(workspace, response).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Response> {
    self.tables.responses.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, response: Response) -> Result<Response> {
    self.tables.responses.update(workspace, response).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.tables.responses.remove(workspace, &id).await.map(|_| ())
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Response>> {
    let mut responses = self.tables.responses.scan(workspace, |_| true).await;
    responses.sort_by_key(|r| r.id);
    Ok(responses)
  }
}

// ─── Risks ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Risks {
  tables: Arc<Tables>,
}

impl Risks {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl RiskStore for Risks {
  async fn create(&self, workspace: &str, risk: Risk) -> Result<Risk> {
    self.tables.risks.create_sequential(workspace, risk).await
  }

  async fn get(&self, workspace: &str, id: i64) -> Result<Risk> {
    self.tables.risks.get(workspace, &id).await
  }

  async fn update(&self, workspace: &str, risk: Risk) -> Result<Risk> {
    self.tables.risks.update(workspace, risk).await
  }

  async fn delete(&self, workspace: &str, id: i64) -> Result<()> {
    self.tables.risks.remove(workspace, &id).await.map(|_| ())
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Risk>> {
    let mut risks = self.tables.risks.scan(workspace, |_| true).await;
    risks.sort_by_key(|r| r.id);
    Ok(risks)
  }
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RiskResponses {
  tables: Arc<Tables>,
}

impl RiskResponses {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }

  /// Links matching `pred`, oldest first.
  async fn links(
    &self,
    workspace: &str,
    pred: impl Fn(&RiskResponseLink) -> bool,
  ) -> Vec<RiskResponseLink> {
    let mut matched: Vec<RiskResponseLink> = {
      let links = self.tables.links.read().await;
      links
        .get(workspace)
        .map(|l| l.iter().filter(|link| pred(*link)).cloned().collect())
        .unwrap_or_default()
    };
    matched.sort_by_key(|l| (l.created_at, l.risk_id, l.response_id));
    matched
  }

  async fn remove_links(&self, workspace: &str, pred: impl Fn(&RiskResponseLink) -> bool) -> usize {
    let mut links = self.tables.links.write().await;
    let Some(rows) = links.get_mut(workspace) else { return 0 };
    let before = rows.len();
    rows.retain(|link| !pred(link));
    before - rows.len()
  }

  /// Resolve responses for `links`, skipping any that no longer exist.
  async fn resolve_responses(&self, workspace: &str, links: &[RiskResponseLink]) -> Vec<Response> {
    let mut responses = Vec::with_capacity(links.len());
    for link in links {
      match self.tables.responses.get(workspace, &link.response_id).await {
        Ok(response) => responses.push(response),
        Err(_) => tracing::warn!(
          workspace,
          risk_id = link.risk_id,
          response_id = link.response_id,
          "skipping link to deleted response"
        ),
      }
    }
    responses
  }

  async fn resolve_risks(&self, workspace: &str, links: &[RiskResponseLink]) -> Vec<Risk> {
    let mut risks = Vec::with_capacity(links.len());
    for link in links {
      match self.tables.risks.get(workspace, &link.risk_id).await {
        Ok(risk) => risks.push(risk),
        Err(_) => tracing::warn!(
          workspace,
          risk_id = link.risk_id,
          response_id = link.response_id,
          "skipping link to deleted risk"
        ),
      }
    }
    risks
  }
}

impl RiskResponseStore for RiskResponses {
  async fn link(&self, workspace: &str, risk_id: i64, response_id: i64) -> Result<()> {
    if !self.tables.risks.contains(workspace, &risk_id).await {
      return Err(Error::not_found(EntityKind::Risk, workspace, risk_id));
    }
    if !self.tables.responses.contains(workspace, &response_id).await {
      return Err(Error::not_found(EntityKind::Response, workspace, response_id));
    }

    let mut links = self.tables.links.write().await;
    let rows = links.entry(workspace.to_owned()).or_default();
    if rows.iter().any(|l| l.risk_id == risk_id && l.response_id == response_id) {
      return Ok(());
    }
    rows.push(RiskResponseLink { risk_id, response_id, created_at: clock::now() });
    Ok(())
  }

  async fn unlink(&self, workspace: &str, risk_id: i64, response_id: i64) -> Result<()> {
    let removed = self
      .remove_links(workspace, |l| l.risk_id == risk_id && l.response_id == response_id)
      .await;
    if removed == 0 {
      return Err(Error::not_found(
        EntityKind::RiskResponse,
        workspace,
        RiskResponseLink::key(risk_id, response_id),
      ));
    }
    Ok(())
  }

  async fn get_responses_by_risk(&self, workspace: &str, risk_id: i64) -> Result<Vec<Response>> {
    let links = self.links(workspace, |l| l.risk_id == risk_id).await;
    Ok(self.resolve_responses(workspace, &links).await)
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
    let links = self.links(workspace, |l| l.response_id == response_id).await;
    Ok(self.resolve_risks(workspace, &links).await)
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
    let removed = self.remove_links(workspace, |l| l.risk_id == risk_id).await;
    tracing::debug!(workspace, risk_id, removed, "removed links for risk");
    Ok(())
  }

  async fn delete_by_response(&self, workspace: &str, response_id: i64) -> Result<()> {
    let removed = self.remove_links(workspace, |l| l.response_id == response_id).await;
    tracing::debug!(workspace, response_id, removed, "removed links for response");
    Ok(())
  }
}
