//! Knowledge, memory, and source stores.

use std::collections::HashMap;

use casebook_core::{
  Result,
  model::{Knowledge, Memory, Source},
  pagination::{self, Cursor, Page},
  similarity,
  store::{KnowledgeStore, MemoryStore, SourceStore},
};

use crate::{docstore::DocStore, encode};

// ─── Knowledge ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct KnowledgeBase {
  db: DocStore,
}

impl KnowledgeBase {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl KnowledgeStore for KnowledgeBase {
  async fn create(&self, workspace: &str, knowledge: Knowledge) -> Result<Knowledge> {
    self.db.create_opaque(workspace, knowledge).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Knowledge> {
    self.db.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, knowledge: Knowledge) -> Result<Knowledge> {
    self.db.update(workspace, knowledge).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.db.remove::<Knowledge>(workspace, &id.to_owned()).await
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Knowledge>> {
    let mut entries: Vec<Knowledge> =
      self.db.query(workspace, "$.case_id", encode::integer(case_id)).await?;
    entries.sort_by(pagination::newest_first);
    Ok(entries)
  }

  async fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Knowledge>>> {
    let mut entries: Vec<Knowledge> = self.db.query_in(workspace, "$.case_id", case_ids).await?;
    entries.sort_by(pagination::newest_first);

    let mut grouped: HashMap<i64, Vec<Knowledge>> =
      case_ids.iter().map(|id| (*id, Vec::new())).collect();
    for entry in entries {
      grouped.entry(entry.case_id).or_default().push(entry);
    }
    Ok(grouped)
  }

  /// Full scan of the workspace's knowledge; ranking happens in process.
  async fn find_by_embedding(
    &self,
    workspace: &str,
    query: &[f32],
    limit: usize,
  ) -> Result<Vec<Knowledge>> {
    let mut candidates: Vec<Knowledge> = self.db.scan(workspace).await?;
    candidates.retain(|k| !k.embedding.is_empty());
    candidates.sort_by(pagination::newest_first);
    Ok(similarity::top_k(query, candidates, limit))
  }

  async fn list_paged(
    &self,
    workspace: &str,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<Knowledge>> {
    let entries: Vec<Knowledge> = self.db.scan(workspace).await?;
    pagination::paginate(entries, limit, cursor)
  }
}

// ─── Memories ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Memories {
  db: DocStore,
}

impl Memories {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl MemoryStore for Memories {
  async fn create(&self, workspace: &str, memory: Memory) -> Result<Memory> {
    self.db.create_opaque(workspace, memory).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Memory> {
    self.db.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, memory: Memory) -> Result<Memory> {
    self.db.update(workspace, memory).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.db.remove::<Memory>(workspace, &id.to_owned()).await
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Memory>> {
    let mut memories: Vec<Memory> =
      self.db.query(workspace, "$.case_id", encode::integer(case_id)).await?;
    memories.sort_by(pagination::newest_first);
    Ok(memories)
  }

  async fn find_by_embedding(
    &self,
    workspace: &str,
    case_id: i64,
    query: &[f32],
    limit: usize,
  ) -> Result<Vec<Memory>> {
    let mut candidates = self.get_by_case(workspace, case_id).await?;
    candidates.retain(|m| !m.embedding.is_empty());
    Ok(similarity::top_k(query, candidates, limit))
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Sources {
  db: DocStore,
}

impl Sources {
  pub(crate) fn new(db: DocStore) -> Self { Self { db } }
}

impl SourceStore for Sources {
  async fn create(&self, workspace: &str, source: Source) -> Result<Source> {
    self.db.create_opaque(workspace, source).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Source> {
    self.db.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, source: Source) -> Result<Source> {
    self.db.update(workspace, source).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.db.remove::<Source>(workspace, &id.to_owned()).await
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Source>> {
    let mut sources: Vec<Source> = self.db.scan(workspace).await?;
    sources.sort_by(pagination::newest_first);
    Ok(sources)
  }
}
