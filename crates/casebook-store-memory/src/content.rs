//! Knowledge, memory, and source stores.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use casebook_core::{
  Result,
  model::{Knowledge, Memory, Source},
  pagination::{self, Cursor, Page},
  similarity,
  store::{KnowledgeStore, MemoryStore, SourceStore},
};

use crate::store::Tables;

// ─── Knowledge ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct KnowledgeBase {
  tables: Arc<Tables>,
}

impl KnowledgeBase {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl KnowledgeStore for KnowledgeBase {
  async fn create(&self, workspace: &str, knowledge: Knowledge) -> Result<Knowledge> {
    self.tables.knowledge.create_opaque(workspace, knowledge).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Knowledge> {
    self.tables.knowledge.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, knowledge: Knowledge) -> Result<Knowledge> {
    self.tables.knowledge.update(workspace, knowledge).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.tables.knowledge.remove(workspace, &id.to_owned()).await.map(|_| ())
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Knowledge>> {
    let mut entries = self.tables.knowledge.scan(workspace, |k| k.case_id == case_id).await;
    entries.sort_by(pagination::newest_first);
    Ok(entries)
  }

  async fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> Result<HashMap<i64, Vec<Knowledge>>> {
    let wanted: HashSet<i64> = case_ids.iter().copied().collect();
    let mut entries = self.tables.knowledge.scan(workspace, |k| wanted.contains(&k.case_id)).await;
    entries.sort_by(pagination::newest_first);

    let mut grouped: HashMap<i64, Vec<Knowledge>> =
      case_ids.iter().map(|id| (*id, Vec::new())).collect();
    for entry in entries {
      grouped.entry(entry.case_id).or_default().push(entry);
    }
    Ok(grouped)
  }

  async fn find_by_embedding(
    &self,
    workspace: &str,
    query: &[f32],
    limit: usize,
  ) -> Result<Vec<Knowledge>> {
    let mut candidates = self.tables.knowledge.scan(workspace, |k| !k.embedding.is_empty()).await;
    candidates.sort_by(pagination::newest_first);
    Ok(similarity::top_k(query, candidates, limit))
  }

  async fn list_paged(
    &self,
    workspace: &str,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> Result<Page<Knowledge>> {
    let entries = self.tables.knowledge.scan(workspace, |_| true).await;
    pagination::paginate(entries, limit, cursor)
  }
}

// ─── Memories ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Memories {
  tables: Arc<Tables>,
}

impl Memories {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl MemoryStore for Memories {
  async fn create(&self, workspace: &str, memory: Memory) -> Result<Memory> {
    self.tables.memories.create_opaque(workspace, memory).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Memory> {
    self.tables.memories.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, memory: Memory) -> Result<Memory> {
    self.tables.memories.update(workspace, memory).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.tables.memories.remove(workspace, &id.to_owned()).await.map(|_| ())
  }

  async fn get_by_case(&self, workspace: &str, case_id: i64) -> Result<Vec<Memory>> {
    let mut memories = self.tables.memories.scan(workspace, |m| m.case_id == case_id).await;
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
    let mut candidates = self
      .tables
      .memories
      .scan(workspace, |m| m.case_id == case_id && !m.embedding.is_empty())
      .await;
    candidates.sort_by(pagination::newest_first);
    Ok(similarity::top_k(query, candidates, limit))
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Sources {
  tables: Arc<Tables>,
}

impl Sources {
  pub(crate) fn new(tables: Arc<Tables>) -> Self { Self { tables } }
}

impl SourceStore for Sources {
  async fn create(&self, workspace: &str, source: Source) -> Result<Source> {
    self.tables.sources.create_opaque(workspace, source).await
  }

  async fn get(&self, workspace: &str, id: &str) -> Result<Source> {
    self.tables.sources.get(workspace, &id.to_owned()).await
  }

  async fn update(&self, workspace: &str, source: Source) -> Result<Source> {
    self.tables.sources.update(workspace, source).await
  }

  async fn delete(&self, workspace: &str, id: &str) -> Result<()> {
    self.tables.sources.remove(workspace, &id.to_owned()).await.map(|_| ())
  }

  async fn list(&self, workspace: &str) -> Result<Vec<Source>> {
    let mut sources = self.tables.sources.scan(workspace, |_| true).await;
    sources.sort_by(pagination::newest_first);
    Ok(sources)
  }
}
