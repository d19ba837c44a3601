//! In-memory term index.
//!
//! [`MemoryIndex`] keeps every committed document in an immutable
//! [`IndexState`]. Writers stage changes in an [`IndexWriter`] and publish
//! them with [`IndexWriter::commit`], which builds the next state
//! copy-on-write and swaps it in. Readers clone the current `Arc` and never
//! observe a half-applied commit.
//!
//! Scoring is classic TF-IDF over exact-term clauses:
//!
//! ```text
//! score(d) = Σ boost · √tf · idf² / √len,   idf = 1 + ln(N / (df + 1))
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nlsearch_core::{
    CorpusSnapshot, Document, Hit, IndexStats, QueryPlan, SearchBackend, StoreError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::schema::{FieldTerms, IndexSchema};

/// A committed document with its analyzed fields.
#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    fields: HashMap<String, FieldTerms>,
}

/// One published generation of the index.
#[derive(Debug)]
pub struct IndexState {
    generation: u64,
    documents: BTreeMap<String, Arc<IndexedDocument>>,
    corpus: Arc<[Document]>,
    last_commit: Option<DateTime<Utc>>,
}

impl IndexState {
    fn empty() -> Self {
        Self {
            generation: 0,
            documents: BTreeMap::new(),
            corpus: Arc::from(Vec::new()),
            last_commit: None,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Committed document at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.get(path).map(|indexed| &indexed.document)
    }

    fn snapshot(&self) -> CorpusSnapshot {
        CorpusSnapshot::new(self.generation, Arc::clone(&self.corpus))
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.documents.len() as u64,
            generation: self.generation,
            last_commit: self.last_commit,
        }
    }

    fn search(&self, plan: &QueryPlan, limit: usize) -> Vec<Hit> {
        if plan.is_empty() || limit == 0 || self.documents.is_empty() {
            return Vec::new();
        }

        let total = self.documents.len() as f32;
        let idfs: Vec<f32> = plan
            .iter()
            .map(|clause| {
                let df = self
                    .documents
                    .values()
                    .filter(|doc| {
                        doc.fields
                            .get(&clause.field)
                            .is_some_and(|terms| terms.frequency(&clause.term) > 0)
                    })
                    .count() as f32;
                1.0 + (total / (df + 1.0)).ln()
            })
            .collect();

        let mut hits: Vec<Hit> = self
            .documents
            .values()
            .filter_map(|doc| {
                let mut score = 0.0f32;
                let mut matched = false;
                for (clause, idf) in plan.iter().zip(&idfs) {
                    let Some(terms) = doc.fields.get(&clause.field) else {
                        continue;
                    };
                    let tf = terms.frequency(&clause.term);
                    if tf == 0 {
                        continue;
                    }
                    matched = true;
                    let norm = 1.0 / (terms.length.max(1) as f32).sqrt();
                    score += clause.boost * (tf as f32).sqrt() * idf * idf * norm;
                }
                matched.then(|| Hit {
                    path: doc.document.path.clone(),
                    score,
                    fields: doc.document.fields.clone(),
                })
            })
            .collect();

        // Documents iterate in path order, so a stable sort keeps ties by path.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}

struct Inner {
    schema: IndexSchema,
    state: RwLock<Arc<IndexState>>,
    writer_held: AtomicBool,
    closed: AtomicBool,
}

impl Inner {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("index is closed".to_string()));
        }
        Ok(())
    }
}

/// In-memory search backend with a single writer.
///
/// Cloning yields another handle to the same index.
///
/// # Example
///
/// ```rust,ignore
/// use nlsearch_core::{Document, SearchBackend};
/// use nlsearch_store::MemoryIndex;
///
/// let index = MemoryIndex::default();
/// let mut writer = index.writer()?;
/// writer.upsert(Document::new("/newnode").with_field("jcr:description", "a repository"))?;
/// writer.commit().await?;
/// assert_eq!(index.stats().await?.total_documents, 1);
/// ```
#[derive(Clone)]
pub struct MemoryIndex {
    inner: Arc<Inner>,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::open(IndexSchema::default())
    }
}

impl MemoryIndex {
    /// Open an empty index.
    #[must_use]
    pub fn open(schema: IndexSchema) -> Self {
        debug!(
            "MemoryIndex opened (keyword fields: {:?})",
            schema.keyword_fields
        );
        Self {
            inner: Arc::new(Inner {
                schema,
                state: RwLock::new(Arc::new(IndexState::empty())),
                writer_held: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &IndexSchema {
        &self.inner.schema
    }

    /// Take the index writer. Fails while another writer is alive.
    pub fn writer(&self) -> Result<IndexWriter, StoreError> {
        self.inner.ensure_open()?;
        if self
            .inner
            .writer_held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::WriterLocked);
        }
        Ok(IndexWriter {
            inner: Arc::clone(&self.inner),
            pending: Vec::new(),
        })
    }

    /// Current published state.
    pub async fn state(&self) -> Result<Arc<IndexState>, StoreError> {
        self.inner.ensure_open()?;
        Ok(Arc::clone(&*self.inner.state.read().await))
    }

    /// Committed document at `path`.
    pub async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.state().await?.get(path).cloned())
    }

    /// Close the index. Every later call fails with [`StoreError::Unavailable`].
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            info!("MemoryIndex closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for MemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("schema", &self.inner.schema)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchBackend for MemoryIndex {
    async fn search(&self, plan: &QueryPlan, limit: usize) -> Result<Vec<Hit>, StoreError> {
        let state = self.state().await?;
        let hits = state.search(plan, limit);
        debug!(
            "Search over {} documents (generation {}): {} hits",
            state.len(),
            state.generation,
            hits.len()
        );
        Ok(hits)
    }

    async fn snapshot(&self) -> Result<CorpusSnapshot, StoreError> {
        Ok(self.state().await?.snapshot())
    }

    async fn stats(&self) -> Result<IndexStats, StoreError> {
        Ok(self.state().await?.stats())
    }
}

// ============================================================================
// Writer
// ============================================================================

#[derive(Debug, Clone)]
enum Change {
    Upsert(Document),
    Delete(String),
    DeleteSubtree(String),
}

/// Outcome of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    /// Generation now visible to readers
    pub generation: u64,
    pub upserted: usize,
    pub deleted: usize,
}

/// The single writer of a [`MemoryIndex`].
///
/// Changes are staged until [`commit`](Self::commit). Dropping the writer
/// discards staged changes and releases the writer lock.
pub struct IndexWriter {
    inner: Arc<Inner>,
    pending: Vec<Change>,
}

impl IndexWriter {
    /// Stage an insert or replace of `document`.
    pub fn upsert(&mut self, document: Document) -> Result<(), StoreError> {
        if !document.path.starts_with('/') {
            return Err(StoreError::Insert(format!(
                "path must be absolute: {:?}",
                document.path
            )));
        }
        self.pending.push(Change::Upsert(document));
        Ok(())
    }

    /// Stage removal of the document at `path`.
    pub fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        if !path.starts_with('/') {
            return Err(StoreError::Delete(format!("path must be absolute: {path:?}")));
        }
        self.pending.push(Change::Delete(path.to_string()));
        Ok(())
    }

    /// Stage removal of `path` and every document below it.
    pub fn delete_subtree(&mut self, path: &str) -> Result<(), StoreError> {
        if !path.starts_with('/') {
            return Err(StoreError::Delete(format!("path must be absolute: {path:?}")));
        }
        self.pending.push(Change::DeleteSubtree(path.to_string()));
        Ok(())
    }

    /// Number of staged changes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Discard staged changes.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Publish staged changes as a new generation.
    ///
    /// With nothing staged, the current generation is returned unchanged.
    pub async fn commit(&mut self) -> Result<CommitInfo, StoreError> {
        self.inner.ensure_open()?;

        let mut state = self.inner.state.write().await;
        if self.pending.is_empty() {
            return Ok(CommitInfo {
                generation: state.generation,
                upserted: 0,
                deleted: 0,
            });
        }

        let mut documents = state.documents.clone();
        let mut upserted = 0;
        let mut deleted = 0;

        for change in self.pending.drain(..) {
            match change {
                Change::Upsert(document) => {
                    let fields = self.inner.schema.terms(&document);
                    documents.insert(
                        document.path.clone(),
                        Arc::new(IndexedDocument { document, fields }),
                    );
                    upserted += 1;
                }
                Change::Delete(path) => {
                    if documents.remove(&path).is_some() {
                        deleted += 1;
                    }
                }
                Change::DeleteSubtree(path) => {
                    let before = documents.len();
                    documents.retain(|candidate, _| !is_within(candidate, &path));
                    deleted += before - documents.len();
                }
            }
        }

        let corpus: Arc<[Document]> = documents
            .values()
            .map(|indexed| indexed.document.clone())
            .collect();
        let generation = state.generation + 1;
        *state = Arc::new(IndexState {
            generation,
            documents,
            corpus,
            last_commit: Some(Utc::now()),
        });

        info!(
            "Committed generation {}: {} upserted, {} deleted, {} documents",
            generation,
            upserted,
            deleted,
            state.len()
        );
        Ok(CommitInfo {
            generation,
            upserted,
            deleted,
        })
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!("Dropping writer with {} uncommitted changes", self.pending.len());
        }
        self.inner.writer_held.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Whether `path` is `root` or a descendant of it.
fn is_within(path: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    let root = root.trim_end_matches('/');
    path == root || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}
