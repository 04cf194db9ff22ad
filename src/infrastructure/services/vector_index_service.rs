//! Vector index service - per-KB locking, load/rebuild, upsert and search

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::domain::ingestion::Chunk;
use crate::domain::knowledge_base::KnowledgeBaseName;
use crate::domain::vector_index::{IndexEntry, VectorIndex, VectorIndexStore};
use crate::domain::{DomainError, EmbeddingFamily, EmbeddingModel, EmbeddingProviderResolver};

/// Texts sent to the embedding backend per request
const EMBED_BATCH_SIZE: usize = 64;

/// Result of loading an index for writing
#[derive(Debug)]
pub enum LoadedIndex {
    Existing(VectorIndex),
    Missing,
    /// A corrupt index was deleted and must be rebuilt from new chunks
    Discarded,
}

impl LoadedIndex {
    pub fn into_index(self) -> Option<VectorIndex> {
        match self {
            Self::Existing(index) => Some(index),
            Self::Missing | Self::Discarded => None,
        }
    }
}

/// Coordinates index reads and writes over a [`VectorIndexStore`]
pub struct VectorIndexService {
    store: Arc<dyn VectorIndexStore>,
    embeddings: Arc<dyn EmbeddingProviderResolver>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for VectorIndexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndexService")
            .field("store", &self.store)
            .finish()
    }
}

impl VectorIndexService {
    pub fn new(
        store: Arc<dyn VectorIndexStore>,
        embeddings: Arc<dyn EmbeddingProviderResolver>,
    ) -> Self {
        Self {
            store,
            embeddings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorIndexStore> {
        &self.store
    }

    /// Exclusive write access to a KB until the guard drops.
    ///
    /// Keyed by KB name alone so that writers using models of different
    /// families still serialize on the KB's registry entry.
    pub async fn lock(&self, kb_name: &KnowledgeBaseName) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .await
            .entry(kb_name.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Load the index for writing; a corrupt index is deleted
    #[instrument(skip(self), fields(kb_name = %kb_name, family = %model.family()))]
    pub async fn load_or_discard(
        &self,
        kb_name: &KnowledgeBaseName,
        model: &EmbeddingModel,
    ) -> Result<LoadedIndex, DomainError> {
        match self.store.load(kb_name, model.family()).await {
            Ok(index) => Ok(LoadedIndex::Existing(index)),
            Err(DomainError::IndexNotFound { .. }) => Ok(LoadedIndex::Missing),
            Err(DomainError::IndexCorrupt { path, message }) => {
                warn!(path = %path, error = %message, "Vector index corrupt, rebuilding");
                self.store.remove(kb_name, model.family()).await?;
                Ok(LoadedIndex::Discarded)
            }
            Err(e) => Err(e),
        }
    }

    /// Embed `chunks`, append them to `index` (or a new one) and persist.
    ///
    /// An existing index only accepts vectors from the model that built it.
    #[instrument(skip(self, index, chunks), fields(kb_name = %kb_name, chunk_count = chunks.len()))]
    pub async fn upsert(
        &self,
        index: Option<VectorIndex>,
        kb_name: &KnowledgeBaseName,
        chunks: Vec<Chunk>,
        model: &EmbeddingModel,
    ) -> Result<VectorIndex, DomainError> {
        if let Some(existing) = &index {
            if existing.embedding_model() != model.id() {
                return Err(DomainError::invalid_argument(format!(
                    "Index of '{}' was built with '{}', not '{}'",
                    kb_name,
                    existing.embedding_model(),
                    model
                )));
            }
        }

        let provider = self.embeddings.resolve(model)?;

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts = batch.iter().map(|c| c.text.clone()).collect();
            vectors.extend(provider.embed_texts(model.id(), texts).await?);
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::new(chunk, vector))
            .collect();

        let created = index.is_none();
        let mut index = index.unwrap_or_else(|| VectorIndex::new(kb_name.clone(), model));
        index.append(entries)?;
        self.store.save(&index).await?;

        info!(
            created,
            total = index.len(),
            model = %model,
            "Upserted vector index"
        );

        Ok(index)
    }

    /// Nearest chunks to an already embedded query, closest first
    pub async fn search(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>, DomainError> {
        let index = self.store.load(kb_name, family).await?;
        let hits = index.search(query, k)?;

        debug!(kb_name = %kb_name, hits = hits.len(), "Searched vector index");

        Ok(hits)
    }

    /// Whether an index file is present for the KB
    pub async fn exists(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<bool, DomainError> {
        self.store.exists(kb_name, family).await
    }
}
