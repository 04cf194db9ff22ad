//! Multi-KB retrieval - fan a query out over knowledge bases and rank the hits

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use super::VectorIndexService;
use crate::domain::retrieval::merge_retrievals;
use crate::domain::{
    EmbeddingModel, EmbeddingProviderResolver, KbRetrieval, KnowledgeBaseName,
    KnowledgeBaseRepository, RetrievalHit, SkipReason,
};

/// Searches the vector indexes of several knowledge bases with one query
pub struct RetrievalService {
    indexes: Arc<VectorIndexService>,
    repository: Arc<dyn KnowledgeBaseRepository>,
    embeddings: Arc<dyn EmbeddingProviderResolver>,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService").finish()
    }
}

impl RetrievalService {
    pub fn new(
        indexes: Arc<VectorIndexService>,
        repository: Arc<dyn KnowledgeBaseRepository>,
        embeddings: Arc<dyn EmbeddingProviderResolver>,
    ) -> Self {
        Self {
            indexes,
            repository,
            embeddings,
        }
    }

    /// Deduplicated hits from every usable KB, most similar first
    pub async fn retrieve(
        &self,
        query: &str,
        kb_names: &[String],
        embedding_model: &str,
        k: usize,
    ) -> Vec<RetrievalHit> {
        merge_retrievals(&self.retrieve_by_kb(query, kb_names, embedding_model, k).await)
    }

    /// Per-KB outcomes in request order.
    ///
    /// Never fails as a whole: a KB that cannot be searched is reported with
    /// its skip reason, and a query that cannot be embedded skips every KB.
    #[instrument(skip(self, query, kb_names), fields(kb_count = kb_names.len()))]
    pub async fn retrieve_by_kb(
        &self,
        query: &str,
        kb_names: &[String],
        embedding_model: &str,
        k: usize,
    ) -> Vec<KbRetrieval> {
        let embedded = match EmbeddingModel::parse(embedding_model) {
            Ok(model) => self.embed_query(&model, query).await.map(|v| (model, v)),
            Err(e) => Err(SkipReason::from_error(&e)),
        };

        let (model, vector) = match embedded {
            Ok(pair) => pair,
            Err(reason) => {
                warn!(reason = %reason, "Query could not be embedded, skipping all knowledge bases");
                return kb_names
                    .iter()
                    .map(|kb_name| KbRetrieval {
                        kb_name: kb_name.clone(),
                        outcome: Err(reason.clone()),
                    })
                    .collect();
            }
        };

        let searches = kb_names
            .iter()
            .map(|kb_name| self.search_kb(kb_name, &model, &vector, k));
        let outcomes = join_all(searches).await;

        kb_names
            .iter()
            .zip(outcomes)
            .map(|(kb_name, outcome)| {
                match &outcome {
                    Ok(hits) => debug!(kb_name = %kb_name, hits = hits.len(), "Searched knowledge base"),
                    Err(reason) => warn!(kb_name = %kb_name, reason = %reason, "Skipping knowledge base"),
                }

                KbRetrieval {
                    kb_name: kb_name.clone(),
                    outcome,
                }
            })
            .collect()
    }

    async fn embed_query(&self, model: &EmbeddingModel, query: &str) -> Result<Vec<f32>, SkipReason> {
        let provider = self
            .embeddings
            .resolve(model)
            .map_err(|e| SkipReason::from_error(&e))?;

        provider
            .embed_query(model.id(), query)
            .await
            .map_err(|e| SkipReason::from_error(&e))
    }

    async fn search_kb(
        &self,
        kb_name: &str,
        model: &EmbeddingModel,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalHit>, SkipReason> {
        let name = KnowledgeBaseName::new(kb_name).map_err(|_| SkipReason::NotRegistered)?;

        let kb = self
            .repository
            .get(name.as_str())
            .await
            .map_err(|e| SkipReason::SearchFailed(e.to_string()))?
            .ok_or(SkipReason::NotRegistered)?;

        if !kb.is_compatible_with(model) {
            return Err(SkipReason::IncompatibleEmbedding {
                registered_model: kb.embedding_model().to_string(),
            });
        }

        let results = self
            .indexes
            .search(&name, model.family(), query, k)
            .await
            .map_err(|e| SkipReason::from_error(&e))?;

        Ok(results
            .into_iter()
            .map(|(chunk, distance)| RetrievalHit::new(chunk, distance, kb_name))
            .collect())
    }
}
