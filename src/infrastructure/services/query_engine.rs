//! Query engine - retrieval followed by per-KB answers and cross-KB synthesis

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::RetrievalService;
use crate::config::{NoResultPolicy, RetrievalConfig};
use crate::domain::retrieval::merge_retrievals;
use crate::domain::synthesis::{prompt, KbSources};
use crate::domain::{
    AnswerStatus, DomainError, KbAnswer, KbRetrieval, LlmProvider, LlmProviderResolver,
    LlmRequest, Message, RetrievalHit, SynthesizedAnswer,
};

/// A question over a set of knowledge bases
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub kb_names: Vec<String>,
    pub embedding_model: String,
    pub chat_model: String,
    /// Hits per knowledge base; the configured default when unset
    pub top_k: Option<usize>,
    /// Prior conversation, only used when answering without retrieval
    pub history: Vec<Message>,
}

impl QueryRequest {
    pub fn new(
        query: impl Into<String>,
        kb_names: Vec<String>,
        embedding_model: impl Into<String>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            kb_names,
            embedding_model: embedding_model.into(),
            chat_model: chat_model.into(),
            top_k: None,
            history: Vec::new(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// A query that failed after retrieval; keeps what was already produced
#[derive(Debug, Error)]
#[error("Failed to answer query: {source}")]
pub struct QueryError {
    pub citations: Vec<RetrievalHit>,
    pub sources_by_kb: Vec<KbSources>,
    pub kb_answers: Vec<KbAnswer>,
    #[source]
    pub source: DomainError,
}

impl QueryError {
    fn bare(source: DomainError) -> Self {
        Self {
            citations: Vec::new(),
            sources_by_kb: Vec::new(),
            kb_answers: Vec::new(),
            source,
        }
    }

    /// Error-shaped answer that still carries sources and per-KB answers
    pub fn into_answer(self) -> SynthesizedAnswer {
        SynthesizedAnswer {
            answer: prompt::error_message(&self.source),
            status: AnswerStatus::Error,
            citations: self.citations,
            sources_by_kb: self.sources_by_kb,
            kb_answers: self.kb_answers,
        }
    }
}

/// Answers questions from the selected knowledge bases
pub struct QueryEngine {
    retrieval: Arc<RetrievalService>,
    llms: Arc<dyn LlmProviderResolver>,
    config: RetrievalConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl QueryEngine {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        llms: Arc<dyn LlmProviderResolver>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            retrieval,
            llms,
            config,
        }
    }

    /// Answer a query; failures become an error-shaped answer
    pub async fn query(&self, request: &QueryRequest) -> SynthesizedAnswer {
        match self.try_query(request).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "Query failed");
                e.into_answer()
            }
        }
    }

    /// Answer a query, propagating generation failures
    #[instrument(
        skip(self, request),
        fields(
            kb_count = request.kb_names.len(),
            embedding_model = %request.embedding_model,
            chat_model = %request.chat_model
        )
    )]
    pub async fn try_query(&self, request: &QueryRequest) -> Result<SynthesizedAnswer, QueryError> {
        if request.query.trim().is_empty() {
            return Err(QueryError::bare(DomainError::invalid_argument(
                "Query cannot be empty",
            )));
        }

        let k = request.top_k.unwrap_or(self.config.top_k);
        if k == 0 {
            return Err(QueryError::bare(DomainError::invalid_argument(
                "top_k must be greater than 0",
            )));
        }

        let results = self
            .retrieval
            .retrieve_by_kb(&request.query, &request.kb_names, &request.embedding_model, k)
            .await;

        let citations = merge_retrievals(&results);
        let sources_by_kb = KbSources::from_retrievals(&results);

        let kb_answers = if results.iter().any(KbRetrieval::has_hits) {
            let llm = self
                .llms
                .resolve(&request.chat_model)
                .map_err(|e| QueryError {
                    citations: citations.clone(),
                    sources_by_kb: sources_by_kb.clone(),
                    kb_answers: Vec::new(),
                    source: e,
                })?;
            self.answer_per_kb(llm.as_ref(), request, &results).await
        } else {
            Vec::new()
        };

        match kb_answers.len() {
            0 => self.no_answer(request).await,
            1 => {
                info!(kb_name = %kb_answers[0].kb_name, "Answered from a single knowledge base");
                Ok(SynthesizedAnswer {
                    answer: kb_answers[0].answer.clone(),
                    status: AnswerStatus::SingleSource,
                    citations,
                    sources_by_kb,
                    kb_answers,
                })
            }
            count => {
                let top: Vec<RetrievalHit> = citations.iter().take(2 * k).cloned().collect();
                let synthesis = self
                    .synthesize(&request.query, &request.chat_model, &top)
                    .await;

                match synthesis {
                    Ok(answer) => {
                        info!(kb_answers = count, "Synthesized answer across knowledge bases");
                        Ok(SynthesizedAnswer {
                            answer,
                            status: AnswerStatus::Synthesized,
                            citations,
                            sources_by_kb,
                            kb_answers,
                        })
                    }
                    Err(e) => Err(QueryError {
                        citations,
                        sources_by_kb,
                        kb_answers,
                        source: DomainError::synthesis_failure(e.to_string()),
                    }),
                }
            }
        }
    }

    /// Answer from the chat model alone, with the caller's prior messages
    #[instrument(skip(self, query, history), fields(history = history.len()))]
    pub async fn answer_direct(
        &self,
        query: &str,
        chat_model: &str,
        history: &[Message],
    ) -> Result<SynthesizedAnswer, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::invalid_argument("Query cannot be empty"));
        }

        let llm = self.llms.resolve(chat_model)?;
        let request = LlmRequest::builder()
            .system(prompt::DIRECT_SYSTEM_PROMPT)
            .messages(Message::conversation(history))
            .user(query)
            .temperature(self.config.temperature)
            .build();

        let response = llm.chat(chat_model, request).await?;

        Ok(SynthesizedAnswer::direct(response.content()))
    }

    async fn no_answer(&self, request: &QueryRequest) -> Result<SynthesizedAnswer, QueryError> {
        match self.config.no_result_policy {
            NoResultPolicy::Report => Ok(SynthesizedAnswer::no_information(request.kb_names.len())),
            NoResultPolicy::DirectAnswer => {
                info!("No knowledge base answered, falling back to a direct answer");
                self.answer_direct(&request.query, &request.chat_model, &request.history)
                    .await
                    .map_err(QueryError::bare)
            }
        }
    }

    async fn answer_per_kb(
        &self,
        llm: &dyn LlmProvider,
        request: &QueryRequest,
        results: &[KbRetrieval],
    ) -> Vec<KbAnswer> {
        let mut answers = Vec::new();

        for result in results.iter().filter(|r| r.has_hits()) {
            let context = prompt::kb_context(result.hits());
            let chat = LlmRequest::builder()
                .user(prompt::kb_answer_prompt(&request.query, &context))
                .temperature(self.config.temperature)
                .build();

            match llm.chat(&request.chat_model, chat).await {
                Ok(response) => answers.push(KbAnswer {
                    kb_name: result.kb_name.clone(),
                    answer: response.content().to_string(),
                }),
                Err(e) => {
                    warn!(kb_name = %result.kb_name, error = %e, "Knowledge base answer failed");
                }
            }
        }

        answers
    }

    async fn synthesize(
        &self,
        query: &str,
        chat_model: &str,
        hits: &[RetrievalHit],
    ) -> Result<String, DomainError> {
        let llm = self.llms.resolve(chat_model)?;
        let context = prompt::synthesis_context(hits);
        let request = LlmRequest::builder()
            .user(prompt::synthesis_prompt(query, &context))
            .temperature(self.config.temperature)
            .build();

        let response = llm.chat(chat_model, request).await?;

        Ok(response.content().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{MockEmbeddingProvider, StaticEmbeddingResolver};
    use crate::domain::llm::{MessageRole, MockLlmProvider, StaticLlmResolver};
    use crate::domain::vector_index::{IndexEntry, MockVectorIndexStore, VectorIndex};
    use crate::domain::{
        Chunk, ChunkMetadata, ChunkingStrategyKind, EmbeddingModel, EmbeddingProviderResolver,
        KnowledgeBase, KnowledgeBaseName, KnowledgeBaseRepository,
    };
    use crate::infrastructure::knowledge_base::InMemoryKnowledgeBaseRepository;
    use crate::infrastructure::services::VectorIndexService;

    const QUERY: &str = "what does the warranty cover";
    const SYNTHESIS_MARKER: &str = "Using information from several knowledge bases";

    fn name(value: &str) -> KnowledgeBaseName {
        KnowledgeBaseName::new(value).unwrap()
    }

    fn index(kb: &str, pages: &[(&str, u32, f32)]) -> VectorIndex {
        let mut index = VectorIndex::new(name(kb), &EmbeddingModel::parse("llama3.2").unwrap());
        index
            .append(
                pages
                    .iter()
                    .map(|(source, page, offset)| {
                        IndexEntry::new(
                            Chunk::new(
                                format!("{} says something on page {}", source, page),
                                ChunkMetadata::new(*source, *page),
                            ),
                            vec![*offset, 0.0],
                        )
                    })
                    .collect(),
            )
            .unwrap();
        index
    }

    async fn create_engine(
        kbs: &[&str],
        indexes: Vec<VectorIndex>,
        llm: Arc<MockLlmProvider>,
        policy: NoResultPolicy,
    ) -> QueryEngine {
        let repository = Arc::new(InMemoryKnowledgeBaseRepository::new());
        for kb in kbs {
            repository
                .create(KnowledgeBase::new(name(kb), "llama3.2", ChunkingStrategyKind::Recursive))
                .await
                .unwrap();
        }

        let store = indexes
            .into_iter()
            .fold(MockVectorIndexStore::new(), |store, index| store.with_index(index));
        let embeddings: Arc<dyn EmbeddingProviderResolver> = Arc::new(
            StaticEmbeddingResolver::new(Arc::new(
                MockEmbeddingProvider::new("mock", 2).with_vector(QUERY, vec![0.0, 0.0]),
            )),
        );
        let index_service = Arc::new(VectorIndexService::new(Arc::new(store), embeddings.clone()));
        let retrieval = Arc::new(RetrievalService::new(index_service, repository, embeddings));

        let config = RetrievalConfig {
            no_result_policy: policy,
            ..RetrievalConfig::default()
        };

        QueryEngine::new(retrieval, Arc::new(StaticLlmResolver::new(llm)), config)
    }

    fn request(kbs: &[&str]) -> QueryRequest {
        QueryRequest::new(
            QUERY,
            kbs.iter().map(|kb| kb.to_string()).collect(),
            "llama3.2",
            "llama3.2",
        )
    }

    #[tokio::test]
    async fn test_empty_kb_set_reports_no_information() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_reply("unused"));
        let engine = create_engine(&[], vec![], llm.clone(), NoResultPolicy::Report).await;

        let answer = engine.query(&request(&[])).await;

        assert_eq!(answer.status, AnswerStatus::NoInformation);
        assert!(answer.answer.starts_with(
            "I couldn't find any relevant information in the 0 selected knowledge bases."
        ));
        assert!(answer.citations.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_kb_with_hits_skips_synthesis() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_reply("Two years, see manual.pdf p.1"));
        let engine = create_engine(
            &["kb_manual", "kb_empty"],
            vec![index("kb_manual", &[("manual.pdf", 0, 0.1)])],
            llm.clone(),
            NoResultPolicy::Report,
        )
        .await;

        let answer = engine.query(&request(&["kb_manual", "kb_empty"])).await;

        assert_eq!(answer.status, AnswerStatus::SingleSource);
        assert_eq!(answer.answer, "Two years, see manual.pdf p.1");
        assert_eq!(answer.kb_answers.len(), 1);
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.sources()[0].page, 1);
        assert_eq!(llm.call_count(), 1);

        let transcript = llm.requests()[0].transcript();
        assert!(transcript.contains("Document: manual.pdf, Page: 1, Knowledge Base: kb_manual"));
        assert!(!transcript.contains(SYNTHESIS_MARKER));
    }

    #[tokio::test]
    async fn test_two_kbs_with_hits_are_synthesized() {
        let llm = Arc::new(
            MockLlmProvider::new("mock")
                .reply_when(SYNTHESIS_MARKER, "combined answer")
                .reply_when("Knowledge Base: kb_one", "answer one")
                .reply_when("Knowledge Base: kb_two", "answer two"),
        );
        let engine = create_engine(
            &["kb_one", "kb_two"],
            vec![
                index("kb_one", &[("one.pdf", 0, 0.1), ("one.pdf", 1, 0.5)]),
                index("kb_two", &[("two.docx", 0, 0.2)]),
            ],
            llm.clone(),
            NoResultPolicy::Report,
        )
        .await;

        let answer = engine.query(&request(&["kb_one", "kb_two"])).await;

        assert_eq!(answer.status, AnswerStatus::Synthesized);
        assert_eq!(answer.answer, "combined answer");
        assert_eq!(
            answer.kb_answers,
            vec![
                KbAnswer {
                    kb_name: "kb_one".into(),
                    answer: "answer one".into()
                },
                KbAnswer {
                    kb_name: "kb_two".into(),
                    answer: "answer two".into()
                },
            ]
        );
        assert_eq!(answer.citations.len(), 3);
        assert_eq!(answer.sources_by_kb.len(), 2);
        assert_eq!(llm.call_count(), 3);

        let synthesis = llm.requests()[2].transcript();
        assert!(synthesis.contains("Information from kb_one - one.pdf, Page 1"));
        assert!(synthesis.contains("Information from kb_two - two.docx, Page 1"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_kb_answers() {
        let llm = Arc::new(
            MockLlmProvider::new("mock")
                .fail_when(SYNTHESIS_MARKER, "model crashed")
                .with_reply("partial answer"),
        );
        let engine = create_engine(
            &["kb_one", "kb_two"],
            vec![
                index("kb_one", &[("one.pdf", 0, 0.1)]),
                index("kb_two", &[("two.pdf", 0, 0.2)]),
            ],
            llm,
            NoResultPolicy::Report,
        )
        .await;

        let error = engine
            .try_query(&request(&["kb_one", "kb_two"]))
            .await
            .unwrap_err();
        assert!(matches!(error.source, DomainError::SynthesisFailure { .. }));
        assert_eq!(error.kb_answers.len(), 2);

        let answer = engine.query(&request(&["kb_one", "kb_two"])).await;
        assert_eq!(answer.status, AnswerStatus::Error);
        assert!(answer
            .answer
            .starts_with("I encountered an error while processing your query:"));
        assert_eq!(answer.kb_answers.len(), 2);
        assert_eq!(answer.citations.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_only_kb_answer_reports_no_information() {
        let llm = Arc::new(MockLlmProvider::new("mock").fail_when("Knowledge Base:", "timeout"));
        let engine = create_engine(
            &["kb_manual"],
            vec![index("kb_manual", &[("manual.pdf", 0, 0.1)])],
            llm,
            NoResultPolicy::Report,
        )
        .await;

        let answer = engine.query(&request(&["kb_manual"])).await;

        assert_eq!(answer.status, AnswerStatus::NoInformation);
        assert!(answer.citations.is_empty());
    }

    #[tokio::test]
    async fn test_direct_answer_policy_when_nothing_found() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_reply("general knowledge answer"));
        let engine = create_engine(&["kb_empty"], vec![], llm.clone(), NoResultPolicy::DirectAnswer).await;

        let answer = engine
            .query(&request(&["kb_empty"]).with_history(vec![
                Message::user("hello"),
                Message::assistant("hi"),
            ]))
            .await;

        assert_eq!(answer.status, AnswerStatus::Direct);
        assert_eq!(answer.answer, "general knowledge answer");

        let sent = &llm.requests()[0];
        assert_eq!(sent.messages.len(), 4);
        assert_eq!(sent.messages[0].role, MessageRole::System);
        assert_eq!(sent.messages[3].content, QUERY);
    }

    #[tokio::test]
    async fn test_answer_direct_rejects_empty_query() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_reply("x"));
        let engine = create_engine(&[], vec![], llm.clone(), NoResultPolicy::Report).await;

        let result = engine.answer_direct("  ", "gpt-4o-mini", &[]).await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_top_k_is_invalid() {
        let llm = Arc::new(MockLlmProvider::new("mock").with_reply("x"));
        let engine = create_engine(&[], vec![], llm, NoResultPolicy::Report).await;

        let answer = engine.query(&request(&["kb_a"]).with_top_k(0)).await;

        assert_eq!(answer.status, AnswerStatus::Error);
    }
}
