//! Answer synthesis types and prompt templates

pub mod prompt;

use serde::{Deserialize, Serialize};

use crate::domain::retrieval::{rank_hits, KbRetrieval, RetrievalHit};

/// Citation as presented to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source_document: String,
    /// 1-based page
    pub page: u32,
    pub similarity_score: f32,
    pub kb_name: String,
}

impl From<&RetrievalHit> for Source {
    fn from(hit: &RetrievalHit) -> Self {
        Self {
            source_document: hit.source().to_string(),
            page: hit.chunk.metadata.display_page(),
            similarity_score: hit.similarity,
            kb_name: hit.kb_name.clone(),
        }
    }
}

/// Sources of one knowledge base, deduplicated within that KB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbSources {
    pub kb_name: String,
    pub sources: Vec<Source>,
}

impl KbSources {
    /// Group per-KB hits in request order, skipping KBs without hits
    pub fn from_retrievals(results: &[KbRetrieval]) -> Vec<KbSources> {
        results
            .iter()
            .filter(|r| r.has_hits())
            .map(|r| KbSources {
                kb_name: r.kb_name.clone(),
                sources: rank_hits(r.hits().to_vec()).iter().map(Source::from).collect(),
            })
            .collect()
    }
}

/// Answer produced from a single knowledge base's context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbAnswer {
    pub kb_name: String,
    pub answer: String,
}

/// How the final answer text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Answer from exactly one knowledge base
    SingleSource,
    /// Cross-KB synthesis answer
    Synthesized,
    /// Nothing relevant was found
    NoInformation,
    /// Answered without retrieval
    Direct,
    /// Generation failed; the text describes the failure
    Error,
}

/// Final answer with its citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedAnswer {
    pub answer: String,
    pub status: AnswerStatus,
    /// Deduplicated, ranked hits across all queried KBs
    pub citations: Vec<RetrievalHit>,
    pub sources_by_kb: Vec<KbSources>,
    /// Per-KB answers, retained as a degraded fallback
    pub kb_answers: Vec<KbAnswer>,
}

impl SynthesizedAnswer {
    pub fn no_information(kb_count: usize) -> Self {
        Self {
            answer: prompt::no_information_message(kb_count),
            status: AnswerStatus::NoInformation,
            citations: Vec::new(),
            sources_by_kb: Vec::new(),
            kb_answers: Vec::new(),
        }
    }

    pub fn direct(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            status: AnswerStatus::Direct,
            citations: Vec::new(),
            sources_by_kb: Vec::new(),
            kb_answers: Vec::new(),
        }
    }

    pub fn sources(&self) -> Vec<Source> {
        self.citations.iter().map(Source::from).collect()
    }

    /// Wire shape handed to the persistence layer
    pub fn to_response(&self) -> QueryResponse {
        QueryResponse {
            answer: self.answer.clone(),
            status: self.status,
            sources: self.sources(),
            sources_by_kb: self.sources_by_kb.clone(),
        }
    }
}

/// Serializable query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub status: AnswerStatus,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_by_kb: Vec<KbSources>,
}
