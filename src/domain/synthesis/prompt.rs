//! Prompt and message templates for answer generation

use crate::domain::retrieval::RetrievalHit;

/// System prompt for answers without retrieval
pub const DIRECT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Provide informative, \
accurate, and helpful responses to the user's questions. If you don't know the answer to \
something, be honest about it rather than making up information.";

/// Context block for a single knowledge base answer
pub fn kb_context(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Document: {}, Page: {}, Knowledge Base: {}\n{}",
                hit.source(),
                hit.chunk.metadata.display_page(),
                hit.kb_name,
                hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Instruction for answering from one knowledge base's context
pub fn kb_answer_prompt(query: &str, context: &str) -> String {
    format!(
        "You are an enterprise retrieval assistant answering from the documents of a knowledge base.\n\n\
         Answer the question using only the context below. If the context does not contain the answer, \
         say that you don't know instead of making one up.\n\n\
         If the content is in Arabic or another language, answer in that language and do not translate it \
         unless asked.\n\n\
         Always cite document names and page numbers as sources.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer (keeping the original language of the content):",
        context, query
    )
}

/// Context block for cross-KB synthesis, with relevance shown as a percentage
pub fn synthesis_context(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Information from {} - {}, Page {} (Relevance: {}%):\n{}",
                hit.kb_name,
                hit.source(),
                hit.chunk.metadata.display_page(),
                (hit.similarity * 100.0) as u32,
                hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Instruction for combining information from several knowledge bases
pub fn synthesis_prompt(query: &str, context: &str) -> String {
    format!(
        "Using information from several knowledge bases, give a complete answer to the query: \"{}\"\n\n\
         Remember:\n\
         - Keep the original language of the content (Arabic content stays in Arabic).\n\
         - Cite every claim with the knowledge base name, document name and page number.\n\
         - Prefer information from sources with a higher relevance percentage.\n\
         - Address the query directly.\n\n\
         Relevant information from the knowledge bases:\n\n{}\n\n\
         Give a well-structured answer that addresses the query.",
        query, context
    )
}

/// Fixed answer when none of the selected knowledge bases produced anything
pub fn no_information_message(kb_count: usize) -> String {
    format!(
        "I couldn't find any relevant information in the {} selected knowledge bases. \
         Please check if these knowledge bases contain the information you're looking for, \
         or try rephrasing your question.",
        kb_count
    )
}

/// Error-shaped answer kept in the conversation when generation fails
pub fn error_message(error: &impl std::fmt::Display) -> String {
    format!(
        "I encountered an error while processing your query: {}",
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::{Chunk, ChunkMetadata};

    fn hit(kb: &str, source: &str, page: u32, distance: f32, text: &str) -> RetrievalHit {
        RetrievalHit::new(Chunk::new(text, ChunkMetadata::new(source, page)), distance, kb)
    }

    #[test]
    fn test_kb_context_uses_one_based_pages() {
        let context = kb_context(&[
            hit("kb_hr", "policy.pdf", 0, 0.0, "Leave is 30 days."),
            hit("kb_hr", "policy.pdf", 4, 0.5, "Remote work allowed."),
        ]);

        assert_eq!(
            context,
            "Document: policy.pdf, Page: 1, Knowledge Base: kb_hr\nLeave is 30 days.\n\n\
             Document: policy.pdf, Page: 5, Knowledge Base: kb_hr\nRemote work allowed."
        );
    }

    #[test]
    fn test_synthesis_context_shows_relevance() {
        let context = synthesis_context(&[hit("kb_it", "vpn.docx", 2, 1.0, "Use the VPN.")]);

        assert_eq!(
            context,
            "Information from kb_it - vpn.docx, Page 3 (Relevance: 50%):\nUse the VPN."
        );
    }

    #[test]
    fn test_prompts_embed_query_and_context() {
        let prompt = kb_answer_prompt("How long is leave?", "CTX");
        assert!(prompt.contains("Question: How long is leave?"));
        assert!(prompt.contains("Context:\nCTX"));

        let prompt = synthesis_prompt("How long is leave?", "CTX");
        assert!(prompt.contains("\"How long is leave?\""));
        assert!(prompt.ends_with("Give a well-structured answer that addresses the query."));
    }

    #[test]
    fn test_no_information_message() {
        assert!(no_information_message(3)
            .starts_with("I couldn't find any relevant information in the 3 selected knowledge bases."));
    }
}
