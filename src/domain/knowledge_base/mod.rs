//! Knowledge base registry domain

mod entity;
mod repository;
mod validation;

pub use entity::{KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseName};
pub use repository::KnowledgeBaseRepository;
pub use validation::{validate_knowledge_base_name, KnowledgeBaseValidationError, MAX_KB_NAME_LENGTH};

#[cfg(test)]
pub use repository::MockKnowledgeBaseRepository;
