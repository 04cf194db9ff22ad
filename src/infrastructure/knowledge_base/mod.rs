//! Knowledge base registry implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryKnowledgeBaseRepository;
pub use postgres::PostgresKnowledgeBaseRepository;
