//! PostgreSQL knowledge base registry

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::ingestion::{ChunkingStrategyKind, DocumentType};
use crate::domain::knowledge_base::{
    KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseName, KnowledgeBaseRepository,
};
use crate::domain::DomainError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS knowledge_bases (
        name VARCHAR(64) PRIMARY KEY,
        embedding_model TEXT NOT NULL,
        chunking_strategy VARCHAR(32) NOT NULL,
        document_count BIGINT NOT NULL DEFAULT 0,
        chunk_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS kb_documents (
        id UUID PRIMARY KEY,
        kb_name VARCHAR(64) NOT NULL REFERENCES knowledge_bases(name) ON DELETE CASCADE,
        filename TEXT NOT NULL,
        document_type VARCHAR(8) NOT NULL,
        page_count INTEGER NOT NULL,
        chunk_count INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_kb_documents_kb_name ON kb_documents(kb_name)",
];

const KB_COLUMNS: &str =
    "name, embedding_model, chunking_strategy, document_count, chunk_count, created_at";

/// Registry backed by PostgreSQL using runtime-checked queries
#[derive(Debug, Clone)]
pub struct PostgresKnowledgeBaseRepository {
    pool: PgPool,
}

impl PostgresKnowledgeBaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Creates the registry tables if they don't exist
    pub async fn migrate(&self) -> Result<(), DomainError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to run migration: {}", e)))?;
        }

        Ok(())
    }

    fn kb_from_row(row: &PgRow) -> Result<KnowledgeBase, DomainError> {
        let name: String = row.get("name");
        let strategy: String = row.get("chunking_strategy");
        let document_count: i64 = row.get("document_count");
        let chunk_count: i64 = row.get("chunk_count");
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(KnowledgeBase::restore(
            KnowledgeBaseName::new(name)
                .map_err(|e| DomainError::storage(format!("Invalid stored KB name: {}", e)))?,
            row.get("embedding_model"),
            ChunkingStrategyKind::parse(&strategy)
                .map_err(|e| DomainError::storage(e.to_string()))?,
            document_count.max(0) as u64,
            chunk_count.max(0) as u64,
            created_at,
        ))
    }

    fn document_from_row(row: &PgRow) -> Result<KnowledgeBaseDocument, DomainError> {
        let kb_name: String = row.get("kb_name");
        let document_type: String = row.get("document_type");
        let page_count: i32 = row.get("page_count");
        let chunk_count: i32 = row.get("chunk_count");

        Ok(KnowledgeBaseDocument {
            id: row.get::<Uuid, _>("id"),
            kb_name: KnowledgeBaseName::new(kb_name)
                .map_err(|e| DomainError::storage(format!("Invalid stored KB name: {}", e)))?,
            filename: row.get("filename"),
            document_type: DocumentType::parse(&document_type)
                .map_err(|e| DomainError::storage(e.to_string()))?,
            page_count: page_count.max(0) as u32,
            chunk_count: chunk_count.max(0) as u32,
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl KnowledgeBaseRepository for PostgresKnowledgeBaseRepository {
    async fn get(&self, name: &str) -> Result<Option<KnowledgeBase>, DomainError> {
        let query = format!("SELECT {} FROM knowledge_bases WHERE name = $1", KB_COLUMNS);

        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get knowledge base: {}", e)))?;

        row.as_ref().map(Self::kb_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<KnowledgeBase>, DomainError> {
        let query = format!(
            "SELECT {} FROM knowledge_bases ORDER BY created_at DESC",
            KB_COLUMNS
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list knowledge bases: {}", e)))?;

        rows.iter().map(Self::kb_from_row).collect()
    }

    async fn create(&self, knowledge_base: KnowledgeBase) -> Result<KnowledgeBase, DomainError> {
        let query = format!(
            "INSERT INTO knowledge_bases ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            KB_COLUMNS
        );

        sqlx::query(&query)
            .bind(knowledge_base.name().as_str())
            .bind(knowledge_base.embedding_model())
            .bind(knowledge_base.chunking_strategy().as_str())
            .bind(knowledge_base.document_count() as i64)
            .bind(knowledge_base.chunk_count() as i64)
            .bind(knowledge_base.created_at())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("duplicate key") {
                    DomainError::conflict(format!(
                        "Knowledge base '{}' already exists",
                        knowledge_base.name()
                    ))
                } else {
                    DomainError::storage(format!("Failed to create knowledge base: {}", e))
                }
            })?;

        Ok(knowledge_base)
    }

    async fn record_document(
        &self,
        document: KnowledgeBaseDocument,
    ) -> Result<KnowledgeBase, DomainError> {
        let storage = |e: sqlx::Error| DomainError::storage(format!("Failed to record document: {}", e));

        let mut tx = self.pool.begin().await.map_err(storage)?;

        let query = format!(
            r#"
            UPDATE knowledge_bases
            SET document_count = document_count + 1, chunk_count = chunk_count + $2
            WHERE name = $1
            RETURNING {}
            "#,
            KB_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(document.kb_name.as_str())
            .bind(document.chunk_count as i64)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Knowledge base '{}' not found", document.kb_name))
            })?;
        let knowledge_base = Self::kb_from_row(&row)?;

        sqlx::query(
            r#"
            INSERT INTO kb_documents
                (id, kb_name, filename, document_type, page_count, chunk_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(document.id)
        .bind(document.kb_name.as_str())
        .bind(&document.filename)
        .bind(document.document_type.as_str())
        .bind(document.page_count as i32)
        .bind(document.chunk_count as i32)
        .bind(document.created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(knowledge_base)
    }

    async fn reset_documents(&self, kb_name: &str) -> Result<KnowledgeBase, DomainError> {
        let storage = |e: sqlx::Error| DomainError::storage(format!("Failed to reset documents: {}", e));

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("DELETE FROM kb_documents WHERE kb_name = $1")
            .bind(kb_name)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let query = format!(
            r#"
            UPDATE knowledge_bases
            SET document_count = 0, chunk_count = 0
            WHERE name = $1
            RETURNING {}
            "#,
            KB_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(kb_name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Knowledge base '{}' not found", kb_name))
            })?;
        let knowledge_base = Self::kb_from_row(&row)?;

        tx.commit().await.map_err(storage)?;

        Ok(knowledge_base)
    }

    async fn list_documents(
        &self,
        kb_name: &str,
    ) -> Result<Vec<KnowledgeBaseDocument>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, kb_name, filename, document_type, page_count, chunk_count, created_at
            FROM kb_documents
            WHERE kb_name = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(kb_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list documents: {}", e)))?;

        rows.iter().map(Self::document_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_both_tables() {
        let schema = SCHEMA.join("\n");

        assert!(schema.contains("CREATE TABLE IF NOT EXISTS knowledge_bases"));
        assert!(schema.contains("CREATE TABLE IF NOT EXISTS kb_documents"));
        assert!(schema.contains("REFERENCES knowledge_bases(name)"));
    }
}
