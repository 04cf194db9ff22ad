//! Directory-per-index vector store on the local filesystem

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::embedding::EmbeddingFamily;
use crate::domain::knowledge_base::KnowledgeBaseName;
use crate::domain::vector_index::{IndexEntry, VectorIndex, VectorIndexStore};
use crate::domain::DomainError;

const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;
const TEMP_PREFIX: &str = ".index-";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    kb_name: String,
    family: String,
    embedding_model: String,
    dimensions: usize,
    count: usize,
    /// Hex SHA-256 of the serialized entries
    checksum: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    manifest: Manifest,
    entries: Vec<IndexEntry>,
}

fn checksum(entries: &[IndexEntry]) -> Result<String, DomainError> {
    let bytes = serde_json::to_vec(entries)
        .map_err(|e| DomainError::internal(format!("Failed to serialize index entries: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Stores each index as `{root}/{family}/{kb_name}/index.json`.
///
/// Writes go to a temp file in the index directory and are renamed into
/// place, so a concurrent reader sees either the old or the new index.
#[derive(Debug, Clone)]
pub struct FileVectorIndexStore {
    root: PathBuf,
}

impl FileVectorIndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_dir(&self, kb_name: &KnowledgeBaseName, family: &EmbeddingFamily) -> PathBuf {
        self.root.join(family.dir_name()).join(kb_name.as_str())
    }

    /// Names in `dir` other than in-flight temp files
    async fn visible_entries(dir: &Path) -> Result<Vec<String>, DomainError> {
        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|e| {
            DomainError::index_corrupt(dir.display().to_string(), e.to_string())
        })?;

        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            DomainError::index_corrupt(dir.display().to_string(), e.to_string())
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(TEMP_PREFIX) {
                names.push(name);
            }
        }

        Ok(names)
    }

    fn decode(
        path: &Path,
        bytes: &[u8],
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<VectorIndex, DomainError> {
        let corrupt = |message: String| DomainError::index_corrupt(path.display().to_string(), message);

        let persisted: PersistedIndex = serde_json::from_slice(bytes)
            .map_err(|e| corrupt(format!("Unparsable index: {}", e)))?;
        let manifest = persisted.manifest;

        if manifest.version != FORMAT_VERSION {
            return Err(corrupt(format!("Unsupported index version {}", manifest.version)));
        }

        if manifest.kb_name != kb_name.as_str() || manifest.family != family.dir_name() {
            return Err(corrupt(format!(
                "Index belongs to {}/{}",
                manifest.family, manifest.kb_name
            )));
        }

        if manifest.count != persisted.entries.len() {
            return Err(corrupt(format!(
                "Manifest lists {} entries, found {}",
                manifest.count,
                persisted.entries.len()
            )));
        }

        if checksum(&persisted.entries)? != manifest.checksum {
            return Err(corrupt("Checksum mismatch".to_string()));
        }

        VectorIndex::from_parts(
            kb_name.clone(),
            family.clone(),
            manifest.embedding_model,
            manifest.dimensions,
            persisted.entries,
        )
        .map_err(|e| corrupt(e.to_string()))
    }
}

#[async_trait]
impl VectorIndexStore for FileVectorIndexStore {
    async fn load(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<VectorIndex, DomainError> {
        let dir = self.index_dir(kb_name, family);
        let not_found = || DomainError::index_not_found(kb_name.as_str(), family.dir_name());

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(not_found()),
        }

        if Self::visible_entries(&dir).await?.is_empty() {
            return Err(not_found());
        }

        let path = dir.join(INDEX_FILE);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::index_corrupt(path.display().to_string(), e.to_string()))?;

        let index = Self::decode(&path, &bytes, kb_name, family)?;

        tracing::debug!(
            kb_name = %kb_name,
            family = %family,
            count = index.len(),
            "Loaded vector index"
        );

        Ok(index)
    }

    async fn save(&self, index: &VectorIndex) -> Result<(), DomainError> {
        let dir = self.index_dir(index.kb_name(), index.family());
        let persisted = PersistedIndex {
            manifest: Manifest {
                version: FORMAT_VERSION,
                kb_name: index.kb_name().to_string(),
                family: index.family().dir_name(),
                embedding_model: index.embedding_model().to_string(),
                dimensions: index.dimensions(),
                count: index.len(),
                checksum: checksum(index.entries())?,
            },
            entries: index.entries().to_vec(),
        };
        let bytes = serde_json::to_vec(&persisted)
            .map_err(|e| DomainError::internal(format!("Failed to serialize index: {}", e)))?;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let target = dir.join(INDEX_FILE);
        tokio::task::spawn_blocking(move || -> Result<(), DomainError> {
            let storage = |e: &dyn std::fmt::Display| {
                DomainError::storage(format!("Failed to write {}: {}", target.display(), e))
            };

            let mut file = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .tempfile_in(&dir)
                .map_err(|e| storage(&e))?;
            file.write_all(&bytes).map_err(|e| storage(&e))?;
            file.as_file().sync_all().map_err(|e| storage(&e))?;
            file.persist(&target).map_err(|e| storage(&e.error))?;

            Ok(())
        })
        .await
        .map_err(|e| DomainError::internal(format!("Index writer task failed: {}", e)))??;

        tracing::info!(
            kb_name = %index.kb_name(),
            family = %index.family(),
            count = index.len(),
            "Saved vector index"
        );

        Ok(())
    }

    async fn remove(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<(), DomainError> {
        let dir = self.index_dir(kb_name, family);

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::warn!(kb_name = %kb_name, family = %family, "Removed vector index");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove {}: {}",
                dir.display(),
                e
            ))),
        }
    }

    async fn exists(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<bool, DomainError> {
        let path = self.index_dir(kb_name, family).join(INDEX_FILE);

        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::EmbeddingModel;
    use crate::domain::ingestion::{Chunk, ChunkMetadata};
    use tempfile::TempDir;

    fn name(value: &str) -> KnowledgeBaseName {
        KnowledgeBaseName::new(value).unwrap()
    }

    fn model() -> EmbeddingModel {
        EmbeddingModel::parse("text-embedding-3-small").unwrap()
    }

    fn index_with(kb: &str, texts: &[&str]) -> VectorIndex {
        let mut index = VectorIndex::new(name(kb), &model());
        index
            .append(
                texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        IndexEntry::new(
                            Chunk::new(*t, ChunkMetadata::new("doc.pdf", i as u32)),
                            vec![i as f32, 0.5, -1.25],
                        )
                    })
                    .collect(),
            )
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        let index = index_with("kb_docs", &["alpha", "beta"]);

        store.save(&index).await.unwrap();
        let loaded = store.load(&name("kb_docs"), &model().family().clone()).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimensions(), 3);
        assert_eq!(loaded.entries(), index.entries());
        assert_eq!(loaded.embedding_model(), "text-embedding-3-small");
        assert!(dir.path().join("openai/kb_docs/index.json").is_file());
    }

    #[tokio::test]
    async fn test_missing_and_empty_dirs_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        let family = model().family().clone();

        let missing = store.load(&name("kb_none"), &family).await;
        assert!(matches!(missing, Err(DomainError::IndexNotFound { .. })));

        std::fs::create_dir_all(dir.path().join("openai/kb_empty")).unwrap();
        let empty = store.load(&name("kb_empty"), &family).await;
        assert!(matches!(empty, Err(DomainError::IndexNotFound { .. })));

        std::fs::create_dir_all(dir.path().join("openai")).unwrap();
        std::fs::write(dir.path().join("openai/kb_file"), b"x").unwrap();
        let not_dir = store.load(&name("kb_file"), &family).await;
        assert!(matches!(not_dir, Err(DomainError::IndexNotFound { .. })));
    }

    #[tokio::test]
    async fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        let kb_dir = dir.path().join("openai/kb_bad");
        std::fs::create_dir_all(&kb_dir).unwrap();
        std::fs::write(kb_dir.join(INDEX_FILE), b"{ not json").unwrap();

        let result = store.load(&name("kb_bad"), &model().family().clone()).await;

        assert!(matches!(result, Err(DomainError::IndexCorrupt { .. })));
    }

    #[tokio::test]
    async fn test_tampered_entries_fail_checksum() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        store.save(&index_with("kb_docs", &["alpha"])).await.unwrap();

        let path = dir.path().join("openai/kb_docs").join(INDEX_FILE);
        let tampered = std::fs::read_to_string(&path).unwrap().replace("alpha", "omega");
        std::fs::write(&path, tampered).unwrap();

        let result = store.load(&name("kb_docs"), &model().family().clone()).await;

        assert!(matches!(result, Err(DomainError::IndexCorrupt { .. })));
    }

    #[tokio::test]
    async fn test_unexpected_files_without_index_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        let kb_dir = dir.path().join("openai/kb_odd");
        std::fs::create_dir_all(&kb_dir).unwrap();
        std::fs::write(kb_dir.join("index.faiss"), b"\0\0").unwrap();

        let result = store.load(&name("kb_odd"), &model().family().clone()).await;

        assert!(matches!(result, Err(DomainError::IndexCorrupt { .. })));
    }

    #[tokio::test]
    async fn test_overwrite_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorIndexStore::new(dir.path());
        let family = model().family().clone();

        store.save(&index_with("kb_docs", &["a"])).await.unwrap();
        store.save(&index_with("kb_docs", &["a", "b", "c"])).await.unwrap();
        assert_eq!(store.load(&name("kb_docs"), &family).await.unwrap().len(), 3);
        assert!(store.exists(&name("kb_docs"), &family).await.unwrap());

        // No temp files are left behind
        let leftovers = std::fs::read_dir(dir.path().join("openai/kb_docs")).unwrap().count();
        assert_eq!(leftovers, 1);

        store.remove(&name("kb_docs"), &family).await.unwrap();
        assert!(!store.exists(&name("kb_docs"), &family).await.unwrap());
        store.remove(&name("kb_docs"), &family).await.unwrap();
    }
}
