//! Batched embedding calls

use serde::{Deserialize, Serialize};

/// Texts to embed with one model, in one backend call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    inputs: Vec<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, inputs: Vec<String>) -> Self {
        Self {
            model: model.into(),
            inputs,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}

/// One vector, tagged with the position of its input in the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub index: usize,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, vector: Vec<f32>) -> Self {
        Self { index, vector }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub model: String,
    pub embeddings: Vec<Embedding>,
}

impl EmbeddingResponse {
    pub fn new(model: impl Into<String>, embeddings: Vec<Embedding>) -> Self {
        Self {
            model: model.into(),
            embeddings,
        }
    }

    /// Vectors in input order.
    ///
    /// Backends may answer out of order; the batch must still cover every
    /// input exactly once with vectors of one non-zero dimensionality.
    pub fn into_vectors(self, expected: usize) -> Result<Vec<Vec<f32>>, String> {
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

        for embedding in self.embeddings {
            let slot = slots
                .get_mut(embedding.index)
                .ok_or_else(|| format!("Embedding index {} out of range", embedding.index))?;
            if slot.replace(embedding.vector).is_some() {
                return Err(format!("Duplicate embedding index {}", embedding.index));
            }
        }

        let vectors: Vec<Vec<f32>> = slots
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| format!("Missing embedding for input {}", i)))
            .collect::<Result<_, _>>()?;

        if let Some(first) = vectors.first() {
            let dimensions = first.len();
            if dimensions == 0 || vectors.iter().any(|v| v.len() != dimensions) {
                return Err("Embeddings have inconsistent dimensions".to_string());
            }
        }

        Ok(vectors)
    }
}
