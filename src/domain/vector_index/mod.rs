//! Vector index domain types and storage trait

mod index;
mod store;

pub use index::{squared_l2, IndexEntry, VectorIndex};
pub use store::VectorIndexStore;

#[cfg(test)]
pub use store::mock::MockVectorIndexStore;
