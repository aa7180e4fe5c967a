//! The pre-built disaster-management corpus: vector index plus passages.

pub mod check;
pub mod index;
pub mod passages;

pub use check::{verify_alignment, CorpusReport};
pub use index::{FlatIndex, Neighbor, VectorIndex};
pub use passages::{Passage, PassageStore};
