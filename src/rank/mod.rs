//! Pure re-ranking core: orderings, group indexing, fair position bands,
//! band-constrained assignment, and rank distance.

pub mod assignment;
pub mod bands;
pub mod distance;
pub mod grouping;
pub mod ordering;
