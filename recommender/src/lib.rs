//! Pose ranking and context retrieval over a loaded [`pose_store::PoseStore`].

pub mod filter;
pub mod lexical;
pub mod retrieval;
pub mod scorer;
pub mod semantic;
pub mod strategy;

pub use filter::{ContraindicationFilter, Discard};
pub use lexical::{jaccard_similarity, LexicalQuery, LexicalStrategy};
pub use retrieval::{ContextHit, ContextRetriever};
pub use scorer::{build_engine, RecommendationEngine, Recommender};
pub use semantic::{SemanticQuery, SemanticStrategy};
pub use strategy::{ScoringStrategy, TermScores};
