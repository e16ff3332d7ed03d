use crate::strategy::{ScoringStrategy, TermScores};
use embedding_engine::{cosine_similarity, TextEmbedder};
use std::collections::HashMap;
use yogamatch_core::{EmbeddingError, PoseRecord, StrategyKind, UserProfile};

/// Cosine similarity between profile embeddings and the pose's precomputed embeddings.
pub struct SemanticStrategy<E> {
    embedder: E,
}

impl<E: TextEmbedder> SemanticStrategy<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

pub struct SemanticQuery {
    goals: Vec<f32>,
    physical: Vec<f32>,
    mental: Vec<f32>,
    issues: HashMap<String, Vec<f32>>,
}

impl<E: TextEmbedder> ScoringStrategy for SemanticStrategy<E> {
    type Query = SemanticQuery;

    fn name(&self) -> &'static str {
        "semantic"
    }

    fn default_discard_threshold(&self) -> f32 {
        StrategyKind::Semantic.default_discard_threshold()
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.embedder.dimension())
    }

    fn prepare(&self, profile: &UserProfile) -> Result<SemanticQuery, EmbeddingError> {
        Ok(SemanticQuery {
            goals: self.embedder.embed(&profile.goals_text())?,
            physical: self.embedder.embed(&profile.physical_text())?,
            mental: self.embedder.embed(&profile.mental_text())?,
            issues: HashMap::new(),
        })
    }

    fn issue_similarity(
        &self,
        query: &mut SemanticQuery,
        issue: &str,
        pose: &PoseRecord,
    ) -> Result<f32, EmbeddingError> {
        if !query.issues.contains_key(issue) {
            let vector = self.embedder.embed(issue)?;
            query.issues.insert(issue.to_string(), vector);
        }
        let vector = &query.issues[issue];
        Ok(cosine_similarity(vector, &pose.contraindications_embedding))
    }

    fn term_similarities(&self, query: &SemanticQuery, pose: &PoseRecord) -> TermScores {
        TermScores {
            goals_benefits: cosine_similarity(&query.goals, &pose.benefits_embedding),
            physical_benefits: cosine_similarity(&query.physical, &pose.benefits_embedding),
            mental_benefits: cosine_similarity(&query.mental, &pose.benefits_embedding),
            physical_match: cosine_similarity(&query.physical, &pose.physical_problems_embedding),
            mental_match: cosine_similarity(&query.mental, &pose.mental_problems_embedding),
        }
    }
}
