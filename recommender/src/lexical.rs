use crate::strategy::{ScoringStrategy, TermScores};
use std::collections::HashSet;
use yogamatch_core::{EmbeddingError, PoseRecord, StrategyKind, UserProfile};

/// Jaccard word overlap against the raw pose texts; needs no embedding model.
///
/// Scores are not comparable with [`crate::SemanticStrategy`] and the discard
/// threshold differs (0.3 instead of 0.25).
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalStrategy;

pub struct LexicalQuery {
    goals: String,
    physical: String,
    mental: String,
}

/// |A ∩ B| / |A ∪ B| over lower-cased whitespace-separated words.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f32 / union as f32
}

impl ScoringStrategy for LexicalStrategy {
    type Query = LexicalQuery;

    fn name(&self) -> &'static str {
        "lexical"
    }

    fn default_discard_threshold(&self) -> f32 {
        StrategyKind::Lexical.default_discard_threshold()
    }

    fn prepare(&self, profile: &UserProfile) -> Result<LexicalQuery, EmbeddingError> {
        Ok(LexicalQuery {
            goals: profile.goals_text(),
            physical: profile.physical_text(),
            mental: profile.mental_text(),
        })
    }

    fn issue_similarity(
        &self,
        _query: &mut LexicalQuery,
        issue: &str,
        pose: &PoseRecord,
    ) -> Result<f32, EmbeddingError> {
        Ok(jaccard_similarity(issue, &pose.contraindications))
    }

    fn term_similarities(&self, query: &LexicalQuery, pose: &PoseRecord) -> TermScores {
        TermScores {
            goals_benefits: jaccard_similarity(&query.goals, &pose.benefits),
            physical_benefits: jaccard_similarity(&query.physical, &pose.benefits),
            mental_benefits: jaccard_similarity(&query.mental, &pose.benefits),
            physical_match: jaccard_similarity(&query.physical, &pose.targeted_physical_problems),
            mental_match: jaccard_similarity(&query.mental, &pose.targeted_mental_problems),
        }
    }
}
