use yogamatch_core::{EmbeddingError, PoseRecord, ScoringWeights, UserProfile};

/// How a profile is compared with a pose.
///
/// `prepare` runs once per request and returns the request-scoped state
/// (encoded profile fields, memoized issue vectors); it is dropped when the
/// request ends, so nothing leaks between requests.
pub trait ScoringStrategy: Send + Sync {
    type Query;

    fn name(&self) -> &'static str;

    /// Similarity above which a pose is discarded for an issue
    fn default_discard_threshold(&self) -> f32;

    /// Vector length this strategy compares against, if it uses embeddings
    fn dimension(&self) -> Option<usize> {
        None
    }

    fn prepare(&self, profile: &UserProfile) -> Result<Self::Query, EmbeddingError>;

    /// Similarity between one lower-cased issue and the pose's contraindications
    fn issue_similarity(
        &self,
        query: &mut Self::Query,
        issue: &str,
        pose: &PoseRecord,
    ) -> Result<f32, EmbeddingError>;

    fn term_similarities(&self, query: &Self::Query, pose: &PoseRecord) -> TermScores;
}

/// The five similarities that make up a composite score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TermScores {
    pub goals_benefits: f32,
    pub physical_benefits: f32,
    pub mental_benefits: f32,
    pub physical_match: f32,
    pub mental_match: f32,
}

impl TermScores {
    /// Weighted average of the five terms.
    pub fn composite(&self, weights: &ScoringWeights) -> f32 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }

        let terms = [
            self.goals_benefits,
            self.physical_benefits,
            self.mental_benefits,
            self.physical_match,
            self.mental_match,
        ];
        let weighted: f32 = terms
            .iter()
            .zip(weights.as_array())
            .map(|(term, weight)| term * weight)
            .sum();
        weighted / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_is_weighted_average() {
        let weights = ScoringWeights::default();

        let goals_only = TermScores {
            goals_benefits: 1.0,
            ..Default::default()
        };
        assert!((goals_only.composite(&weights) - 0.25).abs() < 1e-6);

        let all = TermScores {
            goals_benefits: 1.0,
            physical_benefits: 1.0,
            mental_benefits: 1.0,
            physical_match: 1.0,
            mental_match: 1.0,
        };
        assert!((all.composite(&weights) - 1.0).abs() < 1e-6);

        let matches_only = TermScores {
            physical_match: 0.5,
            mental_match: -0.5,
            ..Default::default()
        };
        assert_eq!(matches_only.composite(&weights), 0.0);
    }

    #[test]
    fn zero_weights_yield_zero() {
        let weights = ScoringWeights {
            goals_benefits: 0.0,
            physical_benefits: 0.0,
            mental_benefits: 0.0,
            physical_match: 0.0,
            mental_match: 0.0,
        };
        let scores = TermScores {
            goals_benefits: 1.0,
            ..Default::default()
        };
        assert_eq!(scores.composite(&weights), 0.0);
    }
}
