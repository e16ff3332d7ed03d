use crate::strategy::ScoringStrategy;
use yogamatch_core::{EmbeddingError, PoseRecord};

/// Why a pose was removed from a request's candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Discard {
    /// The issue text occurs verbatim in the contraindications
    Literal { issue: String },
    /// The issue is close enough to the contraindications under the active strategy
    Similar { issue: String, similarity: f32 },
}

impl Discard {
    pub fn issue(&self) -> &str {
        match self {
            Discard::Literal { issue } | Discard::Similar { issue, .. } => issue,
        }
    }
}

/// Removes poses whose contraindications match one of the user's issues.
#[derive(Debug, Clone, Copy)]
pub struct ContraindicationFilter {
    threshold: f32,
}

impl ContraindicationFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Checks `issues` in order and stops at the first match.
    ///
    /// `issues` are expected lower-cased and non-blank (see
    /// [`yogamatch_core::UserProfile::issues`]). A blank issue would match
    /// every pose literally, so it is skipped here as well.
    pub fn check<S: ScoringStrategy>(
        &self,
        strategy: &S,
        query: &mut S::Query,
        issues: &[String],
        pose: &PoseRecord,
    ) -> Result<Option<Discard>, EmbeddingError> {
        if issues.is_empty() {
            return Ok(None);
        }

        let contraindications = pose.contraindications.to_lowercase();
        for issue in issues {
            if issue.trim().is_empty() {
                continue;
            }

            if contraindications.contains(issue.as_str()) {
                return Ok(Some(Discard::Literal {
                    issue: issue.clone(),
                }));
            }

            let similarity = strategy.issue_similarity(query, issue, pose)?;
            if similarity > self.threshold {
                return Ok(Some(Discard::Similar {
                    issue: issue.clone(),
                    similarity,
                }));
            }
        }

        Ok(None)
    }
}
