use crate::filter::ContraindicationFilter;
use crate::lexical::LexicalStrategy;
use crate::semantic::SemanticStrategy;
use crate::strategy::ScoringStrategy;
use embedding_engine::TextEmbedder;
use pose_store::PoseStore;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use uuid::Uuid;
use yogamatch_core::{
    CoreError, EmbeddingError, ErrorReporter, PoseRecord, Recommendation, ScoringConfig,
    ScoringWeights, StrategyKind, UserProfile,
};

/// Ranks the corpus against one profile at a time.
///
/// Holds only shared read-only state; every call to [`Recommender::recommend`]
/// builds its own query state, so concurrent requests never observe each other.
pub struct Recommender<S> {
    store: Arc<PoseStore>,
    strategy: S,
    filter: ContraindicationFilter,
    weights: ScoringWeights,
    top_k: usize,
}

impl<S: ScoringStrategy> Recommender<S> {
    pub fn new(
        store: Arc<PoseStore>,
        strategy: S,
        config: &ScoringConfig,
    ) -> Result<Self, EmbeddingError> {
        if let Some(dimension) = strategy.dimension() {
            if dimension != store.dimension() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: store.dimension(),
                    actual: dimension,
                });
            }
        }

        let threshold = config
            .contraindication_threshold
            .unwrap_or_else(|| strategy.default_discard_threshold());

        Ok(Self {
            store,
            filter: ContraindicationFilter::new(threshold),
            weights: config.weights,
            top_k: config.top_k,
            strategy,
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn filter(&self) -> &ContraindicationFilter {
        &self.filter
    }

    /// Up to `top_k` poses with a positive score, best first.
    ///
    /// Equal scores keep corpus order. Scores are compared at full precision
    /// and only rounded in the returned rows.
    pub fn recommend(&self, profile: &UserProfile) -> Result<Vec<Recommendation>, CoreError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("recommend", %request_id, strategy = self.strategy.name());
        let _guard = span.enter();

        let mut query = self.strategy.prepare(profile)?;
        let issues: Vec<String> = profile.issues().collect();

        let mut discarded = 0usize;
        let mut scored: Vec<(&PoseRecord, f32)> = Vec::new();
        for pose in self.store.iter() {
            if let Some(reason) = self
                .filter
                .check(&self.strategy, &mut query, &issues, pose)?
            {
                debug!(pose = %pose.name, reason = ?reason, "Discarded pose");
                discarded += 1;
                continue;
            }

            let score = self
                .strategy
                .term_similarities(&query, pose)
                .composite(&self.weights);
            if score > 0.0 {
                scored.push((pose, score));
            }
        }

        let candidates = scored.len();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.top_k);

        info!(
            discarded,
            scored = candidates,
            returned = scored.len(),
            "Ranked poses"
        );

        Ok(scored
            .into_iter()
            .map(|(pose, score)| Recommendation::from_pose(pose, score))
            .collect())
    }
}

/// Object-safe view of a [`Recommender`], for callers that pick the strategy at runtime.
pub trait RecommendationEngine: Send + Sync {
    fn recommend(&self, profile: &UserProfile) -> Result<Vec<Recommendation>, CoreError>;

    fn strategy_name(&self) -> &'static str;

    /// Like `recommend` but reports a failure and returns an empty list.
    fn recommend_or_empty(&self, profile: &UserProfile) -> Vec<Recommendation> {
        match self.recommend(profile) {
            Ok(recommendations) => recommendations,
            Err(error) => {
                ErrorReporter::new().report_error(&error);
                Vec::new()
            }
        }
    }
}

impl<S: ScoringStrategy> RecommendationEngine for Recommender<S> {
    fn recommend(&self, profile: &UserProfile) -> Result<Vec<Recommendation>, CoreError> {
        Recommender::recommend(self, profile)
    }

    fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

/// Builds the engine named by `config.strategy`.
///
/// The semantic strategy needs `embedder`; the lexical one ignores it.
pub fn build_engine(
    store: Arc<PoseStore>,
    embedder: Option<Arc<dyn TextEmbedder>>,
    config: &ScoringConfig,
) -> Result<Box<dyn RecommendationEngine>, CoreError> {
    let engine: Box<dyn RecommendationEngine> = match config.strategy {
        StrategyKind::Semantic => {
            let embedder = embedder.ok_or_else(|| EmbeddingError::ModelNotFound {
                model_name: "semantic scoring requires an embedding model".to_string(),
            })?;
            Box::new(Recommender::new(
                store,
                SemanticStrategy::new(embedder),
                config,
            )?)
        }
        StrategyKind::Lexical => Box::new(Recommender::new(store, LexicalStrategy, config)?),
    };

    info!(strategy = engine.strategy_name(), "Recommendation engine ready");
    Ok(engine)
}
