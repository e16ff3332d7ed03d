use embedding_engine::{HashingEmbedder, TextEmbedder};
use pose_store::PoseStore;
use recommender::{
    build_engine, ContextRetriever, LexicalStrategy, RecommendationEngine, Recommender,
    SemanticStrategy,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use yogamatch_core::{
    CoreError, EmbeddingError, PoseRecord, ScoringConfig, StrategyKind, UserProfile,
};

const DIM: usize = 4;

/// The one text [`FixedEmbedder`] refuses to encode.
const UNEMBEDDABLE: &str = "torn ligament";

fn unit(v: [f32; DIM]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

fn e(i: usize) -> [f32; DIM] {
    let mut v = [0.0; DIM];
    v[i] = 1.0;
    v
}

/// Looks texts up in a fixed table and counts how often each one is encoded.
struct FixedEmbedder {
    table: HashMap<&'static str, [f32; DIM]>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FixedEmbedder {
    fn new() -> Self {
        let table = HashMap::from([
            ("relaxation", e(0)),
            ("strength", e(1)),
            ("back pain", e(2)),
            ("stress", e(3)),
            ("dizziness", [0.0, 0.3, 0.91f32.sqrt(), 0.0]),
            ("fatigue", [0.0, 0.2, 0.96f32.sqrt(), 0.0]),
        ]);
        Self {
            table,
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn calls(&self, text: &str) -> usize {
        self.calls.lock().unwrap().get(text).copied().unwrap_or(0)
    }
}

impl TextEmbedder for FixedEmbedder {
    fn name(&self) -> &str {
        "fixed"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        *self.calls.lock().unwrap().entry(text.to_string()).or_default() += 1;
        if text == UNEMBEDDABLE {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("cannot encode '{}'", text),
            });
        }
        Ok(self.table.get(text).copied().unwrap_or(e(3)).to_vec())
    }
}

fn pose(name: &str, contraindications: &str, vectors: [[f32; DIM]; 4]) -> PoseRecord {
    PoseRecord {
        name: name.to_string(),
        benefits: format!("{} benefits", name),
        contraindications: contraindications.to_string(),
        targeted_physical_problems: String::new(),
        targeted_mental_problems: String::new(),
        level: "Beginner".to_string(),
        description: Some(format!("How to do {}", name)),
        benefits_embedding: unit(vectors[0]),
        contraindications_embedding: unit(vectors[1]),
        physical_problems_embedding: unit(vectors[2]),
        mental_problems_embedding: unit(vectors[3]),
    }
}

fn small_store() -> Arc<PoseStore> {
    let mut childs = pose("Child's Pose", "Knee injury", [e(0), e(1), e(2), e(3)]);
    childs.benefits = "Calms the mind and relieves stress".to_string();
    let mut cobra = pose("Cobra", "Back pain, pregnancy", [e(1), e(0), e(2), e(3)]);
    cobra.benefits = "Strengthens the spine".to_string();
    let mut mountain = pose("Mountain", "", [e(2), [0.0; DIM], e(1), e(0)]);
    mountain.benefits = "Improves posture".to_string();

    Arc::new(PoseStore::from_records(vec![childs, cobra, mountain]).unwrap())
}

fn profile(goals: &[&str], physical: &[&str], mental: &[&str]) -> UserProfile {
    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    UserProfile {
        goals: owned(goals),
        physical_issues: owned(physical),
        mental_issues: owned(mental),
        ..Default::default()
    }
}

fn semantic(
    store: Arc<PoseStore>,
    embedder: Arc<FixedEmbedder>,
) -> Recommender<SemanticStrategy<Arc<FixedEmbedder>>> {
    Recommender::new(store, SemanticStrategy::new(embedder), &ScoringConfig::default()).unwrap()
}

fn names(recommendations: &[yogamatch_core::Recommendation]) -> Vec<&str> {
    recommendations.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn test_single_goal_scores_quarter() {
    let recommender = semantic(small_store(), Arc::new(FixedEmbedder::new()));

    let results = recommender
        .recommend(&profile(&["relaxation"], &[], &[]))
        .unwrap();

    assert_eq!(names(&results), vec!["Child's Pose"]);
    assert_eq!(results[0].score, 0.25);
    assert_eq!(results[0].contraindications, "Knee injury");
    assert_eq!(results[0].description, "How to do Child's Pose");
}

#[test]
fn test_literal_contraindication_excludes_pose() {
    let recommender = semantic(small_store(), Arc::new(FixedEmbedder::new()));

    let without_issue = recommender
        .recommend(&profile(&["strength"], &[], &[]))
        .unwrap();
    assert!(names(&without_issue).contains(&"Cobra"));

    let with_issue = recommender
        .recommend(&profile(&["strength"], &["Back Pain"], &[]))
        .unwrap();
    assert!(!names(&with_issue).contains(&"Cobra"));
}

#[test]
fn test_empty_profile_returns_nothing() {
    let recommender = semantic(small_store(), Arc::new(FixedEmbedder::new()));

    let results = recommender.recommend(&UserProfile::default()).unwrap();
    assert!(results.is_empty());

    let blanks = recommender
        .recommend(&profile(&[""], &["  "], &[]))
        .unwrap();
    assert!(blanks.is_empty());
}

#[test]
fn test_results_are_capped_positive_and_sorted() {
    // Listed worst-first so the ranking has to reorder them.
    let poses: Vec<PoseRecord> = (0..15)
        .rev()
        .map(|i| {
            pose(
                &format!("Pose {}", i),
                "",
                [[1.0, i as f32 * 0.2, 0.0, 0.0], e(1), e(2), e(3)],
            )
        })
        .collect();
    let store = Arc::new(PoseStore::from_records(poses).unwrap());
    let recommender = semantic(store, Arc::new(FixedEmbedder::new()));

    let results = recommender
        .recommend(&profile(&["relaxation"], &[], &[]))
        .unwrap();

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.score > 0.0));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(results[0].name, "Pose 0");
}

#[test]
fn test_ties_keep_corpus_order() {
    let store = Arc::new(
        PoseStore::from_records(vec![
            pose("Gamma", "", [[1.0, 1.0, 0.0, 0.0], e(1), e(2), e(3)]),
            pose("Alpha", "", [e(0), e(1), e(2), e(3)]),
            pose("Beta", "", [e(0), e(1), e(2), e(3)]),
        ])
        .unwrap(),
    );
    let recommender = semantic(store, Arc::new(FixedEmbedder::new()));

    let results = recommender
        .recommend(&profile(&["relaxation"], &[], &[]))
        .unwrap();
    assert_eq!(names(&results), vec!["Alpha", "Beta", "Gamma"]);
}

#[test]
fn test_recommend_is_deterministic() {
    let recommender = semantic(small_store(), Arc::new(FixedEmbedder::new()));
    let request = profile(&["relaxation"], &["fatigue"], &["stress"]);

    let first = recommender.recommend(&request).unwrap();
    let second = recommender.recommend(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_similarity_threshold_boundary() {
    let recommender = semantic(small_store(), Arc::new(FixedEmbedder::new()));

    // Similarity 0.3 to the Child's Pose contraindications: above 0.25, discarded.
    let discarded = recommender
        .recommend(&profile(&["relaxation"], &["dizziness"], &[]))
        .unwrap();
    assert!(!names(&discarded).contains(&"Child's Pose"));

    // Similarity 0.2: below the threshold, kept.
    let kept = recommender
        .recommend(&profile(&["relaxation"], &["fatigue"], &[]))
        .unwrap();
    assert!(names(&kept).contains(&"Child's Pose"));
}

#[test]
fn test_threshold_override_from_config() {
    let config = ScoringConfig {
        contraindication_threshold: Some(0.1),
        ..Default::default()
    };
    let recommender = Recommender::new(
        small_store(),
        SemanticStrategy::new(Arc::new(FixedEmbedder::new())),
        &config,
    )
    .unwrap();
    assert_eq!(recommender.filter().threshold(), 0.1);

    let results = recommender
        .recommend(&profile(&["relaxation"], &["fatigue"], &[]))
        .unwrap();
    assert!(!names(&results).contains(&"Child's Pose"));
}

#[test]
fn test_no_issues_never_discard() {
    let config = ScoringConfig {
        contraindication_threshold: Some(-1.0),
        ..Default::default()
    };
    let recommender = Recommender::new(
        small_store(),
        SemanticStrategy::new(Arc::new(FixedEmbedder::new())),
        &config,
    )
    .unwrap();

    let results = recommender
        .recommend(&profile(&["relaxation"], &[], &[]))
        .unwrap();
    assert_eq!(names(&results), vec!["Child's Pose"]);
}

#[test]
fn test_issue_embeddings_are_memoized_per_request() {
    let embedder = Arc::new(FixedEmbedder::new());
    let recommender = semantic(small_store(), Arc::clone(&embedder));
    let request = profile(&["relaxation"], &["fatigue", "back pain"], &[]);

    recommender.recommend(&request).unwrap();
    // Checked against three poses but embedded once.
    assert_eq!(embedder.calls("fatigue"), 1);
    assert_eq!(embedder.calls("back pain"), 1);

    // A new request starts with an empty memo.
    recommender.recommend(&request).unwrap();
    assert_eq!(embedder.calls("fatigue"), 2);
}

#[test]
fn test_embedding_failure_spoils_only_its_request() {
    let store = small_store();
    let embedder = Arc::new(FixedEmbedder::new());
    let recommender = semantic(Arc::clone(&store), Arc::clone(&embedder));

    // Fails while embedding the profile fields.
    let broken_goal = profile(&[UNEMBEDDABLE], &[], &[]);
    assert!(matches!(
        recommender.recommend(&broken_goal),
        Err(CoreError::Embedding(EmbeddingError::InferenceFailed { .. }))
    ));
    assert!(recommender.recommend_or_empty(&broken_goal).is_empty());

    // Fails inside the contraindication filter, after "fatigue" was memoized.
    let broken_issue = profile(&["relaxation"], &["fatigue", UNEMBEDDABLE], &[]);
    assert!(matches!(
        recommender.recommend(&broken_issue),
        Err(CoreError::Embedding(EmbeddingError::InferenceFailed { .. }))
    ));
    assert!(recommender.recommend_or_empty(&broken_issue).is_empty());
    assert!(embedder.calls(UNEMBEDDABLE) >= 2);

    // The same recommender and store keep serving healthy requests.
    let healthy = profile(&["relaxation"], &[], &[]);
    let results = recommender.recommend(&healthy).unwrap();
    assert_eq!(names(&results), vec!["Child's Pose"]);
    assert_eq!(results[0].score, 0.25);
    assert_eq!(recommender.recommend_or_empty(&healthy), results);

    let fresh = semantic(store, Arc::new(FixedEmbedder::new()));
    assert_eq!(fresh.recommend(&healthy).unwrap(), results);
}

#[test]
fn test_concurrent_requests_share_the_store() {
    let recommender = Arc::new(semantic(small_store(), Arc::new(FixedEmbedder::new())));
    let request = profile(&["strength"], &["fatigue"], &[]);
    let expected = recommender.recommend(&request).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| recommender.recommend(&request).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_lexical_strategy() {
    let config = ScoringConfig {
        strategy: StrategyKind::Lexical,
        ..Default::default()
    };
    let recommender = Recommender::new(small_store(), LexicalStrategy, &config).unwrap();
    assert_eq!(recommender.filter().threshold(), 0.3);

    let results = recommender
        .recommend(&profile(&["relieves stress"], &[], &[]))
        .unwrap();
    assert_eq!(names(&results), vec!["Child's Pose"]);
    assert_eq!(results[0].score, 0.083);

    let filtered = recommender
        .recommend(&profile(&["relieves stress"], &["knee injury"], &[]))
        .unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn test_build_engine_selects_strategy() {
    let lexical = ScoringConfig {
        strategy: StrategyKind::Lexical,
        ..Default::default()
    };
    let engine = build_engine(small_store(), None, &lexical).unwrap();
    assert_eq!(engine.strategy_name(), "lexical");

    let embedder: Arc<dyn TextEmbedder> = Arc::new(FixedEmbedder::new());
    let engine = build_engine(small_store(), Some(embedder), &ScoringConfig::default()).unwrap();
    assert_eq!(engine.strategy_name(), "semantic");
    let results = engine.recommend(&profile(&["relaxation"], &[], &[])).unwrap();
    assert_eq!(names(&results), vec!["Child's Pose"]);

    assert!(matches!(
        build_engine(small_store(), None, &ScoringConfig::default()),
        Err(CoreError::Embedding(EmbeddingError::ModelNotFound { .. }))
    ));
}

#[test]
fn test_embedder_dimension_must_match_store() {
    let result = Recommender::new(
        small_store(),
        SemanticStrategy::new(HashingEmbedder::new(8)),
        &ScoringConfig::default(),
    );
    assert!(matches!(
        result,
        Err(EmbeddingError::DimensionMismatch {
            expected: 4,
            actual: 8
        })
    ));

    assert!(ContextRetriever::new(small_store(), HashingEmbedder::new(8), 0.15).is_err());
}

#[test]
fn test_retrieve_context_formats_hits() {
    let retriever = ContextRetriever::new(small_store(), FixedEmbedder::new(), 0.15).unwrap();

    let context = retriever.retrieve_context("relaxation", 5).unwrap();
    assert_eq!(
        context,
        "Pose: Child's Pose\nBenefits: Calms the mind and relieves stress\nContraindications: Knee injury"
    );
}

#[test]
fn test_retrieve_context_joins_blocks_by_similarity() {
    let store = Arc::new(
        PoseStore::from_records(vec![
            pose("Low", "", [[1.0, 0.0, 1.0, 0.0], e(1), e(2), e(3)]),
            pose("High", "", [e(0), e(1), e(2), e(3)]),
            pose("Off", "", [e(2), e(1), e(2), e(3)]),
        ])
        .unwrap(),
    );
    let retriever = ContextRetriever::new(store, FixedEmbedder::new(), 0.15).unwrap();

    let hits = retriever.retrieve("relaxation", 5).unwrap();
    let hit_names: Vec<&str> = hits.iter().map(|h| h.pose.name.as_str()).collect();
    assert_eq!(hit_names, vec!["High", "Low"]);

    let context = retriever.retrieve_context("relaxation", 1).unwrap();
    assert!(context.starts_with("Pose: High\n"));
    assert!(!context.contains("\n\n"));

    let both = retriever.retrieve_context("relaxation", 5).unwrap();
    assert_eq!(both.split("\n\n").count(), 2);
}

#[test]
fn test_retrieve_context_empty_without_hits() {
    let retriever = ContextRetriever::new(small_store(), FixedEmbedder::new(), 0.15).unwrap();

    // Unknown text maps to an axis no benefits vector uses.
    assert_eq!(retriever.retrieve_context("something unrelated", 5).unwrap(), "");
    assert_eq!(retriever.retrieve_context("relaxation", 0).unwrap(), "");
}
