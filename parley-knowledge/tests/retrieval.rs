//! End-to-end behavior of the knowledge engine against a scripted embedder.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parley_knowledge::{
    Embedder, KnowledgeEngine, KnowledgeError, KnowledgeItem, KnowledgeResult, KnowledgeSettings,
    Similarity, VectorIndex,
};

/// Returns fixed vectors per text and counts every call.
#[derive(Default)]
struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    fn with(mut self, text: &str, vector: &[f64]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Embedder for ScriptedEmbedder {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| KnowledgeError::Embedding(format!("401 invalid api key for '{text}'")))
    }
}

fn engine_with(embedder: Arc<ScriptedEmbedder>) -> KnowledgeEngine {
    KnowledgeEngine::new(KnowledgeSettings::default(), embedder)
}

fn abc_embedder() -> ScriptedEmbedder {
    ScriptedEmbedder::default()
        .with("q", &[1.0, 0.0])
        .with("A", &[1.0, 0.0])
        .with("B", &[0.0, 1.0])
        .with("C", &[0.7, 0.7])
}

#[tokio::test]
async fn ranks_by_raw_dot_product() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder.clone());
    for text in ["A", "B", "C"] {
        engine.add(text).await.unwrap();
    }

    let top_two = engine.retrieve("q", 2).await.unwrap();
    assert_eq!(top_two, vec!["A", "C"]);

    let scored = engine.retrieve_scored("q", 3).await.unwrap();
    let scores: Vec<f64> = scored.iter().map(|hit| hit.score).collect();
    assert!((scores[0] - 1.0).abs() < 1e-12);
    assert!((scores[1] - 0.7).abs() < 1e-12);
    assert_eq!(scores[2], 0.0);
}

#[tokio::test]
async fn retrieving_everything_returns_each_text_once() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder);
    for text in ["B", "C", "A"] {
        engine.add(text).await.unwrap();
    }

    let all = engine.retrieve("q", 3).await.unwrap();
    assert_eq!(all, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn empty_store_skips_the_provider() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder.clone());

    let hits = engine.retrieve("anything at all", 3).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn top_k_larger_than_store_is_not_padded() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder);
    engine.add("A").await.unwrap();
    engine.add("B").await.unwrap();

    let hits = engine.retrieve("q", 10).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn identical_embeddings_keep_insertion_order() {
    let embedder = Arc::new(
        ScriptedEmbedder::default()
            .with("q", &[1.0, 1.0])
            .with("first", &[0.3, 0.3])
            .with("second", &[0.3, 0.3])
            .with("low", &[0.1, 0.0]),
    );
    let engine = engine_with(embedder);
    for text in ["low", "first", "second"] {
        engine.add(text).await.unwrap();
    }

    let hits = engine.retrieve("q", 3).await.unwrap();
    assert_eq!(hits, vec!["first", "second", "low"]);
}

#[tokio::test]
async fn duplicate_texts_are_stored_twice() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder);
    engine.add("A").await.unwrap();
    engine.add("A").await.unwrap();

    assert_eq!(engine.len(), 2);
    assert_eq!(engine.retrieve("q", 3).await.unwrap(), vec!["A", "A"]);
}

#[tokio::test]
async fn failed_add_leaves_store_unchanged() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder);
    engine.add("A").await.unwrap();

    let err = engine.add("not scripted").await.unwrap_err();
    assert!(matches!(err, KnowledgeError::Embedding(_)));
    assert_eq!(engine.texts(), vec!["A"]);
}

#[tokio::test]
async fn failed_query_embedding_propagates() {
    let embedder = Arc::new(abc_embedder());
    let engine = engine_with(embedder);
    engine.add("A").await.unwrap();

    let err = engine.retrieve("not scripted", 3).await.unwrap_err();
    assert!(matches!(err, KnowledgeError::Embedding(_)));
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
    let embedder = Arc::new(
        ScriptedEmbedder::default()
            .with("two", &[1.0, 0.0])
            .with("three", &[1.0, 0.0, 0.0]),
    );
    let engine = engine_with(embedder);
    engine.add("two").await.unwrap();

    let err = engine.add("three").await.unwrap_err();
    assert!(matches!(
        err,
        KnowledgeError::EmbeddingDimMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert_eq!(engine.len(), 1);

    let err = engine.retrieve("three", 1).await.unwrap_err();
    assert!(matches!(err, KnowledgeError::EmbeddingDimMismatch { .. }));
}

#[tokio::test]
async fn cosine_setting_normalizes_scores() {
    let embedder = Arc::new(
        ScriptedEmbedder::default()
            .with("q", &[1.0, 0.0])
            .with("unit", &[1.0, 0.0])
            .with("long", &[3.0, 3.0]),
    );
    let settings = KnowledgeSettings {
        similarity: Similarity::Cosine,
        ..KnowledgeSettings::default()
    };
    let engine = KnowledgeEngine::new(settings, embedder);
    engine.add("long").await.unwrap();
    engine.add("unit").await.unwrap();

    assert_eq!(engine.retrieve("q", 1).await.unwrap(), vec!["unit"]);
}

#[tokio::test]
async fn capacity_evicts_oldest_items() {
    let embedder = Arc::new(abc_embedder());
    let settings = KnowledgeSettings {
        max_items: Some(2),
        ..KnowledgeSettings::default()
    };
    let engine = KnowledgeEngine::new(settings, embedder);
    for text in ["A", "B", "C"] {
        engine.add(text).await.unwrap();
    }

    assert_eq!(engine.texts(), vec!["B", "C"]);
}

/// Ranks the newest items first, ignoring the query.
struct NewestFirstIndex;

impl VectorIndex for NewestFirstIndex {
    fn name(&self) -> &'static str {
        "newest_first"
    }

    fn rank(&self, _query: &[f64], items: &[KnowledgeItem], top_k: usize) -> Vec<(usize, f64)> {
        (0..items.len()).rev().take(top_k).map(|idx| (idx, 0.0)).collect()
    }
}

#[tokio::test]
async fn custom_index_decides_the_ranking() {
    let embedder = Arc::new(abc_embedder());
    let engine = KnowledgeEngine::with_index(
        KnowledgeSettings::default(),
        embedder,
        Box::new(NewestFirstIndex),
    );
    for text in ["A", "B", "C"] {
        engine.add(text).await.unwrap();
    }

    assert_eq!(engine.retrieve("q", 2).await.unwrap(), vec!["C", "B"]);
}

#[tokio::test]
async fn concurrent_adds_all_land() {
    let mut embedder = ScriptedEmbedder::default();
    let texts: Vec<String> = (0..32).map(|i| format!("doc-{i}")).collect();
    for (i, text) in texts.iter().enumerate() {
        embedder = embedder.with(text, &[i as f64, 1.0]);
    }
    let engine = Arc::new(engine_with(Arc::new(embedder)));

    let handles: Vec<_> = texts
        .iter()
        .cloned()
        .map(|text| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.add(&text).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut stored = engine.texts();
    stored.sort();
    let mut expected = texts.clone();
    expected.sort();
    assert_eq!(stored, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_adds_and_retrievals_stay_consistent() {
    let mut embedder = ScriptedEmbedder::default().with("q", &[1.0, 0.0]);
    let texts: Vec<String> = (0..24).map(|i| format!("note number {i}")).collect();
    for (i, text) in texts.iter().enumerate() {
        embedder = embedder.with(text, &[i as f64, 1.0]);
    }
    let engine = Arc::new(engine_with(Arc::new(embedder)));
    let known: HashSet<String> = texts.iter().cloned().collect();

    let mut adds = Vec::new();
    let mut retrievals = Vec::new();
    for text in texts.iter().cloned() {
        let writer = Arc::clone(&engine);
        adds.push(tokio::spawn(async move { writer.add(&text).await }));

        let reader = Arc::clone(&engine);
        retrievals.push(tokio::spawn(async move { reader.retrieve("q", 5).await }));
    }

    for handle in adds {
        handle.await.unwrap().unwrap();
    }
    for handle in retrievals {
        let hits = handle.await.unwrap().unwrap();
        assert!(hits.len() <= 5);
        let distinct: HashSet<&String> = hits.iter().collect();
        assert_eq!(distinct.len(), hits.len(), "duplicate hit in {hits:?}");
        for hit in &hits {
            assert!(known.contains(hit), "unexpected text {hit:?}");
        }
    }

    let stored = engine.texts();
    assert_eq!(stored.len(), texts.len());
    let stored_set: HashSet<String> = stored.into_iter().collect();
    assert_eq!(stored_set, known);
}
