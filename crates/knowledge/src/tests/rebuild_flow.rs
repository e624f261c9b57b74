//! Rebuild, publish and concurrent-read behaviour across the whole pipeline.

use crate::builder::IndexBuilder;
use crate::embeddings::{EmbeddingProvider, MockProvider};
use crate::generation::IndexHandle;
use crate::rebuild::{RebuildScheduler, RebuildWorker};
use crate::storage::GenerationStore;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tableside_core::config::{CorpusSettings, IndexSettings};
use tableside_core::{AppError, AppResult};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Mock embeddings that count calls and can be held back or made to fail.
#[derive(Debug)]
struct ControlledProvider {
    inner: MockProvider,
    calls: AtomicUsize,
    gate: Semaphore,
    fail: AtomicBool,
}

impl ControlledProvider {
    fn open() -> Arc<Self> {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    fn with_permits(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MockProvider::new(64),
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(permits),
            fail: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for ControlledProvider {
    fn provider_name(&self) -> &str {
        "controlled"
    }

    fn model_name(&self) -> &str {
        "controlled"
    }

    fn dimensions(&self) -> usize {
        64
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.gate
            .acquire_many(texts.len() as u32)
            .await
            .map_err(|e| AppError::Embedding(e.to_string()))?
            .forget();

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("embedding service down".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

fn worker(dir: &Path, provider: Arc<ControlledProvider>, store: Option<GenerationStore>) -> RebuildWorker {
    let builder = IndexBuilder::new(
        dir,
        &CorpusSettings::default(),
        &IndexSettings::default(),
        provider,
    );
    RebuildWorker::new(Arc::new(builder), store, IndexHandle::default())
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn ids(generation: &crate::IndexGeneration) -> Vec<String> {
    generation.chunks().iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn test_rebuild_of_unchanged_corpus_is_identical() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("menu.csv"),
        "Item Name,Quantity\nChicken Curry,4\nGarlic Naan,9\n".repeat(40),
    )
    .unwrap();

    let worker = worker(temp.path(), ControlledProvider::open(), None);
    let first = worker.rebuild().await.unwrap();
    let second = worker.rebuild().await.unwrap();

    assert!(first.chunk_count() > 1);
    assert_eq!(second.id, first.id + 1);
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.chunks(), second.chunks());
}

#[tokio::test]
async fn test_indexed_fact_is_retrieved() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Cauliflower Bhajee, Chicken Curry").unwrap();
    std::fs::write(temp.path().join("hours.jsonl"), r#"{"content": "Open from noon until late"}"#)
        .unwrap();

    let worker = worker(temp.path(), ControlledProvider::open(), None);
    let generation = worker.rebuild().await.unwrap();

    let query = MockProvider::new(64).embed("cauliflower bhajee").await.unwrap();
    let results = generation.search(&query, 2).unwrap();

    assert!(results[0].chunk.text.contains("Cauliflower Bhajee"));
    assert!(results[0].score >= 0.15);
}

#[tokio::test]
async fn test_unchanged_corpus_skips_rebuild() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Papadum").unwrap();

    let provider = ControlledProvider::open();
    let worker = worker(temp.path(), provider.clone(), None);

    assert!(worker.rebuild_if_changed().await.unwrap().is_some());
    assert!(worker.rebuild_if_changed().await.unwrap().is_none());
    assert_eq!(provider.calls(), 1);
    assert_eq!(worker.handle().current().id, 1);
}

#[tokio::test]
async fn test_persisted_generation_is_reused() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(data.join("menu.csv"), "Lamb Biryani").unwrap();
    let store = GenerationStore::new(temp.path().join("storage"));

    let provider = ControlledProvider::open();
    let first = worker(&data, provider.clone(), Some(store.clone()));
    let built = first.load_or_build().await.unwrap();
    assert_eq!(provider.calls(), 1);

    let second = worker(&data, provider.clone(), Some(store.clone()));
    let reused = second.load_or_build().await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(reused.chunks(), built.chunks());

    std::fs::write(data.join("specials.csv"), "Mango Lassi").unwrap();
    let third = worker(&data, provider.clone(), Some(store));
    let rebuilt = third.load_or_build().await.unwrap();

    assert_eq!(provider.calls(), 3);
    assert_eq!(rebuilt.chunk_count(), 2);
}

#[tokio::test]
async fn test_failed_build_keeps_previous_generation() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Chicken Curry").unwrap();

    let provider = ControlledProvider::open();
    let worker = worker(temp.path(), provider.clone(), None);
    worker.rebuild().await.unwrap();

    provider.fail.store(true, Ordering::SeqCst);
    std::fs::write(temp.path().join("specials.csv"), "Lamb Biryani").unwrap();

    let result = worker.rebuild_if_changed().await;
    assert!(matches!(result, Err(AppError::Build(_))));

    let current = worker.handle().current();
    assert_eq!(current.id, 1);
    assert_eq!(current.chunk_count(), 1);
}

#[tokio::test]
async fn test_corpus_that_extracts_nothing_keeps_previous_generation() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Chicken Curry").unwrap();

    let worker = worker(temp.path(), ControlledProvider::open(), None);
    worker.rebuild().await.unwrap();

    std::fs::remove_file(temp.path().join("menu.csv")).unwrap();
    std::fs::write(temp.path().join("menu.xlsx"), [0x50, 0x4b, 0xde, 0xad, 0xbe, 0xef]).unwrap();

    let result = worker.rebuild_if_changed().await;
    assert!(matches!(result, Err(AppError::Build(_))));

    let current = worker.handle().current();
    assert_eq!(current.id, 1);
    assert_eq!(current.chunk_count(), 1);
    assert!(current.chunks()[0].text.contains("Chicken Curry"));
}

#[tokio::test]
async fn test_signals_during_build_coalesce_into_one_follow_up() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Chicken Curry").unwrap();

    let provider = ControlledProvider::with_permits(0);
    let worker = worker(temp.path(), provider.clone(), None);
    let handle = worker.handle().clone();

    let (scheduler, signals) = RebuildScheduler::new();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(worker.run(signals, cancel.clone()));

    assert!(scheduler.request());
    wait_until(|| provider.calls() == 1).await;

    // First build is blocked inside embedding; change the corpus and pile up signals
    std::fs::write(temp.path().join("specials.csv"), "Lamb Biryani").unwrap();
    assert!(scheduler.request());
    for _ in 0..5 {
        assert!(!scheduler.request());
    }

    provider.gate.add_permits(100);
    wait_until(|| handle.current().id == 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(handle.current().id, 2);
    assert_eq!(handle.current().chunk_count(), 2);
    assert_eq!(provider.calls(), 3);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_queries_see_consistent_generations() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("menu.csv"), "Chicken Curry").unwrap();

    let provider = ControlledProvider::with_permits(1);
    let worker = worker(temp.path(), provider.clone(), None);
    worker.rebuild().await.unwrap();
    let handle = worker.handle().clone();

    std::fs::write(temp.path().join("sides.csv"), "Garlic Naan, Papadum").unwrap();
    std::fs::write(temp.path().join("rice.csv"), "Lamb Biryani, Pilau Rice").unwrap();

    let rebuild = tokio::spawn({
        let worker = worker.clone();
        async move { worker.rebuild().await }
    });
    wait_until(|| provider.calls() >= 2).await;

    let query = Arc::new(MockProvider::new(64).embed("curry naan biryani").await.unwrap());
    let mut readers = Vec::new();
    for _ in 0..16 {
        let handle = handle.clone();
        let query = query.clone();
        readers.push(tokio::spawn(async move {
            let mut seen = HashSet::new();
            for _ in 0..25 {
                let generation = handle.current();
                let expected = match generation.id {
                    1 => 1,
                    2 => 3,
                    other => panic!("unexpected generation {}", other),
                };
                assert_eq!(generation.chunk_count(), expected);

                let known: HashSet<_> = generation.chunks().iter().map(|c| &c.id).collect();
                let results = generation.search(&query, 10).unwrap();
                assert_eq!(results.len(), expected);
                assert!(results.iter().all(|r| known.contains(&r.chunk.id)));

                seen.insert(generation.id);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            seen
        }));
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    provider.gate.add_permits(10);

    let published = rebuild.await.unwrap().unwrap();
    for reader in readers {
        let seen = reader.await.unwrap();
        assert!(!seen.is_empty());
    }

    assert_eq!(published.id, 2);
    assert_eq!(handle.current().chunk_count(), 3);
}
