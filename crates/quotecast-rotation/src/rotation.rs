//! Rotation loop: select, dispatch, persist, pace.
//!
//! Everything inside the loop is best-effort: a missing eligible quote, a
//! failed render or publish and a failed save are logged and the loop moves
//! on. Only an empty corpus (or, when configured, a run of selection misses)
//! ends it.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use quotecast_core::ChannelId;
use quotecast_store::{remove_quote, CorpusStore, Quote};

use crate::dispatch::{Publisher, Renderer};
use crate::selector::Selector;
use crate::types::*;

/// Owns the live corpus and the forbidden-tag set for one process run.
pub struct RotationLoop {
    corpus: Vec<Quote>,
    forbidden: HashSet<String>,
    store: CorpusStore,
    selector: Selector,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
    channel: ChannelId,
    options: RotationOptions,
    phase: RotationPhase,
}

impl RotationLoop {
    /// Create a loop over `corpus`. The forbidden-tag set starts empty.
    pub fn new(
        corpus: Vec<Quote>,
        store: CorpusStore,
        renderer: Arc<dyn Renderer>,
        publisher: Arc<dyn Publisher>,
        channel: ChannelId,
        options: RotationOptions,
    ) -> Self {
        Self {
            corpus,
            forbidden: HashSet::new(),
            store,
            selector: Selector::from_entropy(),
            renderer,
            publisher,
            channel,
            options,
            phase: RotationPhase::Idle,
        }
    }

    /// Replace the random source (for testing).
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn corpus(&self) -> &[Quote] {
        &self.corpus
    }

    pub fn forbidden_tags(&self) -> &HashSet<String> {
        &self.forbidden
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    fn enter(&mut self, phase: RotationPhase) {
        debug!("Rotation phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Run one iteration without pacing.
    pub async fn step(&mut self) -> StepOutcome {
        if self.corpus.is_empty() {
            self.enter(RotationPhase::Finished);
            return StepOutcome::Exhausted;
        }

        self.enter(RotationPhase::Selecting);
        let quote = match self.selector.select_unique(&self.corpus, &self.forbidden) {
            Ok(q) => q,
            Err(e) => {
                warn!(
                    "Failed to get unique quote: {} ({} remaining, {} tags forbidden)",
                    e,
                    self.corpus.len(),
                    self.forbidden.len()
                );
                return StepOutcome::NoUniqueQuote;
            }
        };

        self.enter(RotationPhase::Dispatching);
        let dispatch = self.dispatch(&quote).await;

        self.enter(RotationPhase::Persisting);
        let saved = self.persist(&quote);

        if self.corpus.is_empty() {
            self.enter(RotationPhase::Finished);
        }

        StepOutcome::Consumed {
            quote,
            dispatch,
            saved,
        }
    }

    /// Render then publish. Publishing is skipped when rendering fails.
    async fn dispatch(&self, quote: &Quote) -> DispatchOutcome {
        let artifact = match self.renderer.render(quote).await {
            Ok(path) => path,
            Err(e) => {
                error!("Failed to generate image for quote by {}: {}", quote.author, e);
                return DispatchOutcome::RenderFailed(e.to_string());
            }
        };
        info!("Generated image for quote: {}", artifact.display());

        match self
            .publisher
            .publish(&self.channel, &artifact, &quote.tags)
            .await
        {
            Ok(()) => {
                info!("Published quote by {} to {}", quote.author, self.channel);
                DispatchOutcome::Published { artifact }
            }
            Err(e) => {
                error!("Failed to send photo for quote by {}: {}", quote.author, e);
                DispatchOutcome::PublishFailed {
                    artifact,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Forbid the quote's tags, drop it from the corpus, and rewrite the store.
    fn persist(&mut self, quote: &Quote) -> bool {
        self.forbidden.extend(quote.tags.iter().cloned());
        remove_quote(&mut self.corpus, quote);

        match self.store.save(&self.corpus) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write quotes to file: {}", e);
                false
            }
        }
    }

    /// Drive the loop until the corpus is empty or selection gives up.
    pub async fn run(mut self) -> RotationReport {
        info!(
            "Rotation started: {} quotes, interval={:?}",
            self.corpus.len(),
            self.options.interval
        );

        let mut report = RotationReport::default();
        let mut consecutive_misses: u32 = 0;

        loop {
            match self.step().await {
                StepOutcome::Exhausted => {
                    report.end = Some(RotationEnd::Exhausted);
                    break;
                }
                StepOutcome::NoUniqueQuote => {
                    report.selection_misses += 1;
                    consecutive_misses += 1;
                    let limit = self.options.max_selection_misses;
                    if limit > 0 && consecutive_misses >= limit {
                        warn!(
                            "Giving up after {} consecutive selection misses; {} quotes left",
                            consecutive_misses,
                            self.corpus.len()
                        );
                        self.enter(RotationPhase::Finished);
                        report.end = Some(RotationEnd::Stalled {
                            remaining: self.corpus.len(),
                        });
                        break;
                    }
                    // Immediate retry, no pacing.
                    tokio::task::yield_now().await;
                    continue;
                }
                StepOutcome::Consumed {
                    dispatch, saved, ..
                } => {
                    consecutive_misses = 0;
                    report.consumed += 1;
                    if dispatch.is_published() {
                        report.published += 1;
                    } else {
                        report.dispatch_failures += 1;
                    }
                    if !saved {
                        report.save_failures += 1;
                    }
                }
            }

            if self.corpus.is_empty() {
                report.end = Some(RotationEnd::Exhausted);
                break;
            }

            self.enter(RotationPhase::Pacing);
            tokio::time::sleep(self.options.interval).await;
        }

        debug!("Rotation finished: {:?}", report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use quotecast_core::{Error, Result};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct FakeRenderer {
        fail_for: Option<String>,
        rendered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn render(&self, quote: &Quote) -> Result<PathBuf> {
            if self.fail_for.as_deref() == Some(quote.author.as_str()) {
                return Err(Error::Render("photo service down".into()));
            }
            self.rendered.lock().unwrap().push(quote.author.clone());
            Ok(PathBuf::from(format!("output_image_{}.png", quote.author)))
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        fail: bool,
        sent: Mutex<Vec<(String, PathBuf, Vec<String>)>>,
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish(&self, channel: &ChannelId, artifact: &Path, tags: &[String]) -> Result<()> {
            if self.fail {
                return Err(Error::Publish("chat not found".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), artifact.to_path_buf(), tags.to_vec()));
            Ok(())
        }
    }

    fn q(author: &str, text: &str, tags: &[&str]) -> Quote {
        Quote::new(author, text, tags.iter().map(|t| t.to_string()).collect())
    }

    fn options() -> RotationOptions {
        RotationOptions {
            interval: Duration::ZERO,
            max_selection_misses: 3,
        }
    }

    fn build(
        corpus: Vec<Quote>,
        store: CorpusStore,
        renderer: Arc<FakeRenderer>,
        publisher: Arc<FakePublisher>,
    ) -> RotationLoop {
        RotationLoop::new(
            corpus,
            store,
            renderer,
            publisher,
            ChannelId::Id(-100),
            options(),
        )
        .with_selector(Selector::seeded(StdRng::seed_from_u64(5)))
    }

    fn test_store(corpus: &[Quote]) -> (CorpusStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("quotes.json"));
        store.save(corpus).unwrap();
        (store, dir)
    }

    /// A seed whose first pick over `corpus` (nothing forbidden) is `author`.
    fn seed_opening_with(corpus: &[Quote], author: &str) -> u64 {
        (0..256)
            .find(|&seed| {
                Selector::seeded(StdRng::seed_from_u64(seed))
                    .select_unique(corpus, &HashSet::new())
                    .map(|quote| quote.author == author)
                    .unwrap_or(false)
            })
            .expect("no seed in range opens with the requested quote")
    }

    #[tokio::test]
    async fn test_scenario_second_pick_forced() {
        let corpus = vec![q("A", "x", &["t1"]), q("B", "y", &["t2"]), q("C", "z", &["t1"])];
        let (store, _dir) = test_store(&corpus);
        let seed = seed_opening_with(&corpus, "A");
        let mut rotation = build(
            corpus,
            store.clone(),
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        )
        .with_selector(Selector::seeded(StdRng::seed_from_u64(seed)));

        match rotation.step().await {
            StepOutcome::Consumed { quote, .. } => assert_eq!(quote.author, "A"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(rotation.forbidden_tags(), &HashSet::from(["t1".to_string()]));
        assert_eq!(rotation.corpus(), &[q("B", "y", &["t2"]), q("C", "z", &["t1"])]);
        assert_eq!(store.load().unwrap(), rotation.corpus());

        // C shares t1 with A, so only B is eligible
        match rotation.step().await {
            StepOutcome::Consumed { quote, .. } => assert_eq!(quote, q("B", "y", &["t2"])),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(rotation.corpus(), &[q("C", "z", &["t1"])]);
        assert!(matches!(rotation.step().await, StepOutcome::NoUniqueQuote));
    }

    #[tokio::test]
    async fn test_shrink_invariant() {
        let corpus = vec![
            q("A", "x", &["t1"]),
            q("B", "y", &["t2"]),
            q("C", "z", &["t3"]),
            q("D", "w", &[]),
        ];
        let (store, _dir) = test_store(&corpus);
        let mut rotation = build(
            corpus.clone(),
            store.clone(),
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        );

        let mut before = store.load().unwrap();
        while let StepOutcome::Consumed { quote, saved, .. } = rotation.step().await {
            assert!(saved);
            let after = store.load().unwrap();
            assert_eq!(after.len(), before.len() - 1);
            assert!(!after.contains(&quote));

            let mut expected = before.clone();
            remove_quote(&mut expected, &quote);
            for (a, e) in after.iter().zip(expected.iter()) {
                assert_eq!(a, e);
                assert_eq!(a.tags, e.tags);
            }
            before = after;
        }
        assert!(store.load().unwrap().is_empty());
        assert_eq!(rotation.phase(), RotationPhase::Finished);
    }

    #[tokio::test]
    async fn test_forbidden_set_monotonic() {
        let corpus = vec![
            q("A", "a", &["t1"]),
            q("B", "b", &["t2", "t3"]),
            q("C", "c", &[]),
            q("D", "d", &["t4"]),
        ];
        let (store, _dir) = test_store(&corpus);
        let mut rotation = build(
            corpus,
            store,
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        );

        let mut previous: HashSet<String> = HashSet::new();
        loop {
            match rotation.step().await {
                StepOutcome::Consumed { quote, .. } => {
                    let current = rotation.forbidden_tags().clone();
                    assert!(previous.is_subset(&current));
                    assert!(quote.tags.iter().all(|t| current.contains(t)));
                    previous = current;
                }
                StepOutcome::Exhausted => break,
                StepOutcome::NoUniqueQuote => panic!("all tags are distinct"),
            }
        }
        assert_eq!(previous.len(), 4);
    }

    #[tokio::test]
    async fn test_dispatch_failures_still_consume() {
        let corpus = vec![q("A", "x", &["t1"]), q("B", "y", &["t2"])];
        let (store, _dir) = test_store(&corpus);
        let renderer = Arc::new(FakeRenderer {
            fail_for: Some("A".into()),
            ..Default::default()
        });
        let publisher = Arc::new(FakePublisher {
            fail: true,
            ..Default::default()
        });

        let report = build(corpus, store.clone(), renderer.clone(), publisher).run().await;
        assert_eq!(report.consumed, 2);
        assert_eq!(report.published, 0);
        assert_eq!(report.dispatch_failures, 2);
        assert_eq!(report.end, Some(RotationEnd::Exhausted));
        assert_eq!(*renderer.rendered.lock().unwrap(), vec!["B".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_receives_tags_and_channel() {
        let corpus = vec![q("Seneca", "Luck is what happens", &["luck", "preparation"])];
        let (store, _dir) = test_store(&corpus);
        let publisher = Arc::new(FakePublisher::default());

        let report = build(corpus, store, Arc::new(FakeRenderer::default()), publisher.clone())
            .run()
            .await;
        assert_eq!(report.published, 1);

        let sent = publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "-100");
        assert_eq!(sent[0].1, PathBuf::from("output_image_Seneca.png"));
        assert_eq!(sent[0].2, vec!["luck".to_string(), "preparation".to_string()]);
    }

    #[tokio::test]
    async fn test_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("missing").join("quotes.json"));
        let corpus = vec![q("A", "x", &["t1"]), q("B", "y", &["t2"])];

        let report = build(
            corpus,
            store,
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        )
        .run()
        .await;
        assert_eq!(report.consumed, 2);
        assert_eq!(report.save_failures, 2);
        assert_eq!(report.end, Some(RotationEnd::Exhausted));
    }

    #[tokio::test]
    async fn test_exhaustion_leaves_corpus_unchanged() {
        let corpus = vec![q("A", "x", &["t1"]), q("B", "y", &["t1", "t2"]), q("C", "z", &["t2"])];
        let (store, _dir) = test_store(&corpus);
        let mut rotation = build(
            corpus,
            store.clone(),
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        );

        // Consume until a miss happens; every quote shares t1 or t2
        let mut consumed = 0;
        loop {
            match rotation.step().await {
                StepOutcome::Consumed { .. } => consumed += 1,
                StepOutcome::NoUniqueQuote => break,
                StepOutcome::Exhausted => panic!("corpus should not empty out"),
            }
        }
        assert!(consumed >= 1);
        let on_disk = store.load().unwrap();
        let in_memory = rotation.corpus().to_vec();

        assert!(matches!(rotation.step().await, StepOutcome::NoUniqueQuote));
        assert_eq!(rotation.corpus(), in_memory.as_slice());
        assert_eq!(store.load().unwrap(), on_disk);
    }

    #[tokio::test]
    async fn test_run_stalls_after_miss_limit() {
        let corpus = vec![q("A", "x", &["t1"]), q("C", "z", &["t1"])];
        let (store, _dir) = test_store(&corpus);

        let report = build(
            corpus,
            store.clone(),
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        )
        .run()
        .await;
        assert_eq!(report.consumed, 1);
        assert_eq!(report.selection_misses, 3);
        assert_eq!(report.end, Some(RotationEnd::Stalled { remaining: 1 }));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_untagged_quote_consumed_then_done() {
        let corpus = vec![q("A", "x", &[])];
        let (store, _dir) = test_store(&corpus);
        let mut rotation = build(
            corpus,
            store,
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        );
        assert_eq!(rotation.phase(), RotationPhase::Idle);

        assert!(matches!(rotation.step().await, StepOutcome::Consumed { .. }));
        assert!(rotation.forbidden_tags().is_empty());
        assert!(matches!(rotation.step().await, StepOutcome::Exhausted));
        assert_eq!(rotation.phase(), RotationPhase::Finished);
    }

    #[tokio::test]
    async fn test_empty_corpus_run() {
        let (store, _dir) = test_store(&[]);
        let report = build(
            Vec::new(),
            store,
            Arc::new(FakeRenderer::default()),
            Arc::new(FakePublisher::default()),
        )
        .run()
        .await;
        assert_eq!(report.consumed, 0);
        assert_eq!(report.end, Some(RotationEnd::Exhausted));
    }
}
