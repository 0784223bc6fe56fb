use anyhow::Result;
use async_trait::async_trait;
use snapmark_capture::{
    CapturePipeline, FixedProbe, LanguageModel, PageSource, PromptRequest, ReachabilityProbe,
    SubmittedPage,
};
use snapmark_schemas::{PageContent, TabInfo, DEFAULT_TITLE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const ARTICLE: &str = "Rust makes systems programming approachable for many teams. \
    The ownership model removes whole classes of memory bugs. \
    Cargo handles builds, dependencies and publishing in one tool. \
    The community maintains thousands of high quality crates.";

/// Probe that never answers in time
struct HangingProbe;

#[async_trait]
impl ReachabilityProbe for HangingProbe {
    async fn is_online(&self, _timeout: Duration) -> bool {
        tokio::time::sleep(Duration::from_secs(10)).await;
        true
    }
}

/// Model with canned replies for the summary and intent prompts
struct StubModel {
    summary: Option<String>,
    intent: Option<String>,
    calls: AtomicUsize,
}

impl StubModel {
    fn new(summary: Option<&str>, intent: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            summary: summary.map(str::to_string),
            intent: intent.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, request: &PromptRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = if request.prompt.contains("JSON array") {
            &self.summary
        } else {
            &self.intent
        };
        reply
            .clone()
            .ok_or_else(|| anyhow::anyhow!("model unavailable"))
    }
}

fn page(title: &str, url: &str, text: &str) -> (SubmittedPage, TabInfo) {
    let tab = TabInfo {
        id: Some(1),
        title: Some(title.to_string()),
        url: Some(url.to_string()),
    };
    let content = PageContent {
        title: title.to_string(),
        text: text.to_string(),
        url: url.to_string(),
        word_count: None,
    };
    (SubmittedPage::new(Some(tab.clone()), Some(content)), tab)
}

fn assert_terminated(summary: &[String]) {
    assert!(!summary.is_empty());
    for sentence in summary {
        assert!(
            sentence.ends_with(&['.', '!', '?'][..]),
            "unterminated sentence: {}",
            sentence
        );
    }
}

#[tokio::test]
async fn test_probe_timeout_still_produces_snapshot() {
    let model = StubModel::new(
        Some(r#"["Never used because the probe times out.", "Still never used here."]"#),
        Some(r#"{"intent": "Never used"}"#),
    );
    let pipeline = CapturePipeline::new(Arc::new(HangingProbe), Some(model.clone()))
        .with_probe_timeout(Duration::from_millis(50));
    let (pages, tab) = page(
        "Best Laptop Deals 2024",
        "https://shop.example/laptops",
        "Buy a laptop for $800",
    );

    let start = Instant::now();
    let snapshot = pipeline.capture(&pages, &tab).await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!snapshot.online);
    assert_eq!(model.calls(), 0);
    assert_eq!(snapshot.title, "Best Laptop Deals 2024");
    assert_eq!(snapshot.url, "https://shop.example/laptops");
    assert_eq!(snapshot.next_action, "Compare prices and reviews");
    assert_eq!(snapshot.intent, "Research best laptop purchase");
    assert!(!snapshot.tags.is_empty() && snapshot.tags.len() <= 4);
    assert_terminated(&snapshot.summary);
    assert!(snapshot.id.0.starts_with("snap_"));
}

#[tokio::test]
async fn test_model_path_when_online() {
    let model = StubModel::new(
        Some(r#"["Rust brings memory safety to systems work.", "Cargo streamlines builds and publishing."]"#),
        Some(r#"{"intent": "Evaluate Rust for a new service", "tags": ["rust", "Programming"], "next_action": "Try the tutorial"}"#),
    );
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(true)), Some(model.clone()));
    let (pages, tab) = page("Why Rust", "https://blog.example/rust", ARTICLE);

    let snapshot = pipeline.capture(&pages, &tab).await;

    assert!(snapshot.online);
    assert_eq!(model.calls(), 2);
    assert_eq!(
        snapshot.summary,
        vec![
            "Rust brings memory safety to systems work.",
            "Cargo streamlines builds and publishing."
        ]
    );
    assert_eq!(snapshot.intent, "Evaluate Rust for a new service");
    assert_eq!(snapshot.tags, vec!["rust", "programming"]);
    assert_eq!(snapshot.next_action, "Try the tutorial");
}

#[tokio::test]
async fn test_sub_results_fall_back_independently() {
    // Summary reply fails validation, intent reply is usable
    let model = StubModel::new(
        Some("ok"),
        Some(r#"Sure: {"intent": "Learn Rust ownership"} hope that helps"#),
    );
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(true)), Some(model.clone()));
    let (pages, tab) = page("Why Rust", "https://blog.example/rust", ARTICLE);

    let snapshot = pipeline.capture(&pages, &tab).await;

    assert_eq!(snapshot.intent, "Learn Rust ownership");
    assert_eq!(snapshot.tags, vec!["general"]);
    assert_eq!(snapshot.next_action, "Read later");
    assert_eq!(snapshot.summary.len(), 3);
    assert!(snapshot.summary[0].starts_with("Rust makes systems programming"));
}

#[tokio::test]
async fn test_model_errors_degrade_to_fallback() {
    let model = StubModel::new(None, None);
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(true)), Some(model.clone()));
    let (pages, tab) = page(
        "Tutorial: where to buy a used bike",
        "https://bikes.example/guide",
        ARTICLE,
    );

    let snapshot = pipeline.capture(&pages, &tab).await;

    assert!(snapshot.online);
    assert_eq!(model.calls(), 2);
    assert!(snapshot.tags.contains(&"tutorial".to_string()));
    assert_terminated(&snapshot.summary);
}

#[tokio::test]
async fn test_offline_skips_model() {
    let model = StubModel::new(Some("unused"), Some("unused"));
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(false)), Some(model.clone()));
    let (pages, tab) = page("Why Rust", "https://blog.example/rust", ARTICLE);

    let snapshot = pipeline.capture(&pages, &tab).await;

    assert!(!snapshot.online);
    assert_eq!(model.calls(), 0);
    assert_eq!(snapshot.word_count, 34);
}

#[tokio::test]
async fn test_failed_extraction_uses_tab_metadata() {
    let tab = TabInfo {
        id: Some(3),
        title: None,
        url: Some("https://blank.example".to_string()),
    };
    let pages = SubmittedPage::new(Some(tab.clone()), None);
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(false)), None);

    assert!(pages.active_tab().await.is_some());
    let snapshot = pipeline.capture(&pages, &tab).await;

    assert_eq!(snapshot.title, DEFAULT_TITLE);
    assert_eq!(snapshot.url, "https://blank.example");
    assert_eq!(snapshot.summary, vec!["Content summary unavailable."]);
    assert_eq!(snapshot.intent, "Review this page");
    assert_eq!(snapshot.tags, vec!["general", "reading"]);
    assert_eq!(snapshot.word_count, 0);
}
