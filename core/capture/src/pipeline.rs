use chrono::Utc;
use snapmark_schemas::{
    generate_snapshot_id, IntentResult, PageContent, Snapshot, TabInfo, DEFAULT_TITLE,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::heuristic::IntentClassifier;
use crate::llm::LanguageModel;
use crate::network::{ReachabilityProbe, DEFAULT_PROBE_TIMEOUT};
use crate::normalize::{count_words, TextNormalizer, MAX_EXCERPT_CHARS, MAX_TEXT_CHARS};
use crate::page::PageSource;
use crate::prompts::{intent_prompt, summary_prompt};
use crate::response::{parse_intent_response, parse_summary_response};
use crate::summarizer::{summarize_fallback, target_sentence_count};

const MAX_TAGS: usize = 4;

/// Which engines a pipeline may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// Pattern classifier and extractive summarizer only
    FallbackOnly,
    /// Try the language model when online, fall back per sub-result
    ModelWithFallback,
}

/// Turns a browser tab into a Snapshot. Never fails: every model or probe
/// failure degrades to the deterministic engines.
pub struct CapturePipeline {
    strategy: CaptureStrategy,
    model: Option<Arc<dyn LanguageModel>>,
    probe: Arc<dyn ReachabilityProbe>,
    probe_timeout: Duration,
    normalizer: TextNormalizer,
    classifier: IntentClassifier,
}

impl CapturePipeline {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, model: Option<Arc<dyn LanguageModel>>) -> Self {
        let strategy = if model.is_some() {
            CaptureStrategy::ModelWithFallback
        } else {
            CaptureStrategy::FallbackOnly
        };

        Self {
            strategy,
            model,
            probe,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            normalizer: TextNormalizer::new(),
            classifier: IntentClassifier::new(),
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn strategy(&self) -> CaptureStrategy {
        self.strategy
    }

    /// Probe reachability, bounded by the probe timeout even if the probe misbehaves
    pub async fn check_online(&self) -> bool {
        match tokio::time::timeout(self.probe_timeout, self.probe.is_online(self.probe_timeout))
            .await
        {
            Ok(online) => online,
            Err(_) => {
                warn!("Reachability probe exceeded {:?}", self.probe_timeout);
                false
            }
        }
    }

    /// Summary sentences for normalized page text
    pub async fn summarize(&self, text: &str, word_count: usize, online: bool) -> Vec<String> {
        let target = target_sentence_count(word_count);

        if let Some(model) = self.eligible_model(online) {
            if !text.is_empty() {
                match model.complete(&summary_prompt(text, word_count, target)).await {
                    Ok(raw) => match parse_summary_response(&raw) {
                        Some(sentences) => return sentences,
                        None => warn!("Model summary failed validation, using fallback"),
                    },
                    Err(e) => warn!("Model summary failed: {}, using fallback", e),
                }
            }
        }

        summarize_fallback(text, target)
    }

    /// Intent, tags and next action for a page
    pub async fn classify(&self, title: &str, text: &str, online: bool) -> IntentResult {
        if let Some(model) = self.eligible_model(online) {
            match model.complete(&intent_prompt(title, text)).await {
                Ok(raw) => match parse_intent_response(&raw) {
                    Some(result) => return result,
                    None => warn!("Model intent failed validation, using fallback"),
                },
                Err(e) => warn!("Model intent failed: {}, using fallback", e),
            }
        }

        self.classifier.classify(title, text)
    }

    /// Run a full capture of `tab`
    pub async fn capture(&self, pages: &dyn PageSource, tab: &TabInfo) -> Snapshot {
        let content = pages.extract(tab).await;
        let online = self.check_online().await;

        let title = resolve_title(&content, tab);
        let url = resolve_url(&content, tab);
        let text = self.normalizer.normalize(&content.text, MAX_TEXT_CHARS);
        let classify_text = self.normalizer.clean_excerpt(&content.text, MAX_TEXT_CHARS);
        let excerpt = self.normalizer.clean_excerpt(&content.text, MAX_EXCERPT_CHARS);
        let word_count = content
            .word_count
            .map(|wc| wc as usize)
            .unwrap_or_else(|| count_words(&content.text));

        debug!(
            "Capturing {} ({} words, online: {}, strategy: {:?})",
            url, word_count, online, self.strategy
        );

        let (summary, classification) = tokio::join!(
            self.summarize(&text, word_count, online),
            self.classify(&title, &classify_text, online),
        );

        let mut tags = classification.tags;
        tags.truncate(MAX_TAGS);
        if tags.is_empty() {
            tags.push("general".to_string());
        }

        let snapshot = Snapshot {
            id: generate_snapshot_id(),
            title,
            url,
            excerpt,
            summary,
            intent: classification.intent,
            tags,
            next_action: classification.next_action,
            word_count: word_count as u64,
            created_at: Utc::now().timestamp_millis(),
            online,
        };

        info!(
            "Captured {} with intent {:?} ({} summary sentences)",
            snapshot.id,
            snapshot.intent,
            snapshot.summary.len()
        );

        snapshot
    }

    fn eligible_model(&self, online: bool) -> Option<&Arc<dyn LanguageModel>> {
        match self.strategy {
            CaptureStrategy::ModelWithFallback if online => self.model.as_ref(),
            _ => None,
        }
    }
}

fn resolve_title(content: &PageContent, tab: &TabInfo) -> String {
    [Some(content.title.as_str()), tab.title.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

fn resolve_url(content: &PageContent, tab: &TabInfo) -> String {
    [Some(content.url.as_str()), tab.url.as_deref()]
        .into_iter()
        .flatten()
        .find(|u| !u.trim().is_empty())
        .unwrap_or_default()
        .to_string()
}
