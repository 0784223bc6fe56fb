use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Title used when neither the page nor the tab reports one.
pub const DEFAULT_TITLE: &str = "Untitled Page";

// ============================================================================
// ULID and ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(value: &str) -> Self {
        SnapshotId(value.to_string())
    }
}

// ============================================================================
// Snapshot Schema
// ============================================================================

/// One persisted capture of a browser tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, deserialize_with = "summary_from_any")]
    pub summary: Vec<String>,
    #[serde(default)]
    pub intent: String,
    #[serde(default, deserialize_with = "tags_from_any")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub next_action: String,
    #[serde(default)]
    pub word_count: u64,
    /// Unix epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub online: bool,
}

impl Snapshot {
    /// Case-insensitive match against title, intent, url and summary.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.intent.to_lowercase().contains(needle)
            || self.url.to_lowercase().contains(needle)
            || self.summary.join(" ").to_lowercase().contains(needle)
    }
}

/// Result of intent classification, from either the model or the pattern engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: String,
    pub tags: Vec<String>,
    pub next_action: String,
}

// ============================================================================
// Page Source Schema
// ============================================================================

/// Browser tab metadata as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Content extracted from a page by the in-page extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "wordCount", skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
}

impl PageContent {
    /// Degraded record returned when extraction is impossible.
    pub fn placeholder(tab: &TabInfo) -> Self {
        Self {
            title: tab
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            text: String::new(),
            url: tab.url.clone().unwrap_or_default(),
            word_count: Some(0),
        }
    }
}

// ============================================================================
// Message Protocol Schema
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CaptureCurrentTab,
    GetSnapshots,
    SearchSnapshots,
    DeleteSnapshot,
    UpdateSnapshotIntent,
    ExportMarkdown,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "capture_current_tab" => Some(Action::CaptureCurrentTab),
            "get_snapshots" => Some(Action::GetSnapshots),
            "search_snapshots" => Some(Action::SearchSnapshots),
            "delete_snapshot" => Some(Action::DeleteSnapshot),
            "update_snapshot_intent" => Some(Action::UpdateSnapshotIntent),
            "export_markdown" => Some(Action::ExportMarkdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CaptureCurrentTab => "capture_current_tab",
            Action::GetSnapshots => "get_snapshots",
            Action::SearchSnapshots => "search_snapshots",
            Action::DeleteSnapshot => "delete_snapshot",
            Action::UpdateSnapshotIntent => "update_snapshot_intent",
            Action::ExportMarkdown => "export_markdown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incoming request. `action` stays a raw string so unknown names can be reported back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Active tab as seen by the caller, used by `capture_current_tab`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<TabInfo>,
    /// Content already extracted by the caller's content script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PageContent>,
}

impl MessageRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action: Some(action.as_str().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn generate_snapshot_id() -> SnapshotId {
    SnapshotId(format!("snap_{}", ulid::Ulid::new()))
}

/// Split prose into sentences at terminal punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// Older records may carry the summary as one unsplit string.
fn summary_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(value_to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(text)) => split_sentences(&text),
        _ => Vec::new(),
    })
}

fn tags_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items.into_iter().map(value_to_text).collect(),
        Some(Value::String(text)) => text.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(raw
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
