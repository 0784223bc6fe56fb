use chrono::{DateTime, Local, TimeZone};
use snapmark_schemas::Snapshot;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOT_AVAILABLE: &str = "N/A";

/// Markdown renderer for a snapshot sequence
pub struct MarkdownRenderer;

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole store as one document, stamped with the current local time
    pub fn render(&self, snapshots: &[Snapshot]) -> String {
        self.render_at(snapshots, Local::now())
    }

    /// Render with an explicit generation timestamp
    pub fn render_at(&self, snapshots: &[Snapshot], generated_at: DateTime<Local>) -> String {
        let mut lines = vec![
            format!("# Snapmark Export ({} snapshots)", snapshots.len()),
            format!("**Generated:** {}", generated_at.format(TIME_FORMAT)),
            format!("**Total Snapshots:** {}", snapshots.len()),
            String::new(),
            "---".to_string(),
            String::new(),
        ];

        for snapshot in snapshots {
            lines.extend(self.render_snapshot(snapshot));
        }

        lines.join("\n")
    }

    fn render_snapshot(&self, snapshot: &Snapshot) -> Vec<String> {
        let tags = snapshot
            .tags
            .iter()
            .map(|t| format!("`{}`", t))
            .collect::<Vec<_>>()
            .join(", ");

        let mut lines = vec![
            format!("## {}", snapshot.title),
            String::new(),
            format!("**URL:** {}", snapshot.url),
            format!("**Intent:** {}", or_not_available(&snapshot.intent)),
            format!("**Tags:** {}", or_not_available(&tags)),
            format!("**Next Action:** {}", or_not_available(&snapshot.next_action)),
            format!("**Saved:** {}", format_saved_time(snapshot.created_at)),
            String::new(),
            "**Summary:**".to_string(),
        ];

        if snapshot.summary.is_empty() {
            lines.push("- (No summary)".to_string());
        } else {
            // Bullets must stay on one line
            lines.extend(
                snapshot
                    .summary
                    .iter()
                    .map(|s| format!("- {}", s.replace(&['\r', '\n'][..], " "))),
            );
        }

        lines.extend([String::new(), "---".to_string(), String::new()]);
        lines
    }
}

fn or_not_available(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn format_saved_time(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => "unknown".to_string(),
    }
}
