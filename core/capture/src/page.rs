use async_trait::async_trait;
use snapmark_schemas::{MessageRequest, PageContent, TabInfo};
use tracing::warn;

/// Host-side access to browser tabs and their extracted content
#[async_trait]
pub trait PageSource: Send + Sync {
    /// The tab a capture should operate on, if any
    async fn active_tab(&self) -> Option<TabInfo>;

    /// Extract readable content. Never fails; degrades to a placeholder record.
    async fn extract(&self, tab: &TabInfo) -> PageContent;
}

/// Page already extracted by the caller and submitted with the request
#[derive(Debug, Clone, Default)]
pub struct SubmittedPage {
    tab: Option<TabInfo>,
    content: Option<PageContent>,
}

impl SubmittedPage {
    pub fn new(tab: Option<TabInfo>, content: Option<PageContent>) -> Self {
        // Content without tab metadata still describes a tab
        let tab = tab.or_else(|| {
            content.as_ref().map(|c| TabInfo {
                id: None,
                title: Some(c.title.clone()).filter(|t| !t.is_empty()),
                url: Some(c.url.clone()).filter(|u| !u.is_empty()),
            })
        });

        Self { tab, content }
    }

    pub fn from_request(request: &MessageRequest) -> Self {
        Self::new(request.tab.clone(), request.content.clone())
    }
}

#[async_trait]
impl PageSource for SubmittedPage {
    async fn active_tab(&self) -> Option<TabInfo> {
        self.tab.clone()
    }

    async fn extract(&self, tab: &TabInfo) -> PageContent {
        match &self.content {
            Some(content) => content.clone(),
            None => {
                warn!(
                    "No content submitted for tab {:?}, using placeholder",
                    tab.url.as_deref().unwrap_or("")
                );
                PageContent::placeholder(tab)
            }
        }
    }
}
