//! Content-extraction collaborator seam.
//!
//! The orchestrator never fetches article bodies itself; it hands resolved
//! URLs to an external extractor (HTTP scraper, browser-automation service,
//! etc.) and only interprets the success flag, the length, and the skip
//! reason of what comes back.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExtractResult;

/// How the collaborator should fetch the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Plain HTTP fetch and markdown conversion
    Standard,
    /// Delegate to a browser-automation backend for script-heavy pages
    Browser,
}

/// What the extraction collaborator returns for one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Whether the collaborator considers the fetch usable
    pub success: bool,

    /// Extracted article body as markdown
    pub markdown: String,

    /// Collaborator-reported content length in characters
    pub markdown_length: usize,

    /// Page title if the collaborator found one
    pub title: Option<String>,

    /// Why the collaborator declined, when `success` is false
    pub skip_reason: Option<String>,

    /// Lead image URL if the collaborator found one
    pub top_image: Option<String>,
}

impl ExtractedContent {
    /// A successful extraction.
    pub fn new(markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let markdown_length = markdown.chars().count();
        Self {
            success: true,
            markdown,
            markdown_length,
            title: None,
            skip_reason: None,
            top_image: None,
        }
    }

    /// A declined fetch with the collaborator's reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            markdown: String::new(),
            markdown_length: 0,
            title: None,
            skip_reason: Some(reason.into()),
            top_image: None,
        }
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the lead image.
    pub fn with_top_image(mut self, url: impl Into<String>) -> Self {
        self.top_image = Some(url.into());
        self
    }
}

/// Collaborator that turns a URL into article markdown.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch and extract one page.
    ///
    /// `blocked_hosts` is the run's block set; collaborators are expected to
    /// decline (not error) when the target host appears in it.
    async fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
        blocked_hosts: &HashSet<String>,
    ) -> ExtractResult<ExtractedContent>;

    /// Collaborator name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
