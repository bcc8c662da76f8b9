//! Content quality gate.
//!
//! Classifies freshly extracted text as usable or as one of several garbage
//! categories. Pure function, no I/O, deterministic; checks run in order
//! and the first match wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::outcome::ReasonCode;

/// CSS/JS syntax fragments that betray markup leaking into "article" text.
const CSS_JS_FRAGMENTS: &[&str] = &[
    "font-family:",
    "font-size:",
    "@media",
    "display:",
    "margin:",
    "padding:",
    "background-color:",
    "width:",
    "function(",
    "document.",
    "window.",
    "var ",
];

/// Phrases that mark a paywall notice rather than an article.
const PAYWALL_PHRASES: &[&str] = &[
    "subscribe to continue",
    "subscribe now to read",
    "subscription required",
    "sign in to continue",
    "to continue reading",
    "already a subscriber",
    "register to continue",
    "create a free account",
    "this article is for subscribers",
];

/// Phrases that mark removed or rights-restricted content.
const UNAVAILABLE_PHRASES: &[&str] = &[
    "content is not available",
    "this content is unavailable",
    "no longer available",
    "page you requested was not found",
    "article has been removed",
    "access to this page has been denied",
    "this material may not be published, broadcast, rewritten",
];

/// How many distinct CSS/JS fragments must appear before text is markup.
const CSS_JS_FRAGMENT_THRESHOLD: usize = 3;

/// Why extracted text is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarbageReason {
    EmptyContent,
    RepeatedWords,
    CssJsCode,
    Paywall,
    CopyrightUnavailable,
}

impl From<GarbageReason> for ReasonCode {
    fn from(reason: GarbageReason) -> Self {
        match reason {
            GarbageReason::EmptyContent => ReasonCode::EmptyContent,
            GarbageReason::RepeatedWords => ReasonCode::RepeatedWords,
            GarbageReason::CssJsCode => ReasonCode::CssJsCode,
            GarbageReason::Paywall => ReasonCode::Paywall,
            GarbageReason::CopyrightUnavailable => ReasonCode::CopyrightUnavailable,
        }
    }
}

impl std::fmt::Display for GarbageReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ReasonCode::from(*self).fmt(f)
    }
}

/// Classify text; `None` means the content is usable.
pub fn classify(text: &str) -> Option<GarbageReason> {
    if text.trim().is_empty() {
        return Some(GarbageReason::EmptyContent);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 50 {
        let unique: HashSet<&str> = words.iter().copied().collect();
        if (unique.len() as f32) / (words.len() as f32) < 0.1 {
            return Some(GarbageReason::RepeatedWords);
        }
    }

    let head = char_prefix(text, 2000);
    let fragment_hits = CSS_JS_FRAGMENTS
        .iter()
        .filter(|fragment| head.contains(*fragment))
        .count();
    if fragment_hits >= CSS_JS_FRAGMENT_THRESHOLD {
        return Some(GarbageReason::CssJsCode);
    }

    let head = char_prefix(text, 1000).to_lowercase();
    if PAYWALL_PHRASES.iter().any(|phrase| head.contains(phrase)) {
        return Some(GarbageReason::Paywall);
    }
    if UNAVAILABLE_PHRASES
        .iter()
        .any(|phrase| head.contains(phrase))
    {
        return Some(GarbageReason::CopyrightUnavailable);
    }

    None
}

/// First `max` characters of `text`, respecting char boundaries.
pub(crate) fn char_prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
