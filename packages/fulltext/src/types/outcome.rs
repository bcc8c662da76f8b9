//! Outcome vocabulary shared by the resolver, the orchestrator, and the
//! reputation store.
//!
//! Every resolution or crawl attempt terminates in exactly one
//! [`ReasonCode`], so per-reason tallies can be aggregated across a run and
//! reputation decisions can key off the same labels the resolver produces.

use serde::{Deserialize, Serialize};

/// Why a resolution or crawl attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    // Success-class codes
    /// Input was not a redirect link; returned unchanged
    Passthrough,
    /// Target recovered by decoding the embedded identifier
    Decoded,
    /// Target recovered through the challenge-response API
    ApiResolved,
    /// Following redirects left the aggregator on its own
    HttpRedirect,
    /// Target recovered from a canonical link tag
    CanonicalLink,
    /// Target recovered from an og:url meta tag
    OgUrl,

    // Resolution failures
    /// Input contained whitespace or control characters
    MalformedInput,
    /// Identifier segment would not decode to a payload with a URL
    DecodeFailed,
    /// Payload carries the versioned marker; a later strategy is required
    NewFormatPayload,
    /// Landing page lacked the signature/timestamp markup
    MissingChallengeMarkup,
    /// Batch endpoint answered 403
    ApiForbidden,
    /// Batch endpoint answered 429
    ApiRateLimited,
    /// Batch endpoint answered 5xx
    ApiServerError,
    /// Batch endpoint answered another 4xx
    ApiClientError,
    /// Batch endpoint call timed out
    ApiTimeout,
    /// Batch endpoint was unreachable
    ApiConnection,
    /// Batch endpoint answered but no target URL could be parsed out
    ApiParseFailed,
    /// Canonical fallback fetch failed at the transport level
    CanonicalFetchFailed,
    /// Page HTML carried no off-aggregator canonical or og:url
    CanonicalNotFound,
    /// A strategy produced a URL still inside the aggregator's domain
    AggregatorLoop,

    // Fetch failures
    /// Content extraction exceeded its wall-clock budget
    FetchTimeout,
    /// Content extraction raised an error or declined the URL
    FetchFailed,
    /// Content was present but too short to be an article
    BelowLengthThreshold,

    // Quality failures
    /// No text at all
    EmptyContent,
    /// Token loop detected (unique/total ratio collapsed)
    RepeatedWords,
    /// Markup leaked into the extracted text
    CssJsCode,
    /// Paywall notice instead of an article
    Paywall,
    /// Removal or copyright notice instead of an article
    CopyrightUnavailable,

    // Relevance / verification failures
    /// Similarity to the headline fell below the threshold
    LowRelevance,
    /// Verifier judged the content a different event
    LlmRejected,
}

impl ReasonCode {
    /// Whether this code labels a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ReasonCode::Passthrough
                | ReasonCode::Decoded
                | ReasonCode::ApiResolved
                | ReasonCode::HttpRedirect
                | ReasonCode::CanonicalLink
                | ReasonCode::OgUrl
        )
    }

    /// How much a failure code tells us about the underlying cause.
    ///
    /// When every strategy fails, the resolver reports the highest-ranked
    /// failure it saw: challenge-API codes describe a concrete exchange with
    /// the aggregator, canonical codes at least examined live content, and a
    /// decode failure only says the payload was opaque.
    pub(crate) fn specificity(&self) -> u8 {
        match self {
            ReasonCode::MalformedInput => 4,
            ReasonCode::MissingChallengeMarkup
            | ReasonCode::ApiForbidden
            | ReasonCode::ApiRateLimited
            | ReasonCode::ApiServerError
            | ReasonCode::ApiClientError
            | ReasonCode::ApiTimeout
            | ReasonCode::ApiConnection
            | ReasonCode::ApiParseFailed => 3,
            ReasonCode::CanonicalFetchFailed
            | ReasonCode::CanonicalNotFound
            | ReasonCode::AggregatorLoop => 2,
            ReasonCode::DecodeFailed | ReasonCode::NewFormatPayload => 1,
            _ => 0,
        }
    }

    /// Stable label used in candidate error strings and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Passthrough => "passthrough",
            ReasonCode::Decoded => "decoded",
            ReasonCode::ApiResolved => "api_resolved",
            ReasonCode::HttpRedirect => "http_redirect",
            ReasonCode::CanonicalLink => "canonical_link",
            ReasonCode::OgUrl => "og_url",
            ReasonCode::MalformedInput => "malformed_input",
            ReasonCode::DecodeFailed => "decode_failed",
            ReasonCode::NewFormatPayload => "new_format_payload",
            ReasonCode::MissingChallengeMarkup => "missing_challenge_markup",
            ReasonCode::ApiForbidden => "api_forbidden",
            ReasonCode::ApiRateLimited => "api_rate_limited",
            ReasonCode::ApiServerError => "api_server_error",
            ReasonCode::ApiClientError => "api_client_error",
            ReasonCode::ApiTimeout => "api_timeout",
            ReasonCode::ApiConnection => "api_connection",
            ReasonCode::ApiParseFailed => "api_parse_failed",
            ReasonCode::CanonicalFetchFailed => "canonical_fetch_failed",
            ReasonCode::CanonicalNotFound => "canonical_not_found",
            ReasonCode::AggregatorLoop => "aggregator_loop",
            ReasonCode::FetchTimeout => "fetch_timeout",
            ReasonCode::FetchFailed => "fetch_failed",
            ReasonCode::BelowLengthThreshold => "below_length_threshold",
            ReasonCode::EmptyContent => "empty_content",
            ReasonCode::RepeatedWords => "repeated_words",
            ReasonCode::CssJsCode => "css_js_code",
            ReasonCode::Paywall => "paywall",
            ReasonCode::CopyrightUnavailable => "copyright_unavailable",
            ReasonCode::LowRelevance => "low_relevance",
            ReasonCode::LlmRejected => "llm_rejected",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resolution strategy produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    Passthrough,
    DirectDecode,
    ChallengeApi,
    CanonicalFallback,
}

/// The result of one resolution attempt. Constructed once, never mutated.
///
/// `success == true` implies `resolved_url` is present and `reason` is a
/// success-class code; `success == false` implies `resolved_url` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOutcome {
    pub success: bool,
    pub resolved_url: Option<String>,
    pub reason: ReasonCode,
    pub strategy: ResolveStrategy,
    pub http_status: Option<u16>,
    pub elapsed_ms: u64,
    pub error_detail: Option<String>,
}

impl ResolveOutcome {
    /// Build a successful outcome.
    pub fn resolved(
        url: impl Into<String>,
        reason: ReasonCode,
        strategy: ResolveStrategy,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            success: true,
            resolved_url: Some(url.into()),
            reason,
            strategy,
            http_status: None,
            elapsed_ms,
            error_detail: None,
        }
    }

    /// Build a failed outcome.
    pub fn failed(
        reason: ReasonCode,
        strategy: ResolveStrategy,
        http_status: Option<u16>,
        elapsed_ms: u64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            resolved_url: None,
            reason,
            strategy,
            http_status,
            elapsed_ms,
            error_detail: Some(detail.into()),
        }
    }
}

/// Terminal candidate outcome fed into the domain reputation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CrawlOutcome {
    /// Content was accepted; carries the verifier's score when one ran
    Success { llm_score: Option<f32> },
    /// The attempt failed before or during the quality gates
    Failure { reason: ReasonCode },
    /// The verifier judged the content a different event
    LlmRejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes_are_success_class() {
        assert!(ReasonCode::Passthrough.is_success());
        assert!(ReasonCode::Decoded.is_success());
        assert!(ReasonCode::OgUrl.is_success());
        assert!(!ReasonCode::DecodeFailed.is_success());
        assert!(!ReasonCode::Paywall.is_success());
    }

    #[test]
    fn challenge_codes_outrank_canonical_codes() {
        assert!(
            ReasonCode::MissingChallengeMarkup.specificity()
                > ReasonCode::CanonicalNotFound.specificity()
        );
        assert!(
            ReasonCode::CanonicalNotFound.specificity() > ReasonCode::DecodeFailed.specificity()
        );
    }

    #[test]
    fn resolved_outcome_holds_invariant() {
        let ok = ResolveOutcome::resolved(
            "https://example.com",
            ReasonCode::Decoded,
            ResolveStrategy::DirectDecode,
            3,
        );
        assert!(ok.success);
        assert!(ok.resolved_url.is_some());
        assert!(ok.reason.is_success());

        let failed = ResolveOutcome::failed(
            ReasonCode::DecodeFailed,
            ResolveStrategy::DirectDecode,
            None,
            3,
            "bad payload",
        );
        assert!(!failed.success);
        assert!(failed.resolved_url.is_none());
    }
}
