//! Canonical HTML fallback resolution (strategy 4).
//!
//! Last resort: fetch the redirect URL itself, let the HTTP client follow
//! redirects, and if the aggregator still has not handed us off, scan the
//! page for a canonical link or an og:url that points somewhere else.

use regex::Regex;
use tracing::debug;

use super::StrategyFailure;
use crate::types::config::AggregatorConfig;
use crate::types::outcome::ReasonCode;

/// Pull the canonical link out of page markup, tolerating either
/// attribute order.
pub(crate) fn parse_canonical_link(html: &str) -> Option<String> {
    let rel_first =
        Regex::new(r#"<link[^>]*rel=["']canonical["'][^>]*href=["']([^"']+)["']"#).unwrap();
    let href_first =
        Regex::new(r#"<link[^>]*href=["']([^"']+)["'][^>]*rel=["']canonical["']"#).unwrap();
    rel_first
        .captures(html)
        .or_else(|| href_first.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pull the og:url value out of page markup.
pub(crate) fn parse_og_url(html: &str) -> Option<String> {
    let property_first =
        Regex::new(r#"<meta[^>]*property=["']og:url["'][^>]*content=["']([^"']+)["']"#).unwrap();
    let content_first =
        Regex::new(r#"<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:url["']"#).unwrap();
    property_first
        .captures(html)
        .or_else(|| content_first.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fetch the redirect URL and look for any exit from the aggregator.
///
/// Success carries the reason that found it: `HttpRedirect` when the final
/// URL already left the aggregator, else `CanonicalLink` or `OgUrl`.
pub(crate) async fn resolve_via_canonical(
    client: &reqwest::Client,
    config: &AggregatorConfig,
    url: &str,
    off_aggregator: impl Fn(&str) -> bool,
) -> Result<(String, ReasonCode), StrategyFailure> {
    debug!(url = %url, "canonical fallback fetch");

    let response = client.get(url).send().await.map_err(|e| StrategyFailure {
        reason: ReasonCode::CanonicalFetchFailed,
        http_status: None,
        detail: format!("canonical fetch: {e}"),
    })?;

    let status = response.status();
    let final_url = response.url().to_string();
    if off_aggregator(&final_url) {
        return Ok((final_url, ReasonCode::HttpRedirect));
    }

    if !status.is_success() {
        return Err(StrategyFailure {
            reason: ReasonCode::CanonicalFetchFailed,
            http_status: Some(status.as_u16()),
            detail: format!("canonical fetch answered {status}"),
        });
    }

    let html = response.text().await.map_err(|e| StrategyFailure {
        reason: ReasonCode::CanonicalFetchFailed,
        http_status: Some(status.as_u16()),
        detail: format!("canonical body: {e}"),
    })?;

    if let Some(canonical) = parse_canonical_link(&html) {
        if off_aggregator(&canonical) {
            return Ok((canonical, ReasonCode::CanonicalLink));
        }
    }
    if let Some(og) = parse_og_url(&html) {
        if off_aggregator(&og) {
            return Ok((og, ReasonCode::OgUrl));
        }
    }

    Err(StrategyFailure {
        reason: ReasonCode::CanonicalNotFound,
        http_status: Some(status.as_u16()),
        detail: "no off-aggregator canonical or og:url in page".to_string(),
    })
}
