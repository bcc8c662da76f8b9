//! Redirect Resolution Engine.
//!
//! Turns one aggregator redirect link into the real article URL, or into a
//! typed failure. Strategies run in a fixed precedence order and stop at
//! the first one that yields a host outside the aggregator's domain:
//!
//! 1. Passthrough — the input is not a redirect link at all
//! 2. Direct decode — the old encoding embeds the URL in the identifier
//! 3. Challenge-response API — the new encoding needs two round-trips
//! 4. Canonical HTML fallback — follow redirects and scan the page
//!
//! `resolve` always returns within a bounded time and never propagates an
//! error: every network or parse failure becomes a [`ResolveOutcome`].

mod batch_api;
mod canonical;
mod decode;

use std::time::Instant;

use tracing::{debug, info};
use url::Url;

use crate::types::config::AggregatorConfig;
use crate::types::outcome::{ReasonCode, ResolveOutcome, ResolveStrategy};
use decode::DecodedPayload;

/// A failed strategy, with enough detail to pick the most telling one.
#[derive(Debug, Clone)]
pub(crate) struct StrategyFailure {
    pub reason: ReasonCode,
    pub http_status: Option<u16>,
    pub detail: String,
}

/// Resolves aggregator redirect links to their target articles.
pub struct RedirectResolver {
    client: reqwest::Client,
    config: AggregatorConfig,
}

impl Default for RedirectResolver {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl RedirectResolver {
    /// Create a resolver for the configured aggregator.
    pub fn new(config: AggregatorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("failed to create HTTP client");
        Self { client, config }
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The aggregator this resolver targets.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Whether a URL has the aggregator's redirect-link shape.
    pub fn is_redirect_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => {
                let on_aggregator = parsed
                    .host_str()
                    .is_some_and(|h| self.is_aggregator_host(h));
                let path = parsed.path();
                on_aggregator
                    && (path.starts_with("/rss/articles/") || path.starts_with("/articles/"))
            }
            Err(_) => false,
        }
    }

    /// Resolve one redirect link.
    pub async fn resolve(&self, url: &str) -> ResolveOutcome {
        let started = Instant::now();

        if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return ResolveOutcome::failed(
                ReasonCode::MalformedInput,
                ResolveStrategy::Passthrough,
                None,
                elapsed_ms(started),
                "input contains whitespace or control characters",
            );
        }

        if !self.is_redirect_url(url) {
            return ResolveOutcome::resolved(
                url,
                ReasonCode::Passthrough,
                ResolveStrategy::Passthrough,
                elapsed_ms(started),
            );
        }

        let mut failures: Vec<(ResolveStrategy, StrategyFailure)> = Vec::new();

        match self.article_id(url) {
            Some(article_id) => match decode::decode_article_id(&article_id) {
                Ok(DecodedPayload::Url(target)) => {
                    if self.off_aggregator(&target) {
                        debug!(url = %url, target = %target, "resolved by direct decode");
                        return ResolveOutcome::resolved(
                            target,
                            ReasonCode::Decoded,
                            ResolveStrategy::DirectDecode,
                            elapsed_ms(started),
                        );
                    }
                    failures.push((
                        ResolveStrategy::DirectDecode,
                        StrategyFailure {
                            reason: ReasonCode::AggregatorLoop,
                            http_status: None,
                            detail: format!("decoded URL stays on aggregator: {target}"),
                        },
                    ));
                }
                Ok(DecodedPayload::NewFormat) => {
                    debug!(url = %url, "payload is new format, trying challenge API");
                    match batch_api::resolve_new_format(&self.client, &self.config, &article_id)
                        .await
                    {
                        Ok(target) if self.off_aggregator(&target) => {
                            debug!(url = %url, target = %target, "resolved by challenge API");
                            return ResolveOutcome::resolved(
                                target,
                                ReasonCode::ApiResolved,
                                ResolveStrategy::ChallengeApi,
                                elapsed_ms(started),
                            );
                        }
                        Ok(target) => failures.push((
                            ResolveStrategy::ChallengeApi,
                            StrategyFailure {
                                reason: ReasonCode::AggregatorLoop,
                                http_status: None,
                                detail: format!("API answer stays on aggregator: {target}"),
                            },
                        )),
                        Err(failure) => failures.push((ResolveStrategy::ChallengeApi, failure)),
                    }
                }
                Err(detail) => failures.push((
                    ResolveStrategy::DirectDecode,
                    StrategyFailure {
                        reason: ReasonCode::DecodeFailed,
                        http_status: None,
                        detail,
                    },
                )),
            },
            None => failures.push((
                ResolveStrategy::DirectDecode,
                StrategyFailure {
                    reason: ReasonCode::DecodeFailed,
                    http_status: None,
                    detail: "no identifier segment in redirect URL".to_string(),
                },
            )),
        }

        match canonical::resolve_via_canonical(&self.client, &self.config, url, |candidate| {
            self.off_aggregator(candidate)
        })
        .await
        {
            Ok((target, reason)) => {
                debug!(url = %url, target = %target, reason = %reason, "resolved by canonical fallback");
                ResolveOutcome::resolved(
                    target,
                    reason,
                    ResolveStrategy::CanonicalFallback,
                    elapsed_ms(started),
                )
            }
            Err(failure) => {
                failures.push((ResolveStrategy::CanonicalFallback, failure));
                let (strategy, most_specific) = pick_most_specific(failures);
                info!(
                    url = %url,
                    reason = %most_specific.reason,
                    "all resolution strategies failed"
                );
                ResolveOutcome::failed(
                    most_specific.reason,
                    strategy,
                    most_specific.http_status,
                    elapsed_ms(started),
                    format!(
                        "all resolution strategies failed: {}",
                        most_specific.detail
                    ),
                )
            }
        }
    }

    /// Last path segment of a redirect URL, stripped of query noise.
    fn article_id(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .next_back()
            .map(|s| s.to_string())
    }

    fn is_aggregator_host(&self, host: &str) -> bool {
        let domain = self.config.domain.as_str();
        host.eq_ignore_ascii_case(domain)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
    }

    /// Whether a URL's host lies outside the aggregator's domain.
    fn off_aggregator(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .is_some_and(|h| !self.is_aggregator_host(h)),
            Err(_) => false,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Of all failed strategies, keep the one that says the most.
fn pick_most_specific(
    failures: Vec<(ResolveStrategy, StrategyFailure)>,
) -> (ResolveStrategy, StrategyFailure) {
    failures
        .into_iter()
        .enumerate()
        .max_by_key(|(index, (_, failure))| (failure.reason.specificity(), *index))
        .map(|(_, picked)| picked)
        .unwrap_or((
            ResolveStrategy::CanonicalFallback,
            StrategyFailure {
                reason: ReasonCode::CanonicalNotFound,
                http_status: None,
                detail: "no strategy produced an outcome".to_string(),
            },
        ))
}
