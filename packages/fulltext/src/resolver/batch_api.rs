//! Challenge-response resolution through the aggregator's batch RPC
//! endpoint (strategy 3).
//!
//! New-scheme identifiers cannot be decoded offline. The aggregator's own
//! article page embeds a one-time signature and timestamp; POSTing those
//! back with the identifier in a `garturlreq` envelope yields the target
//! URL inside a loosely-structured batch response.

use regex::Regex;
use reqwest::StatusCode;
use tracing::debug;

use super::StrategyFailure;
use crate::types::config::AggregatorConfig;
use crate::types::outcome::ReasonCode;

/// RPC id of the URL-resolution call on the batch endpoint.
const RPC_ID: &str = "Fbv4je";

/// Path of the batch endpoint under the aggregator base URL.
const BATCH_PATH: &str = "/_/DotsSplashUi/data/batchexecute";

/// One-time credentials harvested from an article landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Challenge {
    pub signature: String,
    pub timestamp: String,
}

/// Pull the signature/timestamp attributes out of landing-page markup.
pub(crate) fn parse_challenge_markup(html: &str) -> Option<Challenge> {
    let signature = Regex::new(r#"data-n-a-sg="([^"]+)""#)
        .unwrap()
        .captures(html)?
        .get(1)?
        .as_str()
        .to_string();
    let timestamp = Regex::new(r#"data-n-a-ts="([^"]+)""#)
        .unwrap()
        .captures(html)?
        .get(1)?
        .as_str()
        .to_string();
    Some(Challenge {
        signature,
        timestamp,
    })
}

/// Build the `f.req` envelope for one identifier.
pub(crate) fn build_batch_envelope(article_id: &str, challenge: &Challenge) -> String {
    let timestamp: u64 = challenge.timestamp.parse().unwrap_or_default();
    let request = serde_json::json!([
        "garturlreq",
        [
            ["X", "X", ["X", "X"], null, null, 1, 1, "US:en", null, 1, null, null, null, null, null, 0, 1],
            "X", "X", 1, [1, 1, 1], 1, 1, null, 0, 0, null, 0
        ],
        article_id,
        timestamp,
        challenge.signature,
    ]);
    serde_json::json!([[[RPC_ID, request.to_string(), null, "generic"]]]).to_string()
}

/// Find the target URL in a batch response body.
///
/// The response nests JSON inside JSON, so the URL shows up either
/// normally escaped or double-escaped depending on which layer leaked it.
pub(crate) fn parse_batch_response(body: &str) -> Option<String> {
    let plain = Regex::new(r#""garturlres","(https?://[^"]+)""#).unwrap();
    if let Some(caps) = plain.captures(body) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    let escaped = Regex::new(r#"\\"garturlres\\",\\"(https?:.+?)\\""#).unwrap();
    if let Some(caps) = escaped.captures(body) {
        return caps.get(1).map(|m| m.as_str().replace("\\/", "/"));
    }
    None
}

/// Map an aggregator HTTP status onto a reason code.
pub(crate) fn reason_for_status(status: StatusCode) -> ReasonCode {
    match status {
        StatusCode::FORBIDDEN => ReasonCode::ApiForbidden,
        StatusCode::TOO_MANY_REQUESTS => ReasonCode::ApiRateLimited,
        s if s.is_server_error() => ReasonCode::ApiServerError,
        _ => ReasonCode::ApiClientError,
    }
}

fn reason_for_transport(error: &reqwest::Error) -> ReasonCode {
    if error.is_timeout() {
        ReasonCode::ApiTimeout
    } else {
        ReasonCode::ApiConnection
    }
}

/// Resolve a new-scheme identifier: harvest the challenge, then ask the
/// batch endpoint for the target. Two network round-trips.
pub(crate) async fn resolve_new_format(
    client: &reqwest::Client,
    config: &AggregatorConfig,
    article_id: &str,
) -> Result<String, StrategyFailure> {
    let landing_url = format!("{}/rss/articles/{}", config.base_url, article_id);
    debug!(url = %landing_url, "fetching landing page for challenge markup");

    let landing = client
        .get(&landing_url)
        .send()
        .await
        .map_err(|e| StrategyFailure {
            reason: reason_for_transport(&e),
            http_status: None,
            detail: format!("landing page: {e}"),
        })?;

    let status = landing.status();
    if !status.is_success() {
        return Err(StrategyFailure {
            reason: reason_for_status(status),
            http_status: Some(status.as_u16()),
            detail: format!("landing page answered {status}"),
        });
    }

    let html = landing.text().await.map_err(|e| StrategyFailure {
        reason: ReasonCode::ApiConnection,
        http_status: Some(status.as_u16()),
        detail: format!("landing page body: {e}"),
    })?;

    let challenge = parse_challenge_markup(&html).ok_or_else(|| StrategyFailure {
        reason: ReasonCode::MissingChallengeMarkup,
        http_status: Some(status.as_u16()),
        detail: "landing page lacks signature/timestamp markup".to_string(),
    })?;

    let envelope = build_batch_envelope(article_id, &challenge);
    let batch_url = format!("{}{}", config.base_url, BATCH_PATH);
    debug!(url = %batch_url, "posting batch resolution request");

    let response = client
        .post(&batch_url)
        .form(&[("f.req", envelope.as_str())])
        .send()
        .await
        .map_err(|e| StrategyFailure {
            reason: reason_for_transport(&e),
            http_status: None,
            detail: format!("batch endpoint: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(StrategyFailure {
            reason: reason_for_status(status),
            http_status: Some(status.as_u16()),
            detail: format!("batch endpoint answered {status}"),
        });
    }

    let body = response.text().await.map_err(|e| StrategyFailure {
        reason: ReasonCode::ApiConnection,
        http_status: Some(status.as_u16()),
        detail: format!("batch response body: {e}"),
    })?;

    parse_batch_response(&body).ok_or_else(|| StrategyFailure {
        reason: ReasonCode::ApiParseFailed,
        http_status: Some(status.as_u16()),
        detail: "no target URL in batch response".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_challenge_markup() {
        let html = r#"<c-wiz data-n-a-id="abc" data-n-a-sg="SIG123" data-n-a-ts="1712000000"></c-wiz>"#;
        let challenge = parse_challenge_markup(html).unwrap();
        assert_eq!(challenge.signature, "SIG123");
        assert_eq!(challenge.timestamp, "1712000000");
    }

    #[test]
    fn missing_signature_is_none() {
        let html = r#"<c-wiz data-n-a-ts="1712000000"></c-wiz>"#;
        assert!(parse_challenge_markup(html).is_none());
        assert!(parse_challenge_markup("<html></html>").is_none());
    }

    #[test]
    fn envelope_carries_id_timestamp_signature() {
        let challenge = Challenge {
            signature: "SIG".to_string(),
            timestamp: "1712000000".to_string(),
        };
        let envelope = build_batch_envelope("CBMiABC", &challenge);
        assert!(envelope.contains(RPC_ID));
        assert!(envelope.contains("CBMiABC"));
        assert!(envelope.contains("1712000000"));
        assert!(envelope.contains("SIG"));
        assert!(envelope.contains("garturlreq"));
    }

    #[test]
    fn parses_plain_batch_response() {
        let body = r#"["garturlres","https://example.com/story",1]"#;
        assert_eq!(
            parse_batch_response(body).as_deref(),
            Some("https://example.com/story")
        );
    }

    #[test]
    fn parses_escaped_batch_response() {
        let body = r#")]}'
[["wrb.fr","Fbv4je","[\"garturlres\",\"https://example.com/story\",1]",null,null,null,"generic"]]"#;
        assert_eq!(
            parse_batch_response(body).as_deref(),
            Some("https://example.com/story")
        );
    }

    #[test]
    fn parses_double_escaped_batch_response() {
        let body = r#"[["wrb.fr","Fbv4je","[\"garturlres\",\"https:\/\/example.com\/story\",1]"]]"#;
        assert_eq!(
            parse_batch_response(body).as_deref(),
            Some("https://example.com/story")
        );
    }

    #[test]
    fn unparseable_body_is_none() {
        assert!(parse_batch_response("[]").is_none());
        assert!(parse_batch_response("garbage").is_none());
    }

    #[test]
    fn status_mapping_is_deterministic() {
        assert_eq!(
            reason_for_status(StatusCode::FORBIDDEN),
            ReasonCode::ApiForbidden
        );
        assert_eq!(
            reason_for_status(StatusCode::TOO_MANY_REQUESTS),
            ReasonCode::ApiRateLimited
        );
        assert_eq!(
            reason_for_status(StatusCode::BAD_GATEWAY),
            ReasonCode::ApiServerError
        );
        assert_eq!(
            reason_for_status(StatusCode::NOT_FOUND),
            ReasonCode::ApiClientError
        );
    }
}
