//! Outbound calls shared by the geocoder and the stop sources.

use std::time::Duration;

use anyhow::{Context, Result};
use http::Method;
use http::header::{ACCEPT, USER_AGENT};
use realtime::{Config, Error, HttpRequest, bad_gateway};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client identifier sent with every outbound request.
pub const CLIENT_ID: &str = "transit-gateway/0.1 (+https://github.com/transit-gateway/transit-gateway)";

/// Issue a bounded `GET` and decode the JSON body.
///
/// Timeouts and non-2xx responses are reported as [`Error::BadGateway`];
/// undecodable bodies as [`Error::InvalidFormat`].
pub async fn get_json<T, P>(provider: &P, upstream: &str, url: &str, timeout: Duration) -> Result<T>
where
    T: DeserializeOwned,
    P: HttpRequest,
{
    let request = http::Request::builder()
        .method(Method::GET)
        .uri(url)
        .header(USER_AGENT, CLIENT_ID)
        .header(ACCEPT, "application/json")
        .body(Vec::new())
        .with_context(|| format!("building {upstream} request"))?;

    let response = tokio::time::timeout(timeout, HttpRequest::fetch(provider, request))
        .await
        .map_err(|elapsed| bad_gateway!("{upstream} did not answer within {timeout:?}: {elapsed}"))?
        .with_context(|| format!("calling {upstream}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(bad_gateway!("{upstream} returned {status}").into());
    }

    let body = response.into_body();
    let payload = serde_json::from_slice(&body)
        .map_err(Error::from)
        .with_context(|| format!("decoding {upstream} response"))?;
    Ok(payload)
}

/// Read a configuration value, falling back to `default` when it is unset.
pub async fn setting(provider: &impl Config, key: &str, default: &str) -> String {
    match Config::get(provider, key).await {
        Ok(value) if !value.trim().is_empty() => value.trim().trim_end_matches('/').to_string(),
        _ => {
            tracing::trace!("{key} not set, using default: {default}");
            default.to_string()
        }
    }
}

/// Read an optional configuration value; blank values count as unset.
pub async fn optional_setting(provider: &impl Config, key: &str) -> Option<String> {
    let value = Config::get(provider, key).await.ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Interpret a JSON number or numeric string as `f64`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a JSON string or number as an identifier.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
