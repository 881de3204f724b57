//! HTTP clients for the external services the shelter finder talks to
//!
//! All clients share one [`HttpClient`]: a `reqwest` client wrapped in
//! retry middleware with exponential backoff for transient failures.
//! Only GETs are retried; a POST that reached the server before timing out
//! must not be sent a second time.

pub mod directory;
pub mod news;
pub mod places;
#[cfg(test)]
pub(crate) mod test_server;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::{ErrorCode, ShelterFinderError};

pub use directory::{DirectoryClient, ShelterDirectory};
pub use news::NewsClient;
pub use places::{PlaceLookup, PlacesClient};

/// Responses slower than this are logged as warnings
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Longest response body excerpt kept in error context
const BODY_EXCERPT_LEN: usize = 200;

/// Shared HTTP client with retries
#[derive(Clone)]
pub struct HttpClient {
    client: ClientWithMiddleware,
    /// Same connection pool, no retry layer
    single_shot: ClientWithMiddleware,
}

impl HttpClient {
    /// Create a client with the given timeout and retry budget
    pub fn new(timeout_seconds: u32, max_retries: u32) -> crate::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.into()))
            .user_agent(concat!("ShelterFinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ShelterFinderError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let single_shot = ClientBuilder::new(inner.clone()).build();
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            single_shot,
        })
    }

    /// GET a URL
    #[instrument(skip(self, url), fields(url = %redact(url)))]
    pub async fn get(&self, url: &str) -> crate::Result<Response> {
        let start = Instant::now();
        let result = self.client.get(url).send().await;
        log_outcome(url, start, result)
    }

    /// POST a JSON body to a URL, without retries
    #[instrument(skip(self, url, body), fields(url = %redact(url)))]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> crate::Result<Response> {
        let payload = serde_json::to_vec(body).map_err(|e| {
            ShelterFinderError::general(format!("Failed to encode request body: {e}"))
        })?;

        let start = Instant::now();
        let result = self
            .single_shot
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await;
        log_outcome(url, start, result)
    }
}

fn log_outcome(
    url: &str,
    start: Instant,
    result: Result<Response, reqwest_middleware::Error>,
) -> crate::Result<Response> {
    let elapsed = start.elapsed();
    match result {
        Ok(response) => {
            debug!(
                "HTTP response received: {} in {:.3}s",
                response.status(),
                elapsed.as_secs_f64()
            );
            if elapsed > SLOW_RESPONSE {
                warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
            }
            Ok(response)
        }
        Err(e) => {
            warn!("Network error after {:.3}s: {}", elapsed.as_secs_f64(), e);
            Err(ShelterFinderError::api_with_context(
                format!("Network error: {e}"),
                ErrorCode::ApiNetworkError,
                HashMap::from([("url".to_string(), redact(url).to_string())]),
            ))
        }
    }
}

/// Map a status code onto an error code
#[must_use]
pub fn classify_status(status: StatusCode) -> ErrorCode {
    match status.as_u16() {
        401 | 403 => ErrorCode::ApiUnauthorized,
        404 => ErrorCode::ApiNotFound,
        429 => ErrorCode::ApiRateLimit,
        _ => ErrorCode::ApiNetworkError,
    }
}

/// Pass successful responses through, turn everything else into an API error
pub async fn error_for_status(response: Response, service: &str) -> crate::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, service, &body))
}

pub(crate) fn status_error(status: StatusCode, service: &str, body: &str) -> ShelterFinderError {
    let code = classify_status(status);
    warn!("{} request failed: {} ({})", service, status, code);

    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    ShelterFinderError::api_with_context(
        format!(
            "{service} request failed with status: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        ),
        code,
        HashMap::from([
            ("status_code".to_string(), status.as_u16().to_string()),
            ("body".to_string(), excerpt),
        ]),
    )
}

/// Decode a JSON body
pub async fn decode<T: DeserializeOwned>(response: Response, service: &str) -> crate::Result<T> {
    let start = Instant::now();
    let value = response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {} response: {}", service, e);
        ShelterFinderError::api_with_context(
            format!("Invalid data received from {service}"),
            ErrorCode::ApiInvalidResponse,
            HashMap::from([("error".to_string(), e.to_string())]),
        )
    })?;
    info!(
        "Decoded {} response in {:.3}s",
        service,
        start.elapsed().as_secs_f64()
    );
    Ok(value)
}

/// Strip API keys from a URL before it is logged
#[must_use]
pub fn redact(url: &str) -> &str {
    ["key=", "apiKey="]
        .iter()
        .filter_map(|marker| url.find(marker))
        .min()
        .map_or(url, |idx| &url[..idx])
}

/// Join a base URL and a relative path with exactly one slash
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, ErrorCode::ApiUnauthorized)]
    #[case(403, ErrorCode::ApiUnauthorized)]
    #[case(404, ErrorCode::ApiNotFound)]
    #[case(429, ErrorCode::ApiRateLimit)]
    #[case(500, ErrorCode::ApiNetworkError)]
    #[case(503, ErrorCode::ApiNetworkError)]
    fn test_classify_status(#[case] status: u16, #[case] expected: ErrorCode) {
        let status = StatusCode::from_u16(status).unwrap();
        assert_eq!(classify_status(status), expected);
    }

    #[test]
    fn test_status_error_carries_context() {
        let err = status_error(StatusCode::NOT_FOUND, "Shelter directory", "missing");
        assert_eq!(err.code(), Some(ErrorCode::ApiNotFound));
        assert!(err.to_string().contains("404 - Not Found"));
        match err {
            ShelterFinderError::Api { context, .. } => {
                assert_eq!(context["status_code"], "404");
                assert_eq!(context["body"], "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case(
        "https://maps.example/details/json?place_id=abc&key=SECRET",
        "https://maps.example/details/json?place_id=abc&"
    )]
    #[case(
        "https://news.example/v2/everything?q=storm&apiKey=SECRET",
        "https://news.example/v2/everything?q=storm&"
    )]
    #[case("http://localhost:8000/api/fetch-shelters/", "http://localhost:8000/api/fetch-shelters/")]
    fn test_redact(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(redact(url), expected);
    }

    #[rstest]
    #[case("http://localhost:8000/api", "fetch-shelters/")]
    #[case("http://localhost:8000/api/", "fetch-shelters/")]
    #[case("http://localhost:8000/api/", "/fetch-shelters/")]
    fn test_join_url(#[case] base: &str, #[case] path: &str) {
        assert_eq!(
            join_url(base, path),
            "http://localhost:8000/api/fetch-shelters/"
        );
    }

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new(30, 3).is_ok());
    }

    #[tokio::test]
    async fn test_get_retries_transient_failures() {
        let server = test_server::serve(vec![(503, ""), (200, r#"{"ok": true}"#)]).await;
        let http = HttpClient::new(5, 1).unwrap();

        let response = http.get(&join_url(&server.base_url, "ping/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_post_is_sent_once() {
        let server = test_server::serve(vec![(503, "")]).await;
        let http = HttpClient::new(5, 3).unwrap();

        let response = http
            .post_json(&join_url(&server.base_url, "ping/"), &serde_json::json!({"n": 1}))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].body, r#"{"n":1}"#);
    }
}
