//! Shared HTTP transport for remote API families
//!
//! Request signing is the caller's concern: hand in a `reqwest::Client`
//! built with whatever authentication middleware or default headers the
//! service needs.

use crate::client::{RemoteError, RemoteResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Error body returned by the management APIs
#[derive(Debug, Deserialize)]
struct ApiProblem {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Base URL extended with `segments`, each percent-encoded as one path
    /// segment. Use this when a segment comes from user data.
    pub fn segment_url(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RemoteError::Rejected(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::Rejected(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        response.json().await.map_err(transport_error)
    }

    pub async fn send_text(&self, request: RequestBuilder) -> RemoteResult<String> {
        let response = self.send(request).await?;
        response.text().await.map_err(transport_error)
    }

    pub async fn send_empty(&self, request: RequestBuilder) -> RemoteResult<()> {
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }
}

/// Map an HTTP error status to the remote error kind.
///
/// 404 is not-found; 408, 429 and 5xx may succeed later; every other status
/// is a permanent rejection.
pub fn classify(status: StatusCode, body: &str) -> RemoteError {
    let message = error_message(status, body);
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            RemoteError::Transient(message)
        }
        s if s.is_server_error() => RemoteError::Transient(message),
        _ => RemoteError::Rejected(message),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(problem) = serde_json::from_str::<ApiProblem>(body) {
        match (problem.title, problem.detail) {
            (Some(title), Some(detail)) => return format!("{}: {}: {}", status, title, detail),
            (Some(text), None) | (None, Some(text)) => return format!("{}: {}", status, text),
            (None, None) => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_decode() {
        RemoteError::Rejected(format!("invalid response body: {}", error))
    } else {
        RemoteError::Transient(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = classify(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert_eq!(err.message(), "404 Not Found");
    }

    #[test]
    fn test_classify_transient() {
        for status in [
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(classify(status, "").is_transient(), "{status}");
        }
    }

    #[test]
    fn test_classify_rejected() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::CONFLICT,
        ] {
            assert!(
                matches!(classify(status, ""), RemoteError::Rejected(_)),
                "{status}"
            );
        }
    }

    #[test]
    fn test_problem_body_message() {
        let body = r#"{"type": "/errors/bad-request", "title": "Bad Request", "detail": "region is invalid", "status": 400}"#;
        let err = classify(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.message(), "400 Bad Request: Bad Request: region is invalid");
    }

    #[test]
    fn test_plain_body_message() {
        let err = classify(StatusCode::FORBIDDEN, "  not allowed\n");
        assert_eq!(err.message(), "403 Forbidden: not allowed");
    }

    #[test]
    fn test_url_joins_path() {
        let api = ApiClient::new(reqwest::Client::new(), "https://example.com/imaging/v2/");
        assert_eq!(
            api.url("/policysets/abc"),
            "https://example.com/imaging/v2/policysets/abc"
        );
    }

    #[test]
    fn test_segment_url_encodes_each_segment() {
        let api = ApiClient::new(reqwest::Client::new(), "https://example.com/edgekv/");
        let url = api.segment_url(&["items", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/edgekv/items/a%2Fb%3Fc%23d");

        let api = ApiClient::new(reqwest::Client::new(), "https://example.com");
        let url = api.segment_url(&["v1", "x y"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/x%20y");
    }

    #[test]
    fn test_segment_url_rejects_invalid_base() {
        let api = ApiClient::new(reqwest::Client::new(), "not a url");
        assert!(matches!(
            api.segment_url(&["items"]),
            Err(RemoteError::Rejected(_))
        ));
    }
}
