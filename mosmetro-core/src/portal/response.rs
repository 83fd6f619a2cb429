//! Owned snapshot of an HTTP response
//!
//! A `reqwest::Response` can only be read once and borrows the connection,
//! so probe verdicts and provider matching work on this detached copy.

use crate::error::PortalError;
use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use reqwest::StatusCode;
use url::Url;

/// Longest body excerpt kept for diagnostics, in characters
const BODY_EXCERPT_CHARS: usize = 512;

/// Bytes that always hold `BODY_EXCERPT_CHARS` complete UTF-8 characters
const BODY_EXCERPT_BYTES: usize = BODY_EXCERPT_CHARS * 4;

/// Status line, headers and an optional body excerpt of a response
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<String>,
}

impl CapturedResponse {
    /// Create a snapshot from parts
    pub fn new(url: Url, status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            url,
            status,
            headers,
            body: None,
        }
    }

    /// Create a `302 Found` snapshot redirecting from `url` to `location`
    pub fn redirect(url: Url, location: &str) -> Result<Self, PortalError> {
        let value = HeaderValue::from_str(location).map_err(|e| PortalError::InvalidRedirect {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, value);
        Ok(Self::new(url, StatusCode::FOUND, headers))
    }

    /// Detach a live response, optionally keeping the start of its body
    pub async fn capture(mut response: reqwest::Response, keep_body: bool) -> Self {
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        let body = if keep_body {
            read_excerpt(&mut response).await
        } else {
            None
        };

        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// URL the response was received from
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Start of the response body, when it was kept
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Raw `Location` header value
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// A 3xx status together with a `Location` header
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection() && self.location().is_some()
    }

    /// Absolute redirect target, with relative locations resolved against
    /// the URL the response came from
    pub fn redirect_target(&self) -> Result<Url, PortalError> {
        let location = self.location().ok_or(PortalError::MissingLocation {
            status: self.status.as_u16(),
        })?;

        self.url
            .join(location)
            .map_err(|e| PortalError::InvalidRedirect {
                location: location.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Read the body chunk by chunk, stopping once the excerpt is full
async fn read_excerpt(response: &mut reqwest::Response) -> Option<String> {
    let mut buffer = Vec::new();

    while buffer.len() < BODY_EXCERPT_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => buffer.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(_) => return None,
        }
    }

    Some(
        String::from_utf8_lossy(&buffer)
            .chars()
            .take(BODY_EXCERPT_CHARS)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_url() -> Url {
        Url::parse("http://google.com/generate_204").unwrap()
    }

    #[test]
    fn test_redirect_snapshot() {
        let response =
            CapturedResponse::redirect(probe_url(), "https://portal.wi-fi.ru/auth?segment=metro")
                .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.is_redirect());
        assert_eq!(
            response.location(),
            Some("https://portal.wi-fi.ru/auth?segment=metro")
        );
    }

    #[test]
    fn test_relative_location_is_resolved() {
        let response = CapturedResponse::redirect(probe_url(), "/login").unwrap();
        let target = response.redirect_target().unwrap();
        assert_eq!(target.as_str(), "http://google.com/login");
    }

    #[test]
    fn test_redirect_without_location() {
        let response = CapturedResponse::new(probe_url(), StatusCode::FOUND, HeaderMap::new());
        assert!(!response.is_redirect());
        assert!(matches!(
            response.redirect_target(),
            Err(PortalError::MissingLocation { status: 302 })
        ));
    }

    #[test]
    fn test_non_redirect_status_with_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://portal.wi-fi.ru/"));
        let response = CapturedResponse::new(probe_url(), StatusCode::OK, headers);
        assert!(!response.is_redirect());
    }
}
