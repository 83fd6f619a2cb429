//! Handshake for the wi-fi.ru public Wi-Fi portal family (second generation)
//!
//! The portal intercepts the probe with a redirect to its own host. Login is
//! a linear sequence over one cookie-carrying session:
//!
//! 1. parse the redirect and pick the `segment` routing value
//! 2. stop if the redirect asks for device registration
//! 3. follow the redirect once, manually, and stop on a temporary ban
//! 4. load the authentication page at `/auth?segment=...`
//! 5. scrape the CSRF token from its `<meta name="csrf-token">` element
//! 6. mark the advertisement video as passed with a cookie
//! 7. POST `/auth/init?mode=0&segment=...`
//! 8. re-run the connectivity probe
//!
//! Any failure ends the attempt. Replaying half a handshake can get the
//! device banned, so nothing is retried.

use crate::error::PortalError;
use crate::portal::probe::ConnectivityProbe;
use crate::portal::provider::Handshake;
use crate::portal::registry::ProviderDescriptor;
use crate::portal::response::CapturedResponse;
use crate::portal::session::{PortalSession, Redirects};
use crate::types::CsrfToken;
use async_trait::async_trait;
use reqwest::header::{HeaderName, LOCATION};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Segment used when the redirect carries none
pub const DEFAULT_SEGMENT: &str = "metro";

/// Header the portal expects the CSRF token in
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Cookie marking the advertisement video step as done
pub const VIDEO_PASSED_COOKIE: &str = "afVideoPassed";

/// Portal host suffix shared by the whole family
const PORTAL_DOMAIN: &str = ".wi-fi.ru";

/// Sibling host the portal redirects to once a device is already logged in
const LOGIN_HOST: &str = "login.wi-fi.ru";

/// Redirect path marker for unregistered devices
const REGISTRATION_MARKER: &str = "identification";

/// Redirect target marker for temporarily banned devices
const BAN_MARKER: &str = "auto_auth";

/// Handshake bound to the redirect that identified the portal
#[derive(Debug)]
pub struct MosMetroV2 {
    redirect: CapturedResponse,
}

impl MosMetroV2 {
    pub const NAME: &'static str = "MosMetroV2";

    pub fn new(redirect: CapturedResponse) -> Self {
        Self { redirect }
    }

    /// Registry entry for this provider
    pub fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor {
            name: Self::NAME,
            matches: Self::matches,
            build: Self::build,
        }
    }

    /// Whether a redirect points into this portal family
    pub fn matches(response: &CapturedResponse) -> bool {
        response.location().is_some_and(|location| {
            location.contains(PORTAL_DOMAIN) && !location.contains(LOGIN_HOST)
        })
    }

    fn build(redirect: CapturedResponse) -> Box<dyn Handshake> {
        Box::new(Self::new(redirect))
    }
}

#[async_trait]
impl Handshake for MosMetroV2 {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[tracing::instrument(skip_all, fields(provider = "MosMetroV2"))]
    async fn connect(
        &mut self,
        session: &mut PortalSession,
        probe: &ConnectivityProbe,
    ) -> Result<bool, PortalError> {
        info!("Parsing initial redirect");
        let redirect = self.redirect.redirect_target()?;
        let segment = segment_of(&redirect);
        debug!(redirect = %redirect, segment = %segment, "Parsed redirect");

        if redirect.path().contains(REGISTRATION_MARKER) {
            return Err(PortalError::RegistrationRequired {
                url: redirect.to_string(),
            });
        }

        info!("Following initial redirect");
        let response = session.get(&redirect, Redirects::Manual).await?;
        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();

            if location.contains(BAN_MARKER) {
                return Err(PortalError::TemporaryBan {
                    location: location.to_string(),
                });
            }
        }

        info!("Following JavaScript redirect");
        let auth = portal_url(&redirect, "/auth", &[("segment", segment.as_str())])?;
        let response = session.get(&auth, Redirects::Follow).await?;
        let page = response
            .text()
            .await
            .map_err(|e| PortalError::network(auth.as_str(), &e))?;

        match extract_csrf_token(&page) {
            Some(token) => match session.set_header(CSRF_HEADER, token.expose()) {
                Ok(()) => debug!("Found CSRF token"),
                Err(e) => warn!(
                    "CSRF token ignored, the portal will likely reject the login: {}",
                    e
                ),
            },
            None => warn!("CSRF token not found, the portal will likely reject the login"),
        }

        session.set_cookie(&auth, VIDEO_PASSED_COOKIE, "0");

        info!("Sending auth request");
        let init = portal_url(
            &redirect,
            "/auth/init",
            &[("mode", "0"), ("segment", segment.as_str())],
        )?;
        let response = session.post(&init).await?;
        debug!(status = %response.status(), "Auth request answered");

        info!("Checking internet connection");
        Ok(probe.check(session).await.is_connected())
    }
}

/// `segment` query value of the redirect, or the default when absent or blank
pub fn segment_of(redirect: &Url) -> String {
    redirect
        .query_pairs()
        .find(|(key, _)| key == "segment")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_SEGMENT.to_string())
}

/// Content of the first `<meta name="csrf-token">` element
pub fn extract_csrf_token(html: &str) -> Option<CsrfToken> {
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .find_map(|element| element.value().attr("content"))
        .map(|content| CsrfToken::new(content.to_string()))
}

/// Absolute URL on the redirect's origin with the given path and query
fn portal_url(redirect: &Url, path: &str, query: &[(&str, &str)]) -> Result<Url, PortalError> {
    let mut url = redirect
        .join(path)
        .map_err(|e| PortalError::InvalidRedirect {
            location: redirect.to_string(),
            reason: e.to_string(),
        })?;

    url.set_fragment(None);
    url.query_pairs_mut().clear().extend_pairs(query.iter().copied());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect_to(location: &str) -> CapturedResponse {
        let probe = Url::parse("http://google.com/generate_204").unwrap();
        CapturedResponse::redirect(probe, location).unwrap()
    }

    #[test]
    fn test_matches_portal_family() {
        assert!(MosMetroV2::matches(&redirect_to(
            "https://auth.wi-fi.ru/?segment=metro"
        )));
        assert!(MosMetroV2::matches(&redirect_to(
            "http://portal.wi-fi.ru/identification"
        )));
    }

    #[test]
    fn test_rejects_login_host_and_foreign_domains() {
        assert!(!MosMetroV2::matches(&redirect_to(
            "https://login.wi-fi.ru/am/UI/Login"
        )));
        assert!(!MosMetroV2::matches(&redirect_to("https://wi-fi.ru.example.com/")));
        assert!(!MosMetroV2::matches(&redirect_to("https://hotspot.example.com/")));
    }

    #[test]
    fn test_match_is_pure() {
        let known = redirect_to("https://auth.wi-fi.ru/auth");
        let unknown = redirect_to("https://hotspot.example.com/");
        for _ in 0..3 {
            assert!(MosMetroV2::matches(&known));
            assert!(!MosMetroV2::matches(&unknown));
        }
    }

    #[test]
    fn test_segment_extraction() {
        let url = Url::parse("https://auth.wi-fi.ru/auth?segment=foo").unwrap();
        assert_eq!(segment_of(&url), "foo");

        let url = Url::parse("https://auth.wi-fi.ru/auth?mode=1").unwrap();
        assert_eq!(segment_of(&url), DEFAULT_SEGMENT);

        let url = Url::parse("https://auth.wi-fi.ru/auth?segment=").unwrap();
        assert_eq!(segment_of(&url), DEFAULT_SEGMENT);
    }

    #[test]
    fn test_extract_csrf_token() {
        let html = r#"<html><head>
            <meta name="viewport" content="width=device-width">
            <meta name="csrf-token" content="abc123==">
        </head><body></body></html>"#;

        let token = extract_csrf_token(html).unwrap();
        assert_eq!(token.expose(), "abc123==");
    }

    #[test]
    fn test_extract_csrf_token_missing() {
        assert!(extract_csrf_token("<html><head></head></html>").is_none());
        assert!(extract_csrf_token(r#"<meta name="csrf-token">"#).is_none());
    }

    #[test]
    fn test_portal_urls_use_redirect_origin() {
        let redirect =
            Url::parse("https://auth.wi-fi.ru:8443/some/page?segment=metro#top").unwrap();

        let auth = portal_url(&redirect, "/auth", &[("segment", "metro")]).unwrap();
        assert_eq!(auth.as_str(), "https://auth.wi-fi.ru:8443/auth?segment=metro");

        let init =
            portal_url(&redirect, "/auth/init", &[("mode", "0"), ("segment", "bus")]).unwrap();
        assert_eq!(
            init.as_str(),
            "https://auth.wi-fi.ru:8443/auth/init?mode=0&segment=bus"
        );
    }
}
