//! Persistent HTTP context shared by every request of one run
//!
//! Cookies set by the portal and headers discovered along the handshake
//! (the CSRF token in particular) must accumulate across steps, so all
//! requests go through a single `PortalSession`.

use crate::config::PortalConfig;
use crate::error::PortalError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Redirect handling for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    /// Return 3xx responses as they are
    Manual,
    /// Follow redirects with the client's default limit
    Follow,
}

/// Cookie jar, header map and clients for one run
///
/// The three clients share the same cookie jar. Only `relaxed` accepts
/// invalid certificates and it is reachable solely through
/// [`PortalSession::probe_insecure`].
#[derive(Debug)]
pub struct PortalSession {
    jar: Arc<Jar>,
    headers: HeaderMap,
    direct: Client,
    following: Client,
    relaxed: Client,
}

impl PortalSession {
    /// Create a new session with an empty cookie jar and header map
    #[tracing::instrument(skip(config), fields(timeout_secs = config.timeout_secs))]
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let jar = Arc::new(Jar::default());

        let direct = build_client(&jar, config, Policy::none(), false)?;
        let following = build_client(&jar, config, Policy::default(), false)?;
        let relaxed = build_client(&jar, config, Policy::none(), true)?;

        Ok(Self {
            jar,
            headers: HeaderMap::new(),
            direct,
            following,
            relaxed,
        })
    }

    /// GET `url` with the session's cookies and headers
    pub async fn get(&self, url: &Url, redirects: Redirects) -> Result<Response, PortalError> {
        let client = match redirects {
            Redirects::Manual => &self.direct,
            Redirects::Follow => &self.following,
        };

        debug!(url = %url, ?redirects, "GET");
        self.send(client.get(url.clone()), url).await
    }

    /// POST an empty body to `url`, following redirects
    pub async fn post(&self, url: &Url) -> Result<Response, PortalError> {
        debug!(url = %url, "POST");
        self.send(self.following.post(url.clone()).body(""), url)
            .await
    }

    /// GET `url` without redirects and without certificate validation
    ///
    /// Reserved for the HTTPS connectivity probe, where a portal may answer
    /// with its own certificate.
    pub async fn probe_insecure(&self, url: &Url) -> Result<Response, PortalError> {
        debug!(url = %url, "GET (certificate validation relaxed)");
        self.send(self.relaxed.get(url.clone()), url).await
    }

    /// Set a header sent with every subsequent request
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), PortalError> {
        let value = HeaderValue::from_str(value).map_err(|e| PortalError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Current value of a session header
    pub fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Store a cookie for the origin of `url`, valid for every path
    pub fn set_cookie(&self, url: &Url, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{}={}; Path=/", name, value), url);
    }

    /// `Cookie` header the session would send to `url`
    pub fn cookies_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, PortalError> {
        request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| PortalError::network(url.as_str(), &e))
    }
}

fn build_client(
    jar: &Arc<Jar>,
    config: &PortalConfig,
    redirect: Policy,
    accept_invalid_certs: bool,
) -> Result<Client, PortalError> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .cookie_provider(Arc::clone(jar))
        .redirect(redirect)
        .timeout(config.timeout());

    for host_override in &config.resolve {
        // Port 0 keeps the port from the request URL
        builder = builder.resolve(&host_override.host, SocketAddr::new(host_override.addr, 0));
    }

    if accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(PortalError::Client)
}
