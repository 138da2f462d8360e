//! Throttling HTTP client.
//!
//! [`HttpClient`] owns one [`Session`] and exposes the request pipeline in
//! two flavors:
//!
//! - blocking ([`HttpClient::request`] and friends), which parks the calling
//!   thread for the full throttle delay, and
//! - concurrent ([`HttpClient::request_concurrent`] and friends), where the
//!   throttle wait and the wire call are true suspension points so other
//!   in-flight requests keep making progress.
//!
//! Both loop on [`Session::throttle`] until admitted, issue the wire call,
//! and record usage from the response.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use flatfetch_core::{HttpMethod, HttpRequest, HttpResponse};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ClientError;
use crate::session::Session;

/// Default wire-call timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for flatfetch.
const USER_AGENT: &str = concat!("flatfetch/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Builder
// ============================================================================

/// Configuration surface for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    weight_per_second: Option<f64>,
    timeout: Duration,
    user_agent: String,
    usage_header: Option<String>,
}

impl HttpClientBuilder {
    /// Creates a builder with default settings (no rate limit).
    pub fn new() -> Self {
        Self {
            weight_per_second: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            usage_header: None,
        }
    }

    /// Sets the rate target in weight units per second.
    #[must_use]
    pub fn weight_per_second(mut self, weight_per_second: f64) -> Self {
        self.weight_per_second = Some(weight_per_second);
        self
    }

    /// Sets the default wire-call timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the response header carrying server-advertised usage.
    #[must_use]
    pub fn usage_header(mut self, header: impl Into<String>) -> Self {
        self.usage_header = Some(header.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails fast on a non-positive rate target or an unbuildable transport.
    pub fn build(self) -> Result<HttpClient, ClientError> {
        let mut session = Session::new(self.weight_per_second)?;
        if let Some(header) = self.usage_header {
            session = session.with_usage_header(header);
        }

        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(HttpClient {
            session,
            inner,
            blocking: OnceLock::new(),
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client that throttles every request against a shared rate budget.
#[derive(Debug)]
pub struct HttpClient {
    session: Session,
    inner: reqwest::Client,
    // Created on first use so constructing a client inside an async runtime
    // never touches the blocking transport.
    blocking: OnceLock<reqwest::blocking::Client>,
    timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Creates a client with default settings (no rate limit).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the transport cannot be built.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Creates a client with the given rate target.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for a non-positive target.
    pub fn with_weight_per_second(weight_per_second: f64) -> Result<Self, ClientError> {
        Self::builder().weight_per_second(weight_per_second).build()
    }

    /// Returns a configuration builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// The rate-limiter session owned by this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    // ------------------------------------------------------------------------
    // Blocking pipeline
    // ------------------------------------------------------------------------

    /// Makes a blocking GET request.
    pub fn get(&self, url: impl Into<String>) -> Result<HttpResponse, ClientError> {
        self.request(&HttpRequest::get(url))
    }

    /// Makes a blocking POST request with a JSON body.
    pub fn post_json(
        &self,
        url: impl Into<String>,
        json: serde_json::Value,
    ) -> Result<HttpResponse, ClientError> {
        self.request(&HttpRequest::post(url).with_json(json))
    }

    /// Makes a blocking DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> Result<HttpResponse, ClientError> {
        self.request(&HttpRequest::delete(url))
    }

    /// Makes a blocking request.
    ///
    /// Loops on the throttle until admitted (parking the thread for each
    /// returned delay), issues the wire call, and records usage from the
    /// response.
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`ClientError::Http`]; any HTTP status
    /// is returned as a response, never an error.
    pub fn request(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut wait = self.session.throttle(request.weight());
        while !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Throttled, sleeping");
            std::thread::sleep(wait);
            wait = self.session.throttle(request.weight());
        }

        let response = self.dispatch_blocking(request)?;
        self.session.log_response(&response);
        Ok(response)
    }

    // ------------------------------------------------------------------------
    // Concurrent pipeline
    // ------------------------------------------------------------------------

    /// Makes a concurrent GET request.
    pub async fn get_concurrent(
        &self,
        url: impl Into<String>,
    ) -> Result<HttpResponse, ClientError> {
        self.request_concurrent(&HttpRequest::get(url)).await
    }

    /// Makes a concurrent POST request with a JSON body.
    pub async fn post_json_concurrent(
        &self,
        url: impl Into<String>,
        json: serde_json::Value,
    ) -> Result<HttpResponse, ClientError> {
        self.request_concurrent(&HttpRequest::post(url).with_json(json))
            .await
    }

    /// Makes a concurrent DELETE request.
    pub async fn delete_concurrent(
        &self,
        url: impl Into<String>,
    ) -> Result<HttpResponse, ClientError> {
        self.request_concurrent(&HttpRequest::delete(url)).await
    }

    /// Makes a concurrent request.
    ///
    /// Same contract as [`HttpClient::request`], but the throttle wait and
    /// the wire call suspend instead of blocking, so other tasks sharing
    /// this client keep running; the session lock is the only
    /// synchronization between them. A non-success status is logged as a
    /// warning and still returned; callers inspect the status explicitly.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn request_concurrent(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ClientError> {
        let mut wait = self.session.throttle(request.weight());
        while !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Throttled, yielding");
            tokio::time::sleep(wait).await;
            wait = self.session.throttle(request.weight());
        }

        let response = self.dispatch(request).await?;
        if !response.is_success() {
            warn!(status = response.status, url = %response.url, "Non-success response");
        }
        self.session.log_response(&response);
        Ok(response)
    }

    // ------------------------------------------------------------------------
    // Wire calls
    // ------------------------------------------------------------------------

    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        validate_url(request.url())?;
        debug!("Issuing request");

        let mut builder = self
            .inner
            .request(wire_method(request.method()), request.url());
        builder = apply_parts(builder, request);

        let response = builder.send().await?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;

        debug!(status, "Response received");
        Ok(HttpResponse::new(url, status, headers, body))
    }

    fn dispatch_blocking(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        validate_url(request.url())?;
        debug!(method = %request.method(), url = %request.url(), "Issuing blocking request");

        let mut builder = self
            .blocking_client()?
            .request(wire_method(request.method()), request.url());
        builder = apply_parts_blocking(builder, request);

        let response = builder.send()?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text()?;

        debug!(status, "Response received");
        Ok(HttpResponse::new(url, status, headers, body))
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, ClientError> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

// ============================================================================
// Request Assembly
// ============================================================================

fn validate_url(url: &str) -> Result<(), ClientError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| ClientError::InvalidRequest(format!("invalid URL {url}: {e}")))
}

fn wire_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

fn apply_parts(
    mut builder: reqwest::RequestBuilder,
    request: &HttpRequest,
) -> reqwest::RequestBuilder {
    if !request.params().is_empty() {
        builder = builder.query(request.params());
    }
    for (name, value) in request.headers() {
        builder = builder.header(name, value);
    }
    if !request.cookies().is_empty() {
        builder = builder.header(reqwest::header::COOKIE, cookie_header(request.cookies()));
    }
    if let Some(timeout) = request.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(body) = request.body() {
        builder = builder.body(body.to_string());
    }
    if let Some(json) = request.json() {
        builder = builder.json(json);
    }
    builder
}

fn apply_parts_blocking(
    mut builder: reqwest::blocking::RequestBuilder,
    request: &HttpRequest,
) -> reqwest::blocking::RequestBuilder {
    if !request.params().is_empty() {
        builder = builder.query(request.params());
    }
    for (name, value) in request.headers() {
        builder = builder.header(name, value);
    }
    if !request.cookies().is_empty() {
        builder = builder.header(reqwest::header::COOKIE, cookie_header(request.cookies()));
    }
    if let Some(timeout) = request.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(body) = request.body() {
        builder = builder.body(body.to_string());
    }
    if let Some(json) = request.json() {
        builder = builder.json(json);
    }
    builder
}

// ============================================================================
// Tests
// ============================================================================
