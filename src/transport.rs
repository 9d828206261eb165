//! Signed HTTP transport shared by every resource façade and by [`Page`](crate::Page).
//!
//! Each call performs exactly one request against the configured base endpoint,
//! layering caller query values over the client credentials and caller headers
//! over the `Bankin-Version` header.

use crate::error::{BankinError, TransportError};
use chrono::NaiveDate;
use log::{debug, info};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, Method, Request, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "https://sync.bankin.com/v2";
pub const DEFAULT_VERSION: &str = "2016-01-18";
pub const VERSION_HEADER: &str = "Bankin-Version";

const REDACTED_PARAMS: [&str; 5] = [
    "client_secret",
    "password",
    "current_password",
    "new_password",
    "access_token",
];

// Characters that would end, split or corrupt a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Extra headers for a single call. Names are matched case-insensitively when merged.
pub type Headers = BTreeMap<String, String>;

/// Client credentials and API version, fixed for the lifetime of a [`Transport`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    version: String,
}

impl Credentials {
    /// Credentials pinned to [`DEFAULT_VERSION`].
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Pin a different API version. Versions are dates formatted `YYYY-MM-DD`.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self, BankinError> {
        let version = version.into();
        let valid = version.len() == 10 && NaiveDate::parse_from_str(&version, "%Y-%m-%d").is_ok();
        if !valid {
            return Err(BankinError::InvalidVersion(version));
        }
        self.version = version;
        Ok(self)
    }

    /// Read `BANKIN_CLIENT_ID`, `BANKIN_CLIENT_SECRET` and the optional `BANKIN_VERSION`.
    pub fn from_env() -> Result<Self, BankinError> {
        let client_id = env::var("BANKIN_CLIENT_ID")
            .map_err(|_| BankinError::InvalidParameter("BANKIN_CLIENT_ID is not set"))?;
        let client_secret = env::var("BANKIN_CLIENT_SECRET")
            .map_err(|_| BankinError::InvalidParameter("BANKIN_CLIENT_SECRET is not set"))?;
        let credentials = Self::new(client_id, client_secret);
        match env::var("BANKIN_VERSION") {
            Ok(version) => credentials.with_version(version),
            Err(_) => Ok(credentials),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}

/// Query parameters for a single call.
///
/// A `None` value stands for an unset parameter: it is dropped before the URL is
/// built and never overrides a credential default. Every other value, including
/// `0`, `""` and `false`, is sent verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, Option<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), Some(value.to_string()));
        self
    }

    pub fn opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params.insert(key.into(), value.map(|v| v.to_string()));
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        self.params.insert(key.into(), value);
    }

    /// Value of a set parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set parameters in key order; unset ones are skipped.
    pub fn defined(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.params
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.defined().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |query, (k, v)| query.param(k, v))
    }
}

/// Method, API-relative path, query and headers of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub headers: Headers,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::new(),
            headers: Headers::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach `Authorization: Bearer <token>`, replacing any authorization header
    /// already set under a different case.
    pub fn bearer(mut self, token: &str) -> Self {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
        self.header("Authorization", format!("Bearer {token}"))
    }
}

/// What the transport reports to an observer. URLs have secrets redacted.
#[derive(Debug)]
pub enum TransportEvent<'a> {
    Sending {
        method: &'a Method,
        url: &'a str,
    },
    Received {
        method: &'a Method,
        url: &'a str,
        status: StatusCode,
    },
    Failed {
        method: &'a Method,
        url: &'a str,
        error: &'a reqwest::Error,
    },
}

type Observer = Arc<dyn Fn(&TransportEvent<'_>) + Send + Sync>;

/// Performs signed requests against the API. Cheap to clone; clones share the
/// connection pool and credentials.
#[derive(Clone)]
pub struct Transport {
    http: HttpClient,
    credentials: Arc<Credentials>,
    base_url: Url,
    observer: Option<Observer>,
}

impl Transport {
    pub fn new(credentials: Credentials) -> Result<Self, BankinError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        let base_url = parse_base_url(BASE_URL)?;

        info!(
            "Initialized Bankin transport for client {} (version {})",
            credentials.client_id, credentials.version
        );
        Ok(Self {
            http,
            credentials: Arc::new(credentials),
            base_url,
            observer: None,
        })
    }

    /// Pin a different API version on this transport.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self, BankinError> {
        let credentials = Credentials::clone(&self.credentials).with_version(version)?;
        info!("Pinned Bankin API version {}", credentials.version);
        self.credentials = Arc::new(credentials);
        Ok(self)
    }

    /// Override the base endpoint (useful for tests or proxies). Its path becomes
    /// the version prefix stripped from cursor URIs.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, BankinError> {
        self.base_url = parse_base_url(base_url)?;
        info!("Updated Bankin base URL to {}", self.endpoint());
        Ok(self)
    }

    /// Register a callback notified around every request.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&TransportEvent<'_>) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        self.observer = Some(observer);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Leading path shared by the base endpoint and every cursor URI, e.g. `/v2`.
    pub fn path_prefix(&self) -> &str {
        self.base_url.path().trim_end_matches('/')
    }

    pub async fn get(
        &self,
        path: &str,
        query: Query,
        headers: Headers,
    ) -> Result<Value, BankinError> {
        self.send(
            RequestDescriptor::get(path)
                .with_query(query)
                .with_headers(headers),
        )
        .await
    }

    pub async fn post(
        &self,
        path: &str,
        query: Query,
        headers: Headers,
    ) -> Result<Value, BankinError> {
        self.send(
            RequestDescriptor::post(path)
                .with_query(query)
                .with_headers(headers),
        )
        .await
    }

    pub async fn put(
        &self,
        path: &str,
        query: Query,
        headers: Headers,
    ) -> Result<Value, BankinError> {
        self.send(
            RequestDescriptor::put(path)
                .with_query(query)
                .with_headers(headers),
        )
        .await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: Query,
        headers: Headers,
    ) -> Result<Value, BankinError> {
        self.send(
            RequestDescriptor::delete(path)
                .with_query(query)
                .with_headers(headers),
        )
        .await
    }

    /// Send one request and return its parsed JSON body. An empty body parses as `null`.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Value, BankinError> {
        let request = self.build_request(&descriptor)?;
        let method = request.method().clone();
        let url = redact(request.url());

        debug!("{} request to {}", method, url);
        self.notify(&TransportEvent::Sending {
            method: &method,
            url: &url,
        });

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                // reqwest errors carry the full request URL, secret included.
                let error = error.without_url();
                self.notify(&TransportEvent::Failed {
                    method: &method,
                    url: &url,
                    error: &error,
                });
                return Err(BankinError::Network(error));
            }
        };

        let status = response.status();
        debug!("Received status {}", status);
        self.notify(&TransportEvent::Received {
            method: &method,
            url: &url,
            status,
        });

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        if !status.is_success() {
            return Err(TransportError { status, body }.into());
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Build the outgoing request without sending it.
    pub fn build_request(&self, descriptor: &RequestDescriptor) -> Result<Request, BankinError> {
        let mut url = self.endpoint_url(&descriptor.path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.merged_query(&descriptor.query) {
                pairs.append_pair(&key, &value);
            }
        }
        let headers = self.merged_headers(&descriptor.headers)?;
        let request = self
            .http
            .request(descriptor.method.clone(), url)
            .headers(headers)
            .build()?;
        Ok(request)
    }

    /// Absolute URL carrying `client_id` and the given parameters, without the
    /// client secret. Used for links handed to a browser.
    pub fn url_with_query(&self, path: &str, query: &Query) -> Result<Url, BankinError> {
        let mut url = self.endpoint_url(path)?;
        let mut params = BTreeMap::new();
        params.insert("client_id".to_string(), self.credentials.client_id.clone());
        for (key, value) in query.defined() {
            params.insert(key.to_string(), value.to_string());
        }
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    fn endpoint(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, BankinError> {
        if !path.starts_with('/') {
            return Err(BankinError::InvalidParameter("path must start with '/'"));
        }
        Url::parse(&format!("{}{}", self.endpoint(), path))
            .map_err(|_| BankinError::InvalidParameter("path is not a valid url path"))
    }

    fn merged_query(&self, query: &Query) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        merged.insert("client_id".to_string(), self.credentials.client_id.clone());
        merged.insert(
            "client_secret".to_string(),
            self.credentials.client_secret.clone(),
        );
        for (key, value) in query.defined() {
            merged.insert(key.to_string(), value.to_string());
        }
        merged
    }

    fn merged_headers(&self, headers: &Headers) -> Result<HeaderMap, BankinError> {
        let mut merged = HeaderMap::new();
        merged.insert(
            HeaderName::from_static("bankin-version"),
            header_value(&self.credentials.version)?,
        );
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| BankinError::InvalidHeader(name.clone()))?;
            merged.insert(name, header_value(value)?);
        }
        Ok(merged)
    }

    fn notify(&self, event: &TransportEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url.as_str())
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BankinError> {
    let url = Url::parse(raw).map_err(|e| BankinError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
        return Err(BankinError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

fn header_value(value: &str) -> Result<HeaderValue, BankinError> {
    HeaderValue::from_str(value).map_err(|_| BankinError::InvalidHeader(value.to_string()))
}

/// Percent-encode one caller-supplied path segment. Empty and dot segments are
/// rejected since they would resolve to a different endpoint.
pub(crate) fn path_segment(value: &str) -> Result<String, BankinError> {
    if matches!(value, "" | "." | "..") {
        return Err(BankinError::InvalidParameter(
            "path segment must not be empty or a dot segment",
        ));
    }
    Ok(utf8_percent_encode(value, PATH_SEGMENT).to_string())
}

/// Render a URL with secret-bearing query values replaced.
pub(crate) fn redact(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if REDACTED_PARAMS.contains(&k.as_ref()) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
