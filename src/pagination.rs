//! Cursor pagination over list endpoints.
//!
//! A list response looks like
//! `{ "resources": [...], "pagination": { "next_uri": ..., "previous_uri": ... } }`.
//! The cursor URIs point back into the API under its version prefix (`/v2/...`);
//! [`Page::next`] and [`Page::previous`] strip that prefix and reissue the request
//! through the same [`Transport`], so a page never needs outside state to advance.

use crate::error::BankinError;
use crate::transport::{Query, RequestDescriptor, Transport};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 500;

/// Cursor options accepted by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Cursor pointing to the end of the desired set.
    pub before: Option<String>,
    /// Cursor pointing to the start of the desired set.
    pub after: Option<String>,
    /// Number of records to return, 1 to 500.
    pub limit: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn to_query(&self) -> Result<Query, BankinError> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(BankinError::InvalidParameter("limit must be between 1 and 500"));
        }
        Ok(Query::new()
            .opt("before", self.before.as_deref())
            .opt("after", self.after.as_deref())
            .param("limit", self.limit))
    }
}

/// Pagination envelope of a list response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "non_empty")]
    pub next_uri: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub previous_uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

#[derive(Debug, Deserialize)]
struct PageDocument {
    #[serde(default)]
    resources: Option<Vec<Value>>,
    #[serde(default)]
    pagination: Option<Pagination>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

impl Direction {
    fn uri(self, pagination: &Pagination) -> Option<&str> {
        match self {
            Direction::Next => pagination.next_uri.as_deref(),
            Direction::Previous => pagination.previous_uri.as_deref(),
        }
    }

    fn missing(self) -> BankinError {
        match self {
            Direction::Next => BankinError::NoNextPage,
            Direction::Previous => BankinError::NoPreviousPage,
        }
    }
}

/// One page of a list result. Immutable: traversal returns new pages.
#[derive(Clone)]
pub struct Page {
    transport: Transport,
    resources: Vec<Value>,
    pagination: Pagination,
    extra: Map<String, Value>,
    bearer_token: Option<String>,
}

impl Page {
    /// Wrap a raw list response. `bearer_token` is forwarded on every page fetched from here.
    pub fn new(
        transport: Transport,
        document: Value,
        bearer_token: Option<String>,
    ) -> Result<Self, BankinError> {
        let document: PageDocument = serde_json::from_value(document)?;
        let page = Self {
            transport,
            resources: document.resources.unwrap_or_default(),
            pagination: document.pagination.unwrap_or_default(),
            extra: document.extra,
            bearer_token,
        };
        debug!(
            "Wrapped page with {} resources (next: {}, previous: {})",
            page.resources.len(),
            page.has_next(),
            page.has_previous()
        );
        Ok(page)
    }

    pub fn resources(&self) -> &[Value] {
        &self.resources
    }

    pub fn into_resources(self) -> Vec<Value> {
        self.resources
    }

    /// Decode every resource into `T`.
    pub fn resources_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, BankinError> {
        self.resources
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(BankinError::from)
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Top-level response fields other than `resources` and `pagination`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.pagination.next_uri.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.pagination.previous_uri.is_some()
    }

    /// Request that [`Page::next`] would send.
    pub fn next_request(&self) -> Result<RequestDescriptor, BankinError> {
        self.cursor_request(Direction::Next)
    }

    /// Request that [`Page::previous`] would send.
    pub fn previous_request(&self) -> Result<RequestDescriptor, BankinError> {
        self.cursor_request(Direction::Previous)
    }

    /// Fetch the following page. Fails with [`BankinError::NoNextPage`] without
    /// touching the network when there is none.
    pub async fn next(&self) -> Result<Page, BankinError> {
        self.follow(Direction::Next).await
    }

    /// Fetch the preceding page. Fails with [`BankinError::NoPreviousPage`] without
    /// touching the network when there is none.
    pub async fn previous(&self) -> Result<Page, BankinError> {
        self.follow(Direction::Previous).await
    }

    async fn follow(&self, direction: Direction) -> Result<Page, BankinError> {
        let request = self.cursor_request(direction)?;
        let document = self.transport.send(request).await?;
        Page::new(self.transport.clone(), document, self.bearer_token.clone())
    }

    fn cursor_request(&self, direction: Direction) -> Result<RequestDescriptor, BankinError> {
        let uri = direction
            .uri(&self.pagination)
            .ok_or_else(|| direction.missing())?;
        let request = cursor_to_request(&self.transport, uri)?;
        Ok(match &self.bearer_token {
            Some(token) => request.bearer(token),
            None => request,
        })
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("resources", &self.resources.len())
            .field("pagination", &self.pagination)
            .field("extra", &self.extra)
            .field("authenticated", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a server cursor into a GET relative to the transport's base endpoint.
fn cursor_to_request(transport: &Transport, uri: &str) -> Result<RequestDescriptor, BankinError> {
    let invalid = |reason: &'static str| BankinError::InvalidCursor {
        uri: uri.to_string(),
        reason,
    };

    let parsed = match Url::parse(uri) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => transport
            .base_url()
            .join(uri)
            .map_err(|_| invalid("not a valid uri"))?,
        Err(_) => return Err(invalid("not a valid uri")),
    };
    if parsed.cannot_be_a_base() {
        return Err(invalid("not a valid uri"));
    }

    match parsed.query() {
        Some(q) if !q.is_empty() => {}
        _ => return Err(invalid("missing query string")),
    }
    let query: Query = parsed.query_pairs().collect();

    let path = strip_version_prefix(parsed.path(), transport.path_prefix());
    if path.is_empty() || path == "/" {
        return Err(invalid("missing path"));
    }

    Ok(RequestDescriptor::get(path).with_query(query))
}

/// Remove the version prefix when it is a whole leading segment run.
fn strip_version_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Credentials;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn transport() -> Transport {
        Transport::new(Credentials::new("id", "secret"))
            .expect("transport should build")
            .with_base_url("http://127.0.0.1:1/v2")
            .expect("base url should parse")
    }

    fn page(pagination: Value, token: Option<&str>) -> Page {
        let doc = json!({ "resources": [{"id": 1}], "pagination": pagination });
        Page::new(transport(), doc, token.map(str::to_string)).expect("page should build")
    }

    #[test]
    fn list_options_default_to_fifty() {
        let query = ListOptions::default().to_query().unwrap();
        assert_eq!(query.get("limit"), Some("50"));
        assert!(!query.contains_key("before"));
        assert!(!query.contains_key("after"));

        let query = ListOptions::new().after("abc").limit(10).to_query().unwrap();
        assert_eq!(query.get("after"), Some("abc"));
        assert_eq!(query.get("limit"), Some("10"));
    }

    #[test]
    fn list_options_reject_out_of_range_limits() {
        for limit in [0, 501] {
            assert!(matches!(
                ListOptions::new().limit(limit).to_query(),
                Err(BankinError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn flattens_document_and_keeps_unknown_fields() {
        let doc = json!({
            "resources": [{"id": 1}, {"id": 2}],
            "pagination": {"next_uri": null, "previous_uri": "", "total": 2},
            "generated_at": "2019-01-01"
        });
        let page = Page::new(transport(), doc, None).unwrap();
        assert_eq!(page.resources().len(), 2);
        assert!(!page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.pagination().extra.get("total"), Some(&json!(2)));
        assert_eq!(page.field("generated_at"), Some(&json!("2019-01-01")));
        assert!(page.field("resources").is_none());
    }

    #[test]
    fn tolerates_missing_envelope() {
        let page = Page::new(transport(), json!({}), None).unwrap();
        assert!(page.resources().is_empty());
        assert!(!page.has_next());
        assert!(matches!(page.next_request(), Err(BankinError::NoNextPage)));
        assert!(matches!(page.previous_request(), Err(BankinError::NoPreviousPage)));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            Page::new(transport(), json!([1, 2]), None),
            Err(BankinError::Decode(_))
        ));
    }

    #[test]
    fn strips_version_prefix_from_next_uri() {
        let page = page(json!({"next_uri": "/v2/items?after=X&limit=10"}), None);
        let request = page.next_request().unwrap();
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.path, "/items");
        assert_eq!(request.query, Query::new().param("after", "X").param("limit", "10"));
        assert!(request.headers.is_empty());
    }

    #[test]
    fn forwards_bearer_token() {
        let page = page(
            json!({"next_uri": "/v2/transactions/updated?since=100"}),
            Some("tok123"),
        );
        let request = page.next_request().unwrap();
        assert_eq!(request.path, "/transactions/updated");
        assert_eq!(request.query.get("since"), Some("100"));
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer tok123")
        );
    }

    #[test]
    fn previous_uses_previous_uri() {
        let page = page(
            json!({"previous_uri": "https://sync.bankin.com/v2/banks?before=Y&limit=5"}),
            None,
        );
        assert!(matches!(page.next_request(), Err(BankinError::NoNextPage)));
        let request = page.previous_request().unwrap();
        assert_eq!(request.path, "/banks");
        assert_eq!(request.query.get("before"), Some("Y"));
    }

    #[test]
    fn rejects_cursor_without_query() {
        for uri in ["/v2/items", "/v2/items?"] {
            let page = page(json!({ "next_uri": uri }), None);
            assert!(matches!(
                page.next_request(),
                Err(BankinError::InvalidCursor { reason: "missing query string", .. })
            ));
        }
    }

    #[test]
    fn rejects_cursor_without_path() {
        for uri in ["?after=X", "/v2?after=X", "/v2/?after=X"] {
            let page = page(json!({ "next_uri": uri }), None);
            assert!(
                matches!(
                    page.next_request(),
                    Err(BankinError::InvalidCursor { reason: "missing path", .. })
                ),
                "{uri} should be rejected"
            );
        }
    }

    #[test]
    fn strips_prefix_only_on_segment_boundary() {
        assert_eq!(strip_version_prefix("/v2/items", "/v2"), "/items");
        assert_eq!(strip_version_prefix("/v20/items", "/v2"), "/v20/items");
        assert_eq!(strip_version_prefix("/items", "/v2"), "/items");
        assert_eq!(strip_version_prefix("/v2", "/v2"), "");
        assert_eq!(strip_version_prefix("/items", ""), "/items");
    }

    #[test]
    fn cursor_query_round_trips_through_transport_encoding() {
        let t = transport();
        let sent = Query::new()
            .param("after", "a b&c=d/é")
            .param("limit", 10)
            .param("empty", "");
        let encoded = t
            .build_request(&RequestDescriptor::get("/items").with_query(sent.clone()))
            .unwrap();

        let doc = json!({ "resources": [], "pagination": { "next_uri": encoded.url().as_str() } });
        let page = Page::new(t.clone(), doc, None).unwrap();
        let derived = page.next_request().unwrap();
        assert_eq!(derived.path, "/items");
        assert_eq!(derived.query.get("after"), sent.get("after"));
        assert_eq!(derived.query.get("limit"), Some("10"));
        assert_eq!(derived.query.get("empty"), Some(""));

        let reencoded = t.build_request(&derived).unwrap();
        assert_eq!(reencoded.url(), encoded.url());
    }

    #[test]
    fn repeated_cursor_keys_keep_last_value() {
        let page = page(json!({"next_uri": "/v2/items?after=1&after=2"}), None);
        assert_eq!(page.next_request().unwrap().query.get("after"), Some("2"));
    }

    #[test]
    fn debug_hides_bearer_token() {
        let rendered = format!("{:?}", page(json!({}), Some("tok123")));
        assert!(!rendered.contains("tok123"));
        assert!(rendered.contains("authenticated: true"));
    }

    #[tokio::test]
    async fn next_without_cursor_fails_before_sending() {
        let page = page(json!({}), None);
        assert!(matches!(page.next().await, Err(BankinError::NoNextPage)));
        assert!(matches!(page.previous().await, Err(BankinError::NoPreviousPage)));
    }

    #[test]
    fn decodes_resources_into_models() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            id: u64,
        }
        let rows: Vec<Row> = page(json!({}), None).resources_as().unwrap();
        assert_eq!(rows, vec![Row { id: 1 }]);
    }
}
