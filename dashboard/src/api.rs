//! Factor/price endpoints: URL construction, the transport seam and payload
//! normalization.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::FetchError;
use crate::hooks;
use crate::query::QueryState;

/// One time-indexed observation, fields in server order.
pub type Record = Map<String, Value>;

pub const DEFAULT_EXCERPT_CHARS: usize = 200;

// encodeURIComponent's unreserved marks stay literal
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Alias keys a wrapped payload may use, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKey {
    Data,
    Series,
    Records,
}

impl WrapperKey {
    pub const PRIORITY: [WrapperKey; 3] = [WrapperKey::Data, WrapperKey::Series, WrapperKey::Records];

    pub fn as_str(&self) -> &'static str {
        match self {
            WrapperKey::Data => "data",
            WrapperKey::Series => "series",
            WrapperKey::Records => "records",
        }
    }
}

/// Factor response after shape resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Sequence(Vec<Record>),
    Wrapped { key: WrapperKey, records: Vec<Record> },
}

impl Payload {
    /// A bare array, or an object whose first present alias key holds an array.
    /// The first present key decides even when its value is not an array.
    pub fn resolve(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Array(items) => Ok(Payload::Sequence(records_from(items)?)),
            Value::Object(mut obj) => {
                let key = WrapperKey::PRIORITY
                    .into_iter()
                    .find(|k| obj.contains_key(k.as_str()))
                    .ok_or(FetchError::Shape)?;
                match obj.remove(key.as_str()) {
                    Some(Value::Array(items)) => Ok(Payload::Wrapped {
                        key,
                        records: records_from(items)?,
                    }),
                    _ => Err(FetchError::Shape),
                }
            }
            _ => Err(FetchError::Shape),
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            Payload::Sequence(records) | Payload::Wrapped { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Payload::Sequence(records) | Payload::Wrapped { records, .. } => records,
        }
    }
}

fn records_from(items: Vec<Value>) -> Result<Vec<Record>, FetchError> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(FetchError::Shape),
        })
        .collect()
}

/// Decoded JSON to an ordered record sequence. No filtering, no coercion.
pub fn normalize(value: Value) -> Result<Vec<Record>, FetchError> {
    Payload::resolve(value).map(Payload::into_records)
}

/// `/api/prices/{ticker}`; opened as a navigation target, never fetched here.
pub fn prices_path(ticker: &str) -> String {
    format!("/api/prices/{}", escape_segment(ticker))
}

/// `/api/factors/{ticker}?start=..&end=..&as=series`, empty dates omitted.
pub fn factors_path(query: &QueryState) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if !query.start.is_empty() {
        params.append_pair("start", &query.start);
    }
    if !query.end.is_empty() {
        params.append_pair("end", &query.end);
    }
    params.append_pair("as", "series");
    format!("/api/factors/{}?{}", escape_segment(&query.ticker), params.finish())
}

/// Joins an API base (`""` for same origin) and a path.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn escape_segment(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET-only HTTP seam. Single-threaded: futures need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    async fn get_json(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct FactorsApi<T> {
    transport: T,
    base: String,
    excerpt_chars: usize,
}

impl<T: Transport> FactorsApi<T> {
    pub fn new(transport: T, base: impl Into<String>) -> Self {
        Self {
            transport,
            base: base.into(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, n: usize) -> Self {
        self.excerpt_chars = n;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_factors(&self, query: &QueryState) -> Result<Vec<Record>, FetchError> {
        let url = endpoint(&self.base, &factors_path(query));
        hooks::log_fetch_request(&url);

        let resp = self.transport.get_json(&url).await?;
        if !resp.is_success() {
            return Err(FetchError::Http {
                status: resp.status,
                excerpt: resp.body.chars().take(self.excerpt_chars).collect(),
            });
        }

        let value: Value =
            serde_json::from_str(&resp.body).map_err(|e| FetchError::Decode(e.to_string()))?;
        let payload = Payload::resolve(value)?;
        if let Payload::Wrapped { key, records } = &payload {
            hooks::log_payload_unwrapped(key.as_str(), records.len());
        }
        Ok(payload.into_records())
    }
}
