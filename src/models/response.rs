//! Response models: what the serving collaborator produces and what the
//! gateway expects back.

use bytes::Bytes;
use futures::FutureExt;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::pin::Pin;

/// Response body delivered as chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Stream yielding one empty chunk. Streaming replies always carry a body.
#[must_use]
pub fn placeholder_stream() -> BodyStream {
    Box::pin(stream::once(async { Ok(Bytes::new()) }))
}

/// Stream yielding `body` as a single chunk.
#[must_use]
pub fn once_stream(body: Bytes) -> BodyStream {
    Box::pin(stream::once(async move { Ok(body) }))
}

/// Passes `body` through, or the placeholder when it ends without a chunk.
/// The first chunk is awaited lazily, on the first poll of the result.
#[must_use]
pub fn non_empty_stream(body: BodyStream) -> BodyStream {
    let primed = body.into_future().map(|(first, rest)| match first {
        Some(chunk) => Box::pin(stream::once(async move { chunk }).chain(rest)) as BodyStream,
        None => placeholder_stream(),
    });
    Box::pin(primed.flatten_stream())
}

/// A response header value as produced by the serving collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Multi(Vec<String>),
    Number(serde_json::Number),
    Bool(bool),
}

impl HeaderValue {
    /// Renders the value as a single header string, joining lists with `,`.
    #[must_use]
    pub fn to_header_string(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Multi(values) => values.join(","),
            Self::Number(number) => number.to_string(),
            Self::Bool(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl From<u64> for HeaderValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Response produced by the serving collaborator.
pub struct CanonicalResponse {
    pub status_code: u16,
    pub headers: HashMap<String, HeaderValue>,
    /// Body bytes exactly as served
    pub raw_payload: Bytes,
    /// Body rendered as text
    pub payload: String,
    /// Streamed body, present when the collaborator was asked to stream
    pub stream: Option<BodyStream>,
}

impl CanonicalResponse {
    #[must_use]
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            raw_payload: Bytes::new(),
            payload: String::new(),
            stream: None,
        }
    }

    /// Sets a header, replacing any previous value under the same name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Adds a header value, turning repeated names into a multi-value entry.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.headers.remove(name) {
            None => {
                self.headers.insert(name.to_string(), HeaderValue::Text(value));
            }
            Some(HeaderValue::Multi(mut values)) => {
                values.push(value);
                self.headers.insert(name.to_string(), HeaderValue::Multi(values));
            }
            Some(existing) => {
                self.headers.insert(
                    name.to_string(),
                    HeaderValue::Multi(vec![existing.to_header_string(), value]),
                );
            }
        }
    }

    /// Sets the body; the text rendering is a lossy UTF-8 view of the bytes.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.raw_payload = body.into();
        self.payload = String::from_utf8_lossy(&self.raw_payload).into_owned();
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream: BodyStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Looks up a header ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        crate::utils::find_header(&self.headers, name)
    }
}

impl fmt::Debug for CanonicalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("raw_payload_len", &self.raw_payload.len())
            .field("stream", &self.stream.is_some())
            .finish()
    }
}

/// Buffered reply in the shape the gateway expects.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    pub body: String,
}

impl GatewayResponse {
    /// The fixed reply used when serving fails.
    #[must_use]
    pub fn internal_error() -> Self {
        Self {
            status_code: 500,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_meta(meta: ResponseMeta, body: String) -> Self {
        Self {
            status_code: meta.status_code,
            headers: meta.headers,
            is_base64_encoded: meta.is_base64_encoded,
            cookies: meta.cookies,
            multi_value_headers: meta.multi_value_headers,
            body,
        }
    }
}

/// Reply fields without the body; sent ahead of a streamed body.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
}

impl ResponseMeta {
    #[must_use]
    pub fn internal_error() -> Self {
        Self {
            status_code: 500,
            ..Self::default()
        }
    }
}

/// Streamed reply: metadata plus an open byte stream.
pub struct StreamingResponse {
    pub meta: ResponseMeta,
    pub stream: BodyStream,
}

impl StreamingResponse {
    /// Drains the stream into one buffer.
    ///
    /// # Errors
    ///
    /// Returns the first error the stream yields.
    pub async fn read_body(self) -> io::Result<Vec<u8>> {
        self.stream
            .try_fold(Vec::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// What one invocation returns: exactly one of a body or a stream.
#[derive(Debug)]
pub enum GatewayReply {
    Buffered(GatewayResponse),
    Streaming(StreamingResponse),
}

impl GatewayReply {
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Buffered(response) => response.status_code,
            Self::Streaming(response) => response.meta.status_code,
        }
    }

    #[must_use]
    pub fn into_buffered(self) -> Option<GatewayResponse> {
        match self {
            Self::Buffered(response) => Some(response),
            Self::Streaming(_) => None,
        }
    }

    #[must_use]
    pub fn into_streaming(self) -> Option<StreamingResponse> {
        match self {
            Self::Streaming(response) => Some(response),
            Self::Buffered(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_rendering() {
        assert_eq!(HeaderValue::from(17_u64).to_header_string(), "17");
        assert_eq!(HeaderValue::from(true).to_header_string(), "true");
        assert_eq!(
            HeaderValue::from(vec!["a", "b"]).to_header_string(),
            "a,b"
        );
    }

    #[test]
    fn test_append_header_builds_multi() {
        let mut response = CanonicalResponse::new(200);
        response.append_header("set-cookie", "a=1");
        assert_eq!(
            response.header("set-cookie"),
            Some(&HeaderValue::Text("a=1".into()))
        );
        response.append_header("set-cookie", "b=2");
        response.append_header("set-cookie", "c=3");
        assert_eq!(
            response.header("Set-Cookie"),
            Some(&HeaderValue::from(vec!["a=1", "b=2", "c=3"]))
        );
    }

    #[test]
    fn test_internal_error_shape() {
        let json = serde_json::to_value(GatewayResponse::internal_error()).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({"statusCode": 500, "headers": {}, "body": ""})
        );
    }

    #[tokio::test]
    async fn test_placeholder_stream_is_empty_but_present() {
        let reply = StreamingResponse {
            meta: ResponseMeta::internal_error(),
            stream: placeholder_stream(),
        };
        let body = reply.read_body().await.unwrap_or_else(|_| vec![1]);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_non_empty_stream_substitutes_placeholder() {
        let nothing: Vec<Result<Bytes, io::Error>> = vec![];
        let chunks: Vec<_> = non_empty_stream(Box::pin(stream::iter(nothing)))
            .collect()
            .await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(&chunks[0], Ok(chunk) if chunk.is_empty()));
    }

    #[tokio::test]
    async fn test_non_empty_stream_keeps_every_chunk() {
        let served: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
            Ok(Bytes::from_static(b"c")),
        ];
        let chunks: Vec<Bytes> = non_empty_stream(Box::pin(stream::iter(served)))
            .try_collect()
            .await
            .unwrap_or_default();
        assert_eq!(chunks, vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"b"),
            Bytes::from_static(b"c"),
        ]);
    }
}
