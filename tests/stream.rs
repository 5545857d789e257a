// Streaming reply tests
#![allow(clippy::unwrap_used)]

use anyhow::anyhow;
use aws_lambda_http_adapter::Adapter;
use aws_lambda_http_adapter::http::service_fn;
use aws_lambda_http_adapter::models::{
    AdapterOptions, CanonicalRequest, CanonicalResponse, GatewayReply,
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use serde_json::{Value, json};

fn v2_event() -> Value {
    json!({
        "version": "2.0",
        "rawPath": "/test",
        "headers": {"X-My-Header": "wuuusaaa"},
        "cookies": ["foo=bar"],
        "requestContext": {"http": {"method": "GET"}}
    })
}

fn streaming_options() -> AdapterOptions {
    AdapterOptions::default().with_payload_as_stream(true)
}

#[tokio::test]
async fn test_buffered_response_as_stream() {
    let service = service_fn(|request: CanonicalRequest| async move {
        let cookie = request.header("cookie").and_then(|v| v.first()).unwrap_or_default();
        Ok(CanonicalResponse::new(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_header("x-seen-cookie", cookie)
            .with_header("set-cookie", vec!["qwerty=one", "qwerty=two"])
            .with_body(r#"{"hello":"world"}"#))
    });
    let adapter = Adapter::new(service, streaming_options());

    let reply = adapter.handle(v2_event(), None).await;
    assert!(matches!(reply, GatewayReply::Streaming(_)));

    let streaming = reply.into_streaming().unwrap();
    assert_eq!(streaming.meta.status_code, 200);
    assert_eq!(
        streaming.meta.headers["content-type"],
        "application/json; charset=utf-8"
    );
    assert_eq!(streaming.meta.headers["x-seen-cookie"], "foo=bar");
    assert_eq!(
        streaming.meta.cookies,
        Some(vec!["qwerty=one".to_string(), "qwerty=two".to_string()])
    );

    let body = streaming.read_body().await.unwrap();
    assert_eq!(body, br#"{"hello":"world"}"#);
}

#[tokio::test]
async fn test_streamed_response_passed_through() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"hello\":")),
            Ok(Bytes::from_static(b"\"world\"}")),
        ];
        Ok(CanonicalResponse::new(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_stream(Box::pin(stream::iter(chunks))))
    });
    let adapter = Adapter::new(service, streaming_options());

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    let body = streaming.read_body().await.unwrap();
    assert_eq!(body, br#"{"hello":"world"}"#);
}

#[tokio::test]
async fn test_empty_response_gets_placeholder_stream() {
    let service =
        service_fn(|_request: CanonicalRequest| async move { Ok(CanonicalResponse::new(204)) });
    let adapter = Adapter::new(service, streaming_options());

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    assert_eq!(streaming.meta.status_code, 204);
    assert!(streaming.read_body().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_served_stream_replaced_by_placeholder() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![];
        Ok(CanonicalResponse::new(204).with_stream(Box::pin(stream::iter(chunks))))
    });
    let adapter = Adapter::new(service, streaming_options());

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    assert_eq!(streaming.meta.status_code, 204);
    let chunks: Vec<_> = streaming.stream.collect().await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_served_stream_chunks_kept_in_order() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"one")),
            Ok(Bytes::from_static(b"two")),
        ];
        Ok(CanonicalResponse::new(200).with_stream(Box::pin(stream::iter(chunks))))
    });
    let adapter = Adapter::new(service, streaming_options());

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    let chunks: Vec<Bytes> = streaming
        .stream
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(
        chunks,
        vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]
    );
}

#[tokio::test]
async fn test_failure_is_streaming_internal_error() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        Err::<CanonicalResponse, _>(anyhow!("Stub Injection"))
    });
    let adapter = Adapter::new(service, streaming_options());

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    assert_eq!(streaming.meta.status_code, 500);
    assert!(streaming.meta.headers.is_empty());
    assert!(streaming.meta.cookies.is_none());
    assert!(streaming.read_body().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_binary_stream_keeps_raw_bytes() {
    let bytes: Vec<u8> = vec![0x00, 0xff, 0x10, 0x80];
    let served = bytes.clone();
    let service = service_fn(move |_request: CanonicalRequest| {
        let served = served.clone();
        async move {
            Ok(CanonicalResponse::new(200)
                .with_header("content-type", "application/octet-stream")
                .with_body(served))
        }
    });
    let options = streaming_options().with_binary_mime_types(["application/octet-stream"]);
    let adapter = Adapter::new(service, options);

    let streaming = adapter
        .handle(v2_event(), None)
        .await
        .into_streaming()
        .unwrap();
    assert_eq!(streaming.meta.is_base64_encoded, Some(true));
    assert_eq!(streaming.read_body().await.unwrap(), bytes);
}
