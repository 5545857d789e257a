//! Response shaping: canonical response in, gateway reply out.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lambda_runtime::tracing::debug;
use std::collections::HashMap;

use crate::models::event::GatewayEvent;
use crate::models::options::AdapterOptions;
use crate::models::response::{
    CanonicalResponse, GatewayReply, GatewayResponse, HeaderValue, ResponseMeta,
    StreamingResponse, non_empty_stream, once_stream, placeholder_stream,
};
use crate::utils::remove_header;

/// Headers folded into the gateway's flat, string-only shape.
#[derive(Debug, Default, PartialEq, Eq)]
struct FoldedHeaders {
    headers: HashMap<String, String>,
    multi_value_headers: Option<HashMap<String, Vec<String>>>,
    cookies: Option<Vec<String>>,
}

/// The reply used when the serving collaborator fails.
#[must_use]
pub fn failure_reply(options: &AdapterOptions) -> GatewayReply {
    if options.payload_as_stream {
        GatewayReply::Streaming(StreamingResponse {
            meta: ResponseMeta::internal_error(),
            stream: placeholder_stream(),
        })
    } else {
        GatewayReply::Buffered(GatewayResponse::internal_error())
    }
}

/// Default binary check: the body is already content-encoded.
#[must_use]
pub fn is_compressed(response: &CanonicalResponse) -> bool {
    response
        .header("content-encoding")
        .map(HeaderValue::to_header_string)
        .is_some_and(|encoding| !encoding.is_empty() && encoding != "identity")
}

/// Whether the body must travel base64 encoded. A listed content type and the
/// binary predicate each suffice on their own.
#[must_use]
pub fn is_binary(response: &CanonicalResponse, options: &AdapterOptions) -> bool {
    let content_type = response
        .header("content-type")
        .map(HeaderValue::to_header_string)
        .unwrap_or_default();
    let mime = content_type.split(';').next().unwrap_or_default();
    let listed = options.binary_mime_types.iter().any(|t| t == mime);
    let predicate = options
        .enforce_base64
        .as_ref()
        .map_or_else(|| is_compressed(response), |check| check(response));
    listed || predicate
}

fn fold_headers(
    headers: HashMap<String, HeaderValue>,
    event: &GatewayEvent,
) -> FoldedHeaders {
    let mut folded = FoldedHeaders::default();
    for (name, value) in headers {
        if !name.eq_ignore_ascii_case("set-cookie") {
            folded.headers.insert(name, value.to_header_string());
            continue;
        }
        match value {
            HeaderValue::Multi(values) => {
                folded
                    .multi_value_headers
                    .get_or_insert_with(HashMap::new)
                    .insert(name, values.clone());
                folded.cookies = Some(values);
            }
            scalar => {
                let cookie = scalar.to_header_string();
                folded.cookies = Some(vec![cookie.clone()]);
                if !event.is_version("2.0") {
                    folded.headers.insert(name, cookie);
                }
            }
        }
    }
    folded
}

/// Maps a served response onto the gateway reply for `event`.
#[must_use]
pub fn shape(
    mut response: CanonicalResponse,
    event: &GatewayEvent,
    options: &AdapterOptions,
) -> GatewayReply {
    remove_header(&mut response.headers, "transfer-encoding");

    // The binary check sees the folded headers, as the gateway will
    let folded = fold_headers(std::mem::take(&mut response.headers), event);
    response.headers = folded
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), HeaderValue::Text(value.clone())))
        .collect();
    let binary = is_binary(&response, options);
    let encode = binary && !options.disable_base64_encoding;

    let mut meta = ResponseMeta {
        status_code: response.status_code,
        headers: folded.headers,
        is_base64_encoded: (!options.disable_base64_encoding).then_some(binary),
        cookies: None,
        multi_value_headers: None,
    };
    if event.is_version("2.0") {
        meta.cookies = folded.cookies;
    }
    if event.is_legacy_version() {
        meta.multi_value_headers = folded.multi_value_headers;
    }
    if options.alb_multi_value_headers {
        let multi = meta.multi_value_headers.get_or_insert_with(HashMap::new);
        for (name, value) in &meta.headers {
            multi.insert(name.clone(), vec![value.clone()]);
        }
    }

    debug!(
        status = meta.status_code,
        binary,
        body_size = response.raw_payload.len(),
        "Shaped served response"
    );

    if !options.payload_as_stream {
        let body = if encode {
            STANDARD.encode(&response.raw_payload)
        } else {
            response.payload
        };
        return GatewayReply::Buffered(GatewayResponse::from_meta(meta, body));
    }

    let stream = match response.stream {
        Some(stream) => non_empty_stream(stream),
        None if !response.raw_payload.is_empty() => once_stream(response.raw_payload),
        None => placeholder_stream(),
    };
    GatewayReply::Streaming(StreamingResponse { meta, stream })
}
