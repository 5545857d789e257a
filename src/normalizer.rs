//! Request normalization: gateway event in, canonical request out.
//!
//! Nothing here fails. Missing or malformed event fields fall through to
//! absent values in the canonical request.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use lambda_runtime::tracing::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::context::InvocationContext;
use crate::models::event::{EventKind, GatewayEvent};
use crate::models::options::AdapterOptions;
use crate::models::request::{CanonicalRequest, FieldValue};
use crate::stringifiers::stringify_event;
use crate::utils::{decode_uri_component, encode_uri_component, find_header, non_empty};

/// Lenient base64: padding optional, non-zero trailing bits accepted.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Maps a gateway event onto a canonical request.
///
/// `raw` is the event exactly as received; it is only read when
/// `serialize_lambda_arguments` is enabled.
#[must_use]
pub fn normalize(
    event: &GatewayEvent,
    raw: &Value,
    context: Option<&InvocationContext>,
    options: &AdapterOptions,
) -> CanonicalRequest {
    let kind = event.kind();
    let method = resolve_method(event);
    let url = resolve_path(event, options);
    let query = match kind {
        EventKind::LoadBalancer => load_balancer_query(event, options),
        EventKind::RestV1 | EventKind::HttpV2 => gateway_query(event, options),
    };

    let mut headers = merge_headers(event, options);
    let payload = decode_body(event);
    if let Some(body) = payload.as_ref()
        && event.body.as_deref().is_some_and(|b| !b.is_empty())
        && find_header(&headers, "content-length").is_none()
    {
        headers.insert(
            "content-length".to_string(),
            FieldValue::Single(body.len().to_string()),
        );
    }

    if options.serialize_lambda_arguments {
        attach_lambda_arguments(&mut headers, raw, context);
    }

    if let Some(request_id) = event
        .request_context
        .as_ref()
        .and_then(|c| non_empty(c.request_id.as_ref()))
        && find_header(&headers, "x-request-id")
            .and_then(FieldValue::first)
            .is_none_or(str::is_empty)
    {
        headers.insert(
            "x-request-id".to_string(),
            FieldValue::Single(request_id.to_string()),
        );
    }

    if let Some(cookies) = event.cookies.as_ref().filter(|c| !c.is_empty()) {
        headers.insert("cookie".to_string(), FieldValue::Single(cookies.join(";")));
    }

    debug!(?kind, method = ?method, url = %url, "Normalized gateway event");

    CanonicalRequest {
        method,
        url,
        query,
        headers,
        payload,
        remote_address: resolve_remote_address(event),
        payload_as_stream: options.payload_as_stream,
        decoration: None,
    }
}

fn resolve_method(event: &GatewayEvent) -> Option<String> {
    non_empty(event.http_method.as_ref())
        .or_else(|| {
            event
                .request_context
                .as_ref()
                .and_then(|c| c.http.as_ref())
                .and_then(|h| non_empty(h.method.as_ref()))
        })
        .map(str::to_string)
}

/// Resolves the routed path, removing a leading `/{stage}` segment when the
/// resource path does not include it.
fn resolve_path(event: &GatewayEvent, options: &AdapterOptions) -> String {
    let from_parameter = options
        .path_parameter_used_as_path
        .as_ref()
        .and_then(|name| event.path_parameters.as_ref()?.get(name))
        .filter(|value| !value.is_empty())
        .map(|value| format!("/{value}"));

    let url = from_parameter
        .or_else(|| non_empty(event.path.as_ref()).map(str::to_string))
        .or_else(|| non_empty(event.raw_path.as_ref()).map(str::to_string))
        .unwrap_or_else(|| "/".to_string());

    if options.retain_stage {
        return url;
    }
    let Some(context) = event.request_context.as_ref() else {
        return url;
    };
    let (Some(stage), Some(resource_path)) = (
        non_empty(context.stage.as_ref()),
        non_empty(context.resource_path.as_ref()),
    ) else {
        return url;
    };

    let prefix = format!("/{stage}/");
    if url.starts_with(&prefix) && !resource_path.starts_with(&prefix) {
        url.strip_prefix('/')
            .and_then(|rest| rest.strip_prefix(stage))
            .map_or_else(|| url.clone(), str::to_string)
    } else {
        url
    }
}

/// Splits a value on `,` when it contains a comma after its first character.
fn split_commas(value: &str) -> Option<Vec<String>> {
    value
        .find(',')
        .filter(|&index| index > 0)
        .map(|_| value.split(',').map(str::to_string).collect())
}

fn splits_commas(event: &GatewayEvent, options: &AdapterOptions) -> bool {
    options.parse_comma_separated_query_params && event.is_version("2.0")
}

/// Load-balancer query strings arrive percent-encoded.
fn load_balancer_query(
    event: &GatewayEvent,
    options: &AdapterOptions,
) -> HashMap<String, FieldValue> {
    let mut query = HashMap::new();
    if let Some(multi) = event.multi_value_query_string_parameters.as_ref() {
        for (key, values) in multi {
            query.insert(
                decode_uri_component(key),
                FieldValue::Multi(values.iter().map(|v| decode_uri_component(v)).collect()),
            );
        }
    } else if let Some(single) = event.query_string_parameters.as_ref() {
        let split = splits_commas(event, options);
        for (key, value) in single {
            let value = decode_uri_component(value);
            let field = split
                .then(|| split_commas(&value))
                .flatten()
                .map_or(FieldValue::Single(value), FieldValue::Multi);
            query.insert(decode_uri_component(key), field);
        }
    }
    query
}

/// REST and HTTP API query strings arrive decoded; only keys of comma-split
/// values are decoded again.
fn gateway_query(event: &GatewayEvent, options: &AdapterOptions) -> HashMap<String, FieldValue> {
    let mut comma_split = HashMap::new();
    if splits_commas(event, options)
        && let Some(single) = event.query_string_parameters.as_ref()
    {
        for (key, value) in single {
            if let Some(values) = split_commas(value) {
                comma_split.insert(decode_uri_component(key), FieldValue::Multi(values));
            }
        }
    }

    let mut query: HashMap<String, FieldValue> =
        if let Some(multi) = event.multi_value_query_string_parameters.as_ref() {
            multi
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::Multi(v.clone())))
                .collect()
        } else if let Some(single) = event.query_string_parameters.as_ref() {
            single
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::Single(v.clone())))
                .collect()
        } else {
            HashMap::new()
        };
    query.extend(comma_split);
    query
}

/// Copies single-value headers, then lets multi-value entries override them.
fn merge_headers(event: &GatewayEvent, options: &AdapterOptions) -> HashMap<String, FieldValue> {
    let mut headers: HashMap<String, FieldValue> = event
        .headers
        .as_ref()
        .map(|h| {
            h.iter()
                .map(|(k, v)| (k.clone(), FieldValue::Single(v.clone())))
                .collect()
        })
        .unwrap_or_default();

    if let Some(multi) = event.multi_value_headers.as_ref() {
        for (name, values) in multi {
            match values.as_slice() {
                [] => {}
                [only] => {
                    if options.alb_multi_value_headers {
                        headers.insert(name.clone(), FieldValue::Single(only.clone()));
                    }
                }
                _ => {
                    headers.insert(name.clone(), FieldValue::Multi(values.clone()));
                }
            }
        }
    }
    headers
}

fn decode_body(event: &GatewayEvent) -> Option<Bytes> {
    let body = event.body.as_ref()?;
    if !event.is_base64_encoded {
        return Some(Bytes::from(body.clone().into_bytes()));
    }
    // Whitespace is skipped and the URL-safe alphabet folds onto the standard one
    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    match BASE64_LENIENT.decode(cleaned) {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) => {
            warn!(error = %e, "Body flagged as base64 could not be decoded, passing it through as text");
            Some(Bytes::from(body.clone().into_bytes()))
        }
    }
}

/// Attaches the serialized event (without its body) and context as headers.
fn attach_lambda_arguments(
    headers: &mut HashMap<String, FieldValue>,
    raw: &Value,
    context: Option<&InvocationContext>,
) {
    let mut event = raw.clone();
    if let Some(fields) = event.as_object_mut() {
        fields.shift_remove("body");
    }
    headers.insert(
        "x-apigateway-event".to_string(),
        FieldValue::Single(encode_uri_component(&stringify_event(&event))),
    );
    if let Some(context) = context {
        match serde_json::to_string(context) {
            Ok(serialized) => {
                headers.insert(
                    "x-apigateway-context".to_string(),
                    FieldValue::Single(encode_uri_component(&serialized)),
                );
            }
            Err(e) => warn!(error = %e, "Failed to serialize invocation context"),
        }
    }
}

fn resolve_remote_address(event: &GatewayEvent) -> Option<String> {
    let context = event.request_context.as_ref()?;
    context
        .http
        .as_ref()
        .and_then(|h| non_empty(h.source_ip.as_ref()))
        .or_else(|| {
            context
                .identity
                .as_ref()
                .and_then(|i| non_empty(i.source_ip.as_ref()))
        })
        .map(str::to_string)
}
