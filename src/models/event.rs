//! Gateway event models.
//!
//! Events arrive as REST API (v1), HTTP API (v2) or load-balancer payloads.
//! Every field is optional and parsed leniently: a field with an unexpected
//! type is treated as absent instead of failing the invocation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Typed view of an incoming gateway event.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayEvent {
    #[serde(deserialize_with = "lenient")]
    pub version: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub http_method: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub path: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub raw_path: Option<String>,
    #[serde(deserialize_with = "string_map")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(deserialize_with = "string_list_map")]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    #[serde(deserialize_with = "string_map")]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(deserialize_with = "string_list_map")]
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,
    #[serde(deserialize_with = "string_map")]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(deserialize_with = "lenient")]
    pub cookies: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub body: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub is_base64_encoded: bool,
    #[serde(deserialize_with = "lenient")]
    pub request_context: Option<RequestContext>,
}

/// The parts of `requestContext` the adapter reads.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestContext {
    #[serde(deserialize_with = "lenient")]
    pub stage: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub resource_path: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub request_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub http: Option<HttpDescription>,
    #[serde(deserialize_with = "lenient")]
    pub identity: Option<Identity>,
    #[serde(deserialize_with = "lenient")]
    pub elb: Option<Value>,
}

/// `requestContext.http` of an HTTP API event.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpDescription {
    #[serde(deserialize_with = "lenient")]
    pub method: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub path: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub source_ip: Option<String>,
}

/// `requestContext.identity` of a REST API event.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    #[serde(deserialize_with = "lenient")]
    pub source_ip: Option<String>,
}

/// Event shape, resolved once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// REST API payload, also the fallback for unknown shapes
    RestV1,
    /// HTTP API payload (`version: "2.0"` or `requestContext.http`)
    HttpV2,
    /// Application load balancer payload (`requestContext.elb`)
    LoadBalancer,
}

impl GatewayEvent {
    /// Builds the typed view from a raw event. Non-object payloads yield an
    /// empty event.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        Self::deserialize(raw).unwrap_or_default()
    }

    /// Resolves which gateway produced this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        let context = self.request_context.as_ref();
        if context.is_some_and(|c| c.elb.is_some()) {
            EventKind::LoadBalancer
        } else if self.is_version("2.0") || context.is_some_and(|c| c.http.is_some()) {
            EventKind::HttpV2
        } else {
            EventKind::RestV1
        }
    }

    /// True when the payload format version equals `version`.
    #[must_use]
    pub fn is_version(&self, version: &str) -> bool {
        self.version.as_deref() == Some(version)
    }

    /// True for events without a version or with payload format `1.0`.
    #[must_use]
    pub fn is_legacy_version(&self) -> bool {
        matches!(self.version.as_deref(), None | Some("" | "1.0"))
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

// Keeps the string-valued entries of an object.
fn string_map<'de, D>(deserializer: D) -> Result<Option<HashMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
    ))
}

// Keeps the array-valued entries of an object, dropping non-string items.
fn string_list_map<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, Vec<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::Array(items) => Some((
                    k,
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )),
                _ => None,
            })
            .collect(),
    ))
}
