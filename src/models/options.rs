//! Adapter configuration.
//!
//! All options are optional. Defaults mirror the table below; a JSON
//! configuration bag with unknown keys is accepted and the unknown keys are
//! ignored.
//!
//! | option | default |
//! |---|---|
//! | `binaryMimeTypes` | `[]` |
//! | `callbackWaitsForEmptyEventLoop` | unset |
//! | `serializeLambdaArguments` | `false` |
//! | `decorateRequest` | `true` |
//! | `decorationPropertyName` | `"awsLambda"` |
//! | `retainStage` | `false` |
//! | `pathParameterUsedAsPath` | unset |
//! | `parseCommaSeparatedQueryParams` | `true` |
//! | `payloadAsStream` | `false` |
//! | `albMultiValueHeaders` | `false` |
//! | `enforceBase64` | content-encoding heuristic |
//! | `disableBase64Encoding` | `false` |

use schemars::JsonSchema;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::sync::Arc;

use crate::models::error::AdapterError;
use crate::models::response::CanonicalResponse;

/// Default property name the in-flight `{event, context}` view is exposed under.
pub const DEFAULT_DECORATION_PROPERTY_NAME: &str = "awsLambda";

const ENV_PREFIX: &str = "LAMBDA_ADAPTER_";

/// Predicate deciding whether a served response must be base64 encoded.
///
/// It runs after header folding: every header is [`HeaderValue::Text`], lists
/// other than `set-cookie` are joined with `,`, and cookies headed for the
/// `cookies` or `multiValueHeaders` fields are no longer present.
///
/// [`HeaderValue::Text`]: crate::models::HeaderValue::Text
pub type BinaryPredicate = Arc<dyn Fn(&CanonicalResponse) -> bool + Send + Sync>;

/// Configuration bag for the adapter.
#[derive(Deserialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterOptions {
    #[schemars(description = "Content types (without parameters) whose bodies are base64 encoded")]
    pub binary_mime_types: Vec<String>,
    #[schemars(description = "When set, overwrites the invocation context's completion-wait flag")]
    pub callback_waits_for_empty_event_loop: Option<bool>,
    #[schemars(description = "Attach x-apigateway-event and x-apigateway-context request headers")]
    pub serialize_lambda_arguments: bool,
    #[schemars(description = "Expose the in-flight event and context on each request")]
    pub decorate_request: bool,
    #[schemars(description = "Name the event and context are exposed under")]
    pub decoration_property_name: String,
    #[schemars(description = "Keep the /{stage} path prefix")]
    pub retain_stage: bool,
    #[schemars(description = "Path parameter whose value becomes the routed path")]
    pub path_parameter_used_as_path: Option<String>,
    #[schemars(description = "Split comma-bearing 2.0 query values into arrays")]
    pub parse_comma_separated_query_params: bool,
    #[schemars(description = "Reply with metadata plus a byte stream")]
    pub payload_as_stream: bool,
    #[schemars(description = "Use the load-balancer multi-value header shape")]
    pub alb_multi_value_headers: bool,
    #[serde(skip)]
    #[schemars(skip)]
    pub enforce_base64: Option<BinaryPredicate>,
    #[schemars(description = "Omit isBase64Encoded and never base64 encode bodies")]
    pub disable_base64_encoding: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            binary_mime_types: Vec::new(),
            callback_waits_for_empty_event_loop: None,
            serialize_lambda_arguments: false,
            decorate_request: true,
            decoration_property_name: DEFAULT_DECORATION_PROPERTY_NAME.to_string(),
            retain_stage: false,
            path_parameter_used_as_path: None,
            parse_comma_separated_query_params: true,
            payload_as_stream: false,
            alb_multi_value_headers: false,
            enforce_base64: None,
            disable_base64_encoding: false,
        }
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("binary_mime_types", &self.binary_mime_types)
            .field(
                "callback_waits_for_empty_event_loop",
                &self.callback_waits_for_empty_event_loop,
            )
            .field("serialize_lambda_arguments", &self.serialize_lambda_arguments)
            .field("decorate_request", &self.decorate_request)
            .field("decoration_property_name", &self.decoration_property_name)
            .field("retain_stage", &self.retain_stage)
            .field("path_parameter_used_as_path", &self.path_parameter_used_as_path)
            .field(
                "parse_comma_separated_query_params",
                &self.parse_comma_separated_query_params,
            )
            .field("payload_as_stream", &self.payload_as_stream)
            .field("alb_multi_value_headers", &self.alb_multi_value_headers)
            .field("enforce_base64", &self.enforce_base64.is_some())
            .field("disable_base64_encoding", &self.disable_base64_encoding)
            .finish()
    }
}

impl AdapterOptions {
    /// Parses a JSON configuration bag.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Config` when a known option has the wrong type.
    pub fn from_json(value: serde_json::Value) -> Result<Self, AdapterError> {
        serde_json::from_value(value).map_err(|e| AdapterError::Config(e.to_string()))
    }

    /// Reads options from `LAMBDA_ADAPTER_*` environment variables, falling
    /// back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Config` when a boolean variable holds anything
    /// other than `true/false/1/0/yes/no`.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AdapterOptions::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Config` for malformed boolean values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());
        let flag = |name: &str| var(name).map(|v| parse_bool(name, &v)).transpose();

        let mut options = Self::default();
        if let Some(types) = var("BINARY_MIME_TYPES") {
            options.binary_mime_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        options.callback_waits_for_empty_event_loop =
            flag("CALLBACK_WAITS_FOR_EMPTY_EVENT_LOOP")?;
        if let Some(v) = flag("SERIALIZE_LAMBDA_ARGUMENTS")? {
            options.serialize_lambda_arguments = v;
        }
        if let Some(v) = flag("DECORATE_REQUEST")? {
            options.decorate_request = v;
        }
        if let Some(name) = var("DECORATION_PROPERTY_NAME") {
            options.decoration_property_name = name;
        }
        if let Some(v) = flag("RETAIN_STAGE")? {
            options.retain_stage = v;
        }
        options.path_parameter_used_as_path = var("PATH_PARAMETER_USED_AS_PATH");
        if let Some(v) = flag("PARSE_COMMA_SEPARATED_QUERY_PARAMS")? {
            options.parse_comma_separated_query_params = v;
        }
        if let Some(v) = flag("PAYLOAD_AS_STREAM")? {
            options.payload_as_stream = v;
        }
        if let Some(v) = flag("ALB_MULTI_VALUE_HEADERS")? {
            options.alb_multi_value_headers = v;
        }
        if let Some(v) = flag("DISABLE_BASE64_ENCODING")? {
            options.disable_base64_encoding = v;
        }
        Ok(options)
    }

    #[must_use]
    pub fn with_binary_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binary_mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_callback_waits_for_empty_event_loop(mut self, wait: bool) -> Self {
        self.callback_waits_for_empty_event_loop = Some(wait);
        self
    }

    #[must_use]
    pub const fn with_serialize_lambda_arguments(mut self, enabled: bool) -> Self {
        self.serialize_lambda_arguments = enabled;
        self
    }

    #[must_use]
    pub const fn with_decorate_request(mut self, enabled: bool) -> Self {
        self.decorate_request = enabled;
        self
    }

    #[must_use]
    pub fn with_decoration_property_name(mut self, name: impl Into<String>) -> Self {
        self.decoration_property_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_retain_stage(mut self, retain: bool) -> Self {
        self.retain_stage = retain;
        self
    }

    #[must_use]
    pub fn with_path_parameter_used_as_path(mut self, name: impl Into<String>) -> Self {
        self.path_parameter_used_as_path = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_parse_comma_separated_query_params(mut self, enabled: bool) -> Self {
        self.parse_comma_separated_query_params = enabled;
        self
    }

    #[must_use]
    pub const fn with_payload_as_stream(mut self, enabled: bool) -> Self {
        self.payload_as_stream = enabled;
        self
    }

    #[must_use]
    pub const fn with_alb_multi_value_headers(mut self, enabled: bool) -> Self {
        self.alb_multi_value_headers = enabled;
        self
    }

    /// Replaces the default content-encoding check with `predicate`.
    #[must_use]
    pub fn with_enforce_base64<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CanonicalResponse) -> bool + Send + Sync + 'static,
    {
        self.enforce_base64 = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub const fn with_disable_base64_encoding(mut self, disabled: bool) -> Self {
        self.disable_base64_encoding = disabled;
        self
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AdapterError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AdapterError::Config(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = AdapterOptions::default();
        assert!(options.binary_mime_types.is_empty());
        assert!(options.decorate_request);
        assert_eq!(options.decoration_property_name, "awsLambda");
        assert!(options.parse_comma_separated_query_params);
        assert!(!options.retain_stage);
        assert!(!options.payload_as_stream);
        assert!(options.callback_waits_for_empty_event_loop.is_none());
        assert!(options.enforce_base64.is_none());
    }

    #[test]
    fn test_from_json_ignores_unknown_keys() {
        let options = AdapterOptions::from_json(json!({
            "binaryMimeTypes": ["image/png"],
            "retainStage": true,
            "serializeLambdaArequestrguments": true
        }));
        let options = options.unwrap_or_default();
        assert_eq!(options.binary_mime_types, vec!["image/png"]);
        assert!(options.retain_stage);
        assert!(!options.serialize_lambda_arguments);
        assert!(options.decorate_request);
    }

    #[test]
    fn test_from_json_wrong_type() {
        let result = AdapterOptions::from_json(json!({"retainStage": "maybe"}));
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_from_lookup() {
        let options = AdapterOptions::from_lookup(lookup(&[
            ("BINARY_MIME_TYPES", "image/png, application/octet-stream"),
            ("PAYLOAD_AS_STREAM", "yes"),
            ("PARSE_COMMA_SEPARATED_QUERY_PARAMS", "0"),
            ("PATH_PARAMETER_USED_AS_PATH", "proxy"),
            ("CALLBACK_WAITS_FOR_EMPTY_EVENT_LOOP", "false"),
        ]))
        .unwrap_or_default();
        assert_eq!(
            options.binary_mime_types,
            vec!["image/png", "application/octet-stream"]
        );
        assert!(options.payload_as_stream);
        assert!(!options.parse_comma_separated_query_params);
        assert_eq!(options.path_parameter_used_as_path.as_deref(), Some("proxy"));
        assert_eq!(options.callback_waits_for_empty_event_loop, Some(false));
    }

    #[test]
    fn test_from_lookup_rejects_bad_bool() {
        let result = AdapterOptions::from_lookup(lookup(&[("RETAIN_STAGE", "sometimes")]));
        assert!(matches!(result, Err(AdapterError::Config(msg)) if msg.contains("RETAIN_STAGE")));
    }

    #[test]
    fn test_builder() {
        let options = AdapterOptions::default()
            .with_alb_multi_value_headers(true)
            .with_decoration_property_name("lambda")
            .with_enforce_base64(|_| true);
        assert!(options.alb_multi_value_headers);
        assert_eq!(options.decoration_property_name, "lambda");
        assert!(options.enforce_base64.is_some());
    }
}
