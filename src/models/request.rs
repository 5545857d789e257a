//! Canonical request handed to the serving collaborator.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decoration::{LambdaArguments, RequestDecoration};

/// A header or query value: one string, or an ordered list of strings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// First value, or the only one.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// All values in order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Transport-agnostic request built from a gateway event.
#[derive(Debug, Clone, Default)]
pub struct CanonicalRequest {
    /// HTTP method, absent when the event carries none
    pub method: Option<String>,
    /// Routed path, always starting with `/`
    pub url: String,
    pub query: HashMap<String, FieldValue>,
    /// Header names keep the casing they had in the event
    pub headers: HashMap<String, FieldValue>,
    /// Decoded body, absent when the event has no body
    pub payload: Option<Bytes>,
    pub remote_address: Option<String>,
    /// Ask the collaborator for a streamed response body
    pub payload_as_stream: bool,
    pub decoration: Option<RequestDecoration>,
}

impl CanonicalRequest {
    /// Looks up a header ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&FieldValue> {
        crate::utils::find_header(&self.headers, name)
    }

    /// The `{event, context}` view attached under `property_name`, if any.
    #[must_use]
    pub fn decoration(&self, property_name: &str) -> Option<&LambdaArguments> {
        self.decoration
            .as_ref()
            .filter(|decoration| decoration.name() == property_name)
            .map(RequestDecoration::arguments)
    }
}
