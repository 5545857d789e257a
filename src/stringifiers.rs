//! Fixed-order event serialization for the `x-apigateway-event` header.
//!
//! Payload format `1.0` and `2.0` events are written with a fixed field order
//! and unknown fields dropped. Values are copied as they are, so `null`
//! entries and map-like fields (`headers`, `pathParameters`, ...) pass
//! through unchanged. Events of any other version are written as received.

use serde_json::{Map, Value};

/// Shape of a serialized field.
#[derive(Debug)]
enum Shape {
    /// Copied verbatim
    Any,
    /// Object with a fixed field order
    Object(&'static [(&'static str, Shape)]),
}

const CLIENT_CERT: Shape = Shape::Object(&[
    ("clientCertPem", Shape::Any),
    ("subjectDN", Shape::Any),
    ("issuerDN", Shape::Any),
    ("serialNumber", Shape::Any),
    (
        "validity",
        Shape::Object(&[("notBefore", Shape::Any), ("notAfter", Shape::Any)]),
    ),
]);

const V1: Shape = Shape::Object(&[
    ("version", Shape::Any),
    ("resource", Shape::Any),
    ("path", Shape::Any),
    ("httpMethod", Shape::Any),
    ("headers", Shape::Any),
    ("multiValueHeaders", Shape::Any),
    ("queryStringParameters", Shape::Any),
    ("multiValueQueryStringParameters", Shape::Any),
    (
        "requestContext",
        Shape::Object(&[
            ("accountId", Shape::Any),
            ("apiId", Shape::Any),
            (
                "authorizer",
                Shape::Object(&[("claims", Shape::Any), ("scopes", Shape::Any)]),
            ),
            ("domainName", Shape::Any),
            ("domainPrefix", Shape::Any),
            ("extendedRequestId", Shape::Any),
            ("httpMethod", Shape::Any),
            (
                "identity",
                Shape::Object(&[
                    ("accessKey", Shape::Any),
                    ("accountId", Shape::Any),
                    ("caller", Shape::Any),
                    ("cognitoAuthenticationProvider", Shape::Any),
                    ("cognitoAuthenticationType", Shape::Any),
                    ("cognitoIdentityId", Shape::Any),
                    ("cognitoIdentityPoolId", Shape::Any),
                    ("principalOrgId", Shape::Any),
                    ("sourceIp", Shape::Any),
                    ("user", Shape::Any),
                    ("userAgent", Shape::Any),
                    ("userArn", Shape::Any),
                    ("clientCert", CLIENT_CERT),
                ]),
            ),
            ("path", Shape::Any),
            ("protocol", Shape::Any),
            ("requestId", Shape::Any),
            ("requestTime", Shape::Any),
            ("requestTimeEpoch", Shape::Any),
            ("resourceId", Shape::Any),
            ("resourcePath", Shape::Any),
            ("stage", Shape::Any),
        ]),
    ),
    ("pathParameters", Shape::Any),
    ("stageVariables", Shape::Any),
    ("body", Shape::Any),
    ("isBase64Encoded", Shape::Any),
]);

const V2: Shape = Shape::Object(&[
    ("version", Shape::Any),
    ("routeKey", Shape::Any),
    ("rawPath", Shape::Any),
    ("rawQueryString", Shape::Any),
    ("cookies", Shape::Any),
    ("headers", Shape::Any),
    ("queryStringParameters", Shape::Any),
    (
        "requestContext",
        Shape::Object(&[
            ("accountId", Shape::Any),
            ("apiId", Shape::Any),
            (
                "authentication",
                Shape::Object(&[("clientCert", CLIENT_CERT)]),
            ),
            (
                "authorizer",
                Shape::Object(&[(
                    "jwt",
                    Shape::Object(&[("claims", Shape::Any), ("scopes", Shape::Any)]),
                )]),
            ),
            ("domainName", Shape::Any),
            ("domainPrefix", Shape::Any),
            (
                "http",
                Shape::Object(&[
                    ("method", Shape::Any),
                    ("path", Shape::Any),
                    ("protocol", Shape::Any),
                    ("sourceIp", Shape::Any),
                    ("userAgent", Shape::Any),
                ]),
            ),
            ("requestId", Shape::Any),
            ("routeKey", Shape::Any),
            ("stage", Shape::Any),
            ("time", Shape::Any),
            ("timeEpoch", Shape::Any),
        ]),
    ),
    ("body", Shape::Any),
    ("pathParameters", Shape::Any),
    ("isBase64Encoded", Shape::Any),
    ("stageVariables", Shape::Any),
]);

fn project(value: &Value, shape: &Shape) -> Value {
    match (shape, value) {
        (Shape::Object(fields), Value::Object(source)) => {
            let mut target = Map::with_capacity(fields.len());
            for (name, field_shape) in *fields {
                if let Some(field) = source.get(*name) {
                    target.insert((*name).to_string(), project(field, field_shape));
                }
            }
            Value::Object(target)
        }
        _ => value.clone(),
    }
}

/// Serializes an event with the fixed layout of its payload format version,
/// or `None` when the version has no fixed layout.
#[must_use]
pub fn stringify(version: &str, event: &Value) -> Option<String> {
    let shape = match version {
        "1.0" => &V1,
        "2.0" => &V2,
        _ => return None,
    };
    Some(project(event, shape).to_string())
}

/// Serializes an event for the `x-apigateway-event` header, choosing the
/// layout from its `version` field.
#[must_use]
pub fn stringify_event(event: &Value) -> String {
    event
        .get("version")
        .and_then(Value::as_str)
        .and_then(|version| stringify(version, event))
        .unwrap_or_else(|| event.to_string())
}
