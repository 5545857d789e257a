// Load balancer event tests
#![allow(clippy::unwrap_used)]

use aws_lambda_http_adapter::Adapter;
use aws_lambda_http_adapter::http::service_fn;
use aws_lambda_http_adapter::models::{
    AdapterOptions, CanonicalRequest, CanonicalResponse, EventKind, FieldValue, GatewayEvent,
};
use aws_lambda_http_adapter::normalizer::normalize;
use serde_json::{Value, json};

fn elb_event(query: Value, multi: Option<Value>) -> Value {
    let mut event = json!({
        "requestContext": {"elb": {"targetGroupArn": "xxx"}},
        "httpMethod": "GET",
        "path": "/test",
        "queryStringParameters": query
    });
    if let Some(multi) = multi {
        event["multiValueQueryStringParameters"] = multi;
    }
    event
}

fn normalized(raw: &Value, options: &AdapterOptions) -> CanonicalRequest {
    normalize(&GatewayEvent::from_value(raw), raw, None, options)
}

#[test]
fn test_elb_event_detected() {
    let raw = elb_event(json!({}), None);
    assert_eq!(GatewayEvent::from_value(&raw).kind(), EventKind::LoadBalancer);
}

#[test]
fn test_encoded_query_values_decoded() {
    let raw = elb_event(json!({"q%24": "foo%3Fbar"}), None);
    let request = normalized(&raw, &AdapterOptions::default());
    assert_eq!(request.query["q$"], FieldValue::from("foo?bar"));
    assert!(!request.query.contains_key("q%24"));
}

#[test]
fn test_encoded_multi_value_query_decoded() {
    let raw = elb_event(
        json!({"q%24": "foo%3Fbar"}),
        Some(json!({"q%24": ["foo%40bar", "foo%3Fbar"]})),
    );
    let request = normalized(&raw, &AdapterOptions::default());
    assert_eq!(
        request.query["q$"],
        FieldValue::Multi(vec!["foo@bar".into(), "foo?bar".into()])
    );
}

#[test]
fn test_decoded_commas_split_for_v2() {
    let mut raw = elb_event(json!({"ids": "1%2C2", "name": "a%20b"}), None);
    let unversioned = normalized(&raw, &AdapterOptions::default());
    assert_eq!(unversioned.query["ids"], FieldValue::from("1,2"));

    raw["version"] = json!("2.0");
    let request = normalized(&raw, &AdapterOptions::default());
    assert_eq!(
        request.query["ids"],
        FieldValue::Multi(vec!["1".into(), "2".into()])
    );
    assert_eq!(request.query["name"], FieldValue::from("a b"));

    let disabled = normalized(
        &raw,
        &AdapterOptions::default().with_parse_comma_separated_query_params(false),
    );
    assert_eq!(disabled.query["ids"], FieldValue::from("1,2"));
}

#[test]
fn test_single_multi_value_header_needs_flag() {
    let raw = json!({
        "requestContext": {"elb": {"targetGroupArn": "xxx"}},
        "httpMethod": "GET",
        "path": "/test",
        "headers": {"X-My-Header": "wuuusaaa"},
        "multiValueHeaders": {
            "x-custom-multi-bad": ["100"],
            "x-custom-multi-gut": ["100", "200"]
        }
    });

    let request = normalized(&raw, &AdapterOptions::default());
    assert!(request.header("x-custom-multi-bad").is_none());
    assert!(request.header("x-custom-multi-gut").is_some());

    let request = normalized(&raw, &AdapterOptions::default().with_alb_multi_value_headers(true));
    assert_eq!(
        request.header("x-custom-multi-bad"),
        Some(&FieldValue::from("100"))
    );
}

#[tokio::test]
async fn test_alb_multi_value_headers_mirrored_in_reply() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        Ok(CanonicalResponse::new(200)
            .with_header("content-type", "text/plain")
            .with_header("set-cookie", vec!["qwerty=one", "qwerty=two"])
            .with_body("ok"))
    });
    let options = AdapterOptions::default().with_alb_multi_value_headers(true);
    let adapter = Adapter::new(service, options);

    let reply = adapter
        .handle(elb_event(json!({}), None), None)
        .await
        .into_buffered()
        .unwrap();

    let multi = reply.multi_value_headers.unwrap();
    assert_eq!(multi["content-type"], vec!["text/plain".to_string()]);
    assert_eq!(
        multi["set-cookie"],
        vec!["qwerty=one".to_string(), "qwerty=two".to_string()]
    );
    assert_eq!(reply.headers["content-type"], "text/plain");
}

#[tokio::test]
async fn test_alb_reply_without_flag_has_no_mirror() {
    let service = service_fn(|_request: CanonicalRequest| async move {
        Ok(CanonicalResponse::new(200).with_header("content-type", "text/plain"))
    });
    let adapter = Adapter::new(service, AdapterOptions::default());
    let reply = adapter
        .handle(elb_event(json!({}), None), None)
        .await
        .into_buffered()
        .unwrap();
    assert!(reply.multi_value_headers.is_none());
}
