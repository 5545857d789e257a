use aws_lambda_http_adapter::Adapter;
use aws_lambda_http_adapter::http::ProxyCollaborator;
use aws_lambda_http_adapter::models::AdapterOptions;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Use Lambda runtime's built-in tracing subscriber for CloudWatch Logs
    lambda_runtime::tracing::init_default_subscriber();

    let options = AdapterOptions::from_env()?;
    let adapter = Arc::new(Adapter::new(ProxyCollaborator::from_env()?, options));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let adapter = Arc::clone(&adapter);
        async move { adapter.invoke(event).await }
    }))
    .await
}
