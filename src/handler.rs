use lambda_runtime::tracing::{debug, error, info, warn};
use lambda_runtime::{Error, FunctionResponse, LambdaEvent, MetadataPrelude, StreamResponse};
use serde_json::Value;
use std::sync::Arc;

use crate::decoration::{self, LambdaArguments, RequestDecoration};
use crate::http::ServingCollaborator;
use crate::models::context::InvocationContext;
use crate::models::event::GatewayEvent;
use crate::models::options::AdapterOptions;
use crate::models::response::{BodyStream, GatewayReply, GatewayResponse, StreamingResponse};
use crate::normalizer::normalize;
use crate::shaper::{failure_reply, shape};

/// Reply type handed back to the Lambda runtime.
pub type LambdaReply = FunctionResponse<GatewayResponse, BodyStream>;

/// Translates gateway events into requests for a serving collaborator and
/// its responses back into gateway replies.
///
/// Build one per process and share it; invocations hold no state in the
/// adapter, so concurrent calls are independent.
pub struct Adapter<S> {
    service: S,
    options: AdapterOptions,
}

impl<S: ServingCollaborator> Adapter<S> {
    #[must_use]
    pub const fn new(service: S, options: AdapterOptions) -> Self {
        Self { service, options }
    }

    #[must_use]
    pub const fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Serves one gateway event.
    ///
    /// Never fails: a serving error is logged and answered with a 500 reply.
    /// When `callback_waits_for_empty_event_loop` is configured, the flag is
    /// written into `context` before serving.
    pub async fn handle(
        &self,
        mut event: Value,
        context: Option<&mut InvocationContext>,
    ) -> GatewayReply {
        let context = context.map(|ctx| {
            if let Some(wait) = self.options.callback_waits_for_empty_event_loop {
                ctx.callback_waits_for_empty_event_loop = Some(wait);
            }
            ctx.clone()
        });

        let typed = GatewayEvent::from_value(&event);
        let mut request = normalize(&typed, &event, context.as_ref(), &self.options);
        info!(
            method = request.method.as_deref().unwrap_or("-"),
            url = %request.url,
            "Serving gateway request"
        );
        debug!(payload = ?event, "Gateway event");

        // The decorated event drops its body along with the serialized copy
        if self.options.serialize_lambda_arguments
            && let Some(fields) = event.as_object_mut()
        {
            fields.shift_remove("body");
        }

        let outcome = if self.options.decorate_request {
            let arguments = Arc::new(LambdaArguments::new(event, context));
            request.decoration = Some(RequestDecoration::new(
                self.options.decoration_property_name.clone(),
                Arc::clone(&arguments),
            ));
            decoration::scope(arguments, self.service.serve(request)).await
        } else {
            self.service.serve(request).await
        };

        match outcome {
            Ok(response) => shape(response, &typed, &self.options),
            Err(e) => {
                // Use {:#} to get the full error chain with causes
                error!(error = %format!("{e:#}"), "Serving collaborator failed");
                failure_reply(&self.options)
            }
        }
    }

    /// Serves one gateway event and hands the reply to `callback` before
    /// returning it.
    pub async fn handle_with_callback<F>(
        &self,
        event: Value,
        context: Option<&mut InvocationContext>,
        callback: F,
    ) -> GatewayReply
    where
        F: FnOnce(&GatewayReply),
    {
        let reply = self.handle(event, context).await;
        callback(&reply);
        reply
    }

    /// Lambda runtime entry point.
    ///
    /// # Errors
    ///
    /// Never returns an error today; the signature matches what
    /// `lambda_runtime::service_fn` expects.
    pub async fn invoke(&self, event: LambdaEvent<Value>) -> Result<LambdaReply, Error> {
        let (payload, runtime_context) = event.into_parts();
        let mut context = InvocationContext::from(&runtime_context);
        let reply = self.handle(payload, Some(&mut context)).await;
        Ok(into_lambda_reply(reply))
    }
}

/// Converts a reply into the runtime's buffered or streaming response.
///
/// Streaming metadata carries status, headers and cookies; headers the HTTP
/// types reject are dropped with a warning.
#[must_use]
pub fn into_lambda_reply(reply: GatewayReply) -> LambdaReply {
    match reply {
        GatewayReply::Buffered(response) => FunctionResponse::BufferedResponse(response),
        GatewayReply::Streaming(response) => {
            FunctionResponse::StreamingResponse(into_stream_response(response))
        }
    }
}

fn into_stream_response(response: StreamingResponse) -> StreamResponse<BodyStream> {
    let StreamingResponse { meta, stream } = response;

    let mut prelude = MetadataPrelude::default();
    prelude.status_code = http::StatusCode::from_u16(meta.status_code)
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &meta.headers {
        match (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                prelude.headers.append(name, value);
            }
            _ => warn!(header = %name, "Dropping header that is not valid HTTP"),
        }
    }
    prelude.cookies = meta.cookies.unwrap_or_default();

    StreamResponse {
        metadata_prelude: prelude,
        stream,
    }
}
