//! Invocation context handed to the adapter alongside each event.

use lambda_runtime::Context;
use serde::{Deserialize, Serialize};

/// Per-invocation metadata, serialized with the field names Lambda uses for
/// its context object.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    /// Completion-wait flag, overwritten by the adapter when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_waits_for_empty_event_loop: Option<bool>,
    pub function_name: String,
    pub function_version: String,
    pub invoked_function_arn: String,
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: String,
    pub aws_request_id: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    /// Deadline in milliseconds since the Unix epoch
    pub deadline_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xray_trace_id: Option<String>,
}

impl From<&Context> for InvocationContext {
    fn from(context: &Context) -> Self {
        let config = &context.env_config;
        Self {
            callback_waits_for_empty_event_loop: None,
            function_name: config.function_name.clone(),
            function_version: config.version.clone(),
            invoked_function_arn: context.invoked_function_arn.clone(),
            memory_limit_in_mb: config.memory.to_string(),
            aws_request_id: context.request_id.clone(),
            log_group_name: config.log_group.clone(),
            log_stream_name: config.log_stream.clone(),
            deadline_ms: context.deadline,
            xray_trace_id: context.xray_trace_id.clone(),
        }
    }
}
