//! Request context decoration.
//!
//! While a request is being served, the raw event and invocation context are
//! reachable two ways: attached to the [`CanonicalRequest`] under the
//! configured property name, and through [`current`] from anywhere inside
//! the serving future. Both are scoped to a single invocation and disappear
//! as soon as the serving future completes, so overlapping invocations of one
//! adapter never see each other's arguments.
//!
//! [`CanonicalRequest`]: crate::models::CanonicalRequest

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::models::context::InvocationContext;

tokio::task_local! {
    static CURRENT_ARGUMENTS: Arc<LambdaArguments>;
}

/// Read-only `{event, context}` view of the invocation being served.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaArguments {
    event: Value,
    context: Option<InvocationContext>,
}

impl LambdaArguments {
    #[must_use]
    pub const fn new(event: Value, context: Option<InvocationContext>) -> Self {
        Self { event, context }
    }

    /// The gateway event as received, minus its `body` when lambda arguments
    /// are serialized into request headers.
    #[must_use]
    pub const fn event(&self) -> &Value {
        &self.event
    }

    #[must_use]
    pub const fn context(&self) -> Option<&InvocationContext> {
        self.context.as_ref()
    }
}

/// Arguments attached to a request under a property name.
#[derive(Debug, Clone)]
pub struct RequestDecoration {
    name: String,
    arguments: Arc<LambdaArguments>,
}

impl RequestDecoration {
    #[must_use]
    pub const fn new(name: String, arguments: Arc<LambdaArguments>) -> Self {
        Self { name, arguments }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &LambdaArguments {
        &self.arguments
    }
}

/// Arguments of the invocation currently being served on this task, if any.
#[must_use]
pub fn current() -> Option<Arc<LambdaArguments>> {
    CURRENT_ARGUMENTS.try_with(Arc::clone).ok()
}

/// Runs `future` with `arguments` visible through [`current`].
pub async fn scope<F>(arguments: Arc<LambdaArguments>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_ARGUMENTS.scope(arguments, future).await
}
