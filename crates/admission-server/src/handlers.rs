//! Composable admission handlers.
//!
//! An [`AdmissionHandler`] turns an admission request into a response. A
//! [`Combinator`] wraps a handler into a new one adding some behavior (a
//! tracing span, metrics, the protection of managed resources...). Handlers
//! are assembled with a [`HandlerChain`], starting from the base handler and
//! going outward: the last combinator added is the first one to see the
//! request.
//!
//! Dropping the future returned by a handler cancels the whole chain.

use futures::future::{BoxFuture, FutureExt};
use std::{future::Future, sync::Arc};
use tokio::time::Instant;
use tracing::Span;

use crate::{admission_request::AdmissionRequest, admission_response::AdmissionResponse};

mod dump;
mod metrics;
mod operation_filter;
mod protect;
mod trace;

pub use dump::Dump;
pub use metrics::Metrics;
pub use operation_filter::OperationFilter;
pub use protect::{ControllerIdentity, MANAGED_RESOURCE_DENIED, Protection};
pub use trace::Trace;

pub trait AdmissionHandler: Send + Sync {
    /// Decide about `request`. `start_time` is the instant the request was
    /// received by the server.
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse>;
}

pub type SharedAdmissionHandler = Arc<dyn AdmissionHandler>;

pub struct HandlerFn<F>(F);

impl<F, Fut> AdmissionHandler for HandlerFn<F>
where
    F: Fn(Arc<AdmissionRequest>, Instant) -> Fut + Send + Sync,
    Fut: Future<Output = AdmissionResponse> + Send + 'static,
{
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        (self.0)(request, start_time).boxed()
    }
}

/// Turn an async function into a handler
pub fn handler_fn<F, Fut>(f: F) -> SharedAdmissionHandler
where
    F: Fn(Arc<AdmissionRequest>, Instant) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AdmissionResponse> + Send + 'static,
{
    Arc::new(HandlerFn(f))
}

/// Handler admitting every request
pub fn admit() -> SharedAdmissionHandler {
    handler_fn(|request: Arc<AdmissionRequest>, _| async move {
        AdmissionResponse::allow(request.uid.clone())
    })
}

pub trait Combinator {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler;
}

pub struct HandlerChain {
    handler: SharedAdmissionHandler,
}

impl HandlerChain {
    pub fn new(base: SharedAdmissionHandler) -> Self {
        Self { handler: base }
    }

    /// Wrap the handler built so far with `combinator`
    pub fn with(self, combinator: impl Combinator) -> Self {
        Self {
            handler: combinator.apply(self.handler),
        }
    }

    pub fn build(self) -> SharedAdmissionHandler {
        self.handler
    }
}

/// Span wrapping one stage of the admission chain.
///
/// `otel.name` carries the dynamic name exported to OpenTelemetry.
macro_rules! admission_span {
    ($name:literal, $otel_name:expr) => {
        tracing::info_span!(
            $name,
            otel.name = %$otel_name,
            host = crate::config::HOSTNAME.as_str(),
            request_uid = tracing::field::Empty,
            name = tracing::field::Empty,
            namespace = tracing::field::Empty,
            operation = tracing::field::Empty,
            subresource = tracing::field::Empty,
            kind_group = tracing::field::Empty,
            kind_version = tracing::field::Empty,
            kind = tracing::field::Empty,
            resource_group = tracing::field::Empty,
            resource_version = tracing::field::Empty,
            resource = tracing::field::Empty,
            user = tracing::field::Empty,
            allowed = tracing::field::Empty,
            mutated = tracing::field::Empty,
            response_code = tracing::field::Empty,
            response_message = tracing::field::Empty,
        )
    };
}
pub(crate) use admission_span;

pub(crate) fn populate_span_with_admission_request_data(span: &Span, adm_req: &AdmissionRequest) {
    span.record("kind", adm_req.kind.kind.as_str());
    span.record("kind_group", adm_req.kind.group.as_str());
    span.record("kind_version", adm_req.kind.version.as_str());
    span.record("name", adm_req.name.as_deref().unwrap_or_default());
    span.record("namespace", adm_req.namespace.as_deref().unwrap_or_default());
    span.record("operation", adm_req.operation.as_str());
    span.record("request_uid", adm_req.uid.as_str());
    span.record("resource", adm_req.resource.resource.as_str());
    span.record("resource_group", adm_req.resource.group.as_str());
    span.record("resource_version", adm_req.resource.version.as_str());
    span.record(
        "subresource",
        adm_req.sub_resource.as_deref().unwrap_or_default(),
    );
    span.record("user", adm_req.username());
}

pub(crate) fn populate_span_with_admission_response(span: &Span, response: &AdmissionResponse) {
    span.record("allowed", response.allowed);
    span.record("mutated", response.is_mutated());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            span.record("response_code", code);
        }
        if let Some(message) = &status.message {
            span.record("response_message", message.as_str());
        }
    }
}
