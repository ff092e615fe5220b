use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{Instrument, Span};

use super::{
    AdmissionHandler, Combinator, SharedAdmissionHandler, admission_span,
    populate_span_with_admission_request_data, populate_span_with_admission_response,
};
use crate::{admission_request::AdmissionRequest, admission_response::AdmissionResponse};

/// Wraps the whole admission in a `ADMISSION <operation> <kind>` span
pub struct Trace;

impl Combinator for Trace {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler {
        Arc::new(Traced { inner })
    }
}

struct Traced {
    inner: SharedAdmissionHandler,
}

impl AdmissionHandler for Traced {
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        let span = admission_span!(
            "admission",
            format!("ADMISSION {} {}", request.operation, request.kind)
        );
        populate_span_with_admission_request_data(&span, &request);

        async move {
            let response = self.inner.handle(request, start_time).await;
            populate_span_with_admission_response(&Span::current(), &response);
            response
        }
        .instrument(span)
        .boxed()
    }
}
