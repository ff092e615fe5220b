use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::time::Instant;

use super::{AdmissionHandler, Combinator, SharedAdmissionHandler};
use crate::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse, metrics,
};

/// Counts the admission requests and measures how long the review took
pub struct Metrics;

impl Combinator for Metrics {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler {
        Arc::new(Measured { inner })
    }
}

struct Measured {
    inner: SharedAdmissionHandler,
}

impl AdmissionHandler for Measured {
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        async move {
            let response = self.inner.handle(request.clone(), start_time).await;

            let admission_request = metrics::AdmissionRequest {
                resource_kind: request.kind.kind.clone(),
                resource_namespace: request.namespace.clone(),
                resource_request_operation: request.operation.as_str(),
                allowed: response.allowed,
            };
            metrics::add_admission_request(&admission_request);
            metrics::record_admission_review_duration(start_time.elapsed(), &admission_request);

            response
        }
        .boxed()
    }
}
