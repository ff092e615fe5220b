use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

use super::{AdmissionHandler, Combinator, SharedAdmissionHandler};
use crate::{
    admission_request::{AdmissionRequest, Operation},
    admission_response::AdmissionResponse,
};

/// Only hands to the inner handler the requests with one of the given
/// operations, every other request is allowed right away.
pub struct OperationFilter {
    operations: Vec<Operation>,
}

impl OperationFilter {
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
        }
    }
}

impl Combinator for OperationFilter {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler {
        Arc::new(Filtered {
            inner,
            operations: self.operations.clone(),
        })
    }
}

struct Filtered {
    inner: SharedAdmissionHandler,
    operations: Vec<Operation>,
}

impl AdmissionHandler for Filtered {
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        if self.operations.contains(&request.operation) {
            return self.inner.handle(request, start_time);
        }

        debug!(
            operation = request.operation.as_str(),
            "operation not handled, request allowed"
        );
        future::ready(AdmissionResponse::allow(request.uid.clone())).boxed()
    }
}
