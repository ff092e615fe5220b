use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{AdmissionHandler, Combinator, SharedAdmissionHandler};
use crate::{admission_request::AdmissionRequest, admission_response::AdmissionResponse};

/// Logs the full admission request and response at debug level
pub struct Dump {
    enabled: bool,
}

impl Dump {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Combinator for Dump {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler {
        if !self.enabled {
            return inner;
        }
        Arc::new(Dumped { inner })
    }
}

struct Dumped {
    inner: SharedAdmissionHandler,
}

impl AdmissionHandler for Dumped {
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        async move {
            match serde_json::to_string(&*request) {
                Ok(payload) => debug!(request = payload.as_str(), "admission request"),
                Err(e) => warn!(error = %e, "cannot serialize admission request"),
            }

            let response = self.inner.handle(request, start_time).await;

            match serde_json::to_string(&response) {
                Ok(payload) => debug!(response = payload.as_str(), "admission response"),
                Err(e) => warn!(error = %e, "cannot serialize admission response"),
            }
            response
        }
        .boxed()
    }
}
