use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{Instrument, error, info};

use super::{
    AdmissionHandler, Combinator, SharedAdmissionHandler, admission_span,
    populate_span_with_admission_request_data,
};
use crate::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse,
    resource::extract_resources,
};

pub const MANAGED_RESOURCE_DENIED: &str =
    "a kyverno managed resource can only be modified by kyverno";

/// Service account the controller runs as
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerIdentity {
    pub namespace: String,
    pub service_account: String,
}

impl ControllerIdentity {
    pub fn new(namespace: impl Into<String>, service_account: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service_account: service_account.into(),
        }
    }

    /// Username the API server reports for requests made by the controller
    pub fn username(&self) -> String {
        format!(
            "system:serviceaccount:{}:{}",
            self.namespace, self.service_account
        )
    }
}

/// Denies changes to controller managed resources issued by anybody but the
/// controller itself.
pub struct Protection {
    enabled: bool,
    controller_username: String,
}

impl Protection {
    pub fn new(enabled: bool, controller_username: impl Into<String>) -> Self {
        Self {
            enabled,
            controller_username: controller_username.into(),
        }
    }
}

impl Combinator for Protection {
    fn apply(&self, inner: SharedAdmissionHandler) -> SharedAdmissionHandler {
        if !self.enabled {
            return inner;
        }
        Arc::new(Protected {
            inner,
            controller_username: self.controller_username.clone(),
        })
    }
}

struct Protected {
    inner: SharedAdmissionHandler,
    controller_username: String,
}

impl Protected {
    fn check(&self, request: &AdmissionRequest) -> Option<AdmissionResponse> {
        let (new_resource, old_resource) = match extract_resources(None, request) {
            Ok(resources) => resources,
            Err(err) => {
                error!(error = %err, "failed to extract resources");
                return Some(AdmissionResponse::from_error(request.uid.clone(), err));
            }
        };

        // new first: its violation is the one reported when both match
        for resource in [new_resource, old_resource].iter().flatten() {
            if resource.is_managed_by_kyverno() && request.username() != self.controller_username
            {
                info!(
                    user = request.username(),
                    "access to the resource not authorized, this is a kyverno managed resource and should be altered only by kyverno"
                );
                return Some(AdmissionResponse::from_error(
                    request.uid.clone(),
                    MANAGED_RESOURCE_DENIED,
                ));
            }
        }
        None
    }
}

impl AdmissionHandler for Protected {
    fn handle(
        &self,
        request: Arc<AdmissionRequest>,
        start_time: Instant,
    ) -> BoxFuture<'_, AdmissionResponse> {
        let span = admission_span!(
            "protect",
            format!("PROTECT {} {}", request.operation, request.kind)
        );
        populate_span_with_admission_request_data(&span, &request);

        async move {
            if let Some(denied) = self.check(&request) {
                return denied;
            }
            self.inner.handle(request, start_time).await
        }
        .instrument(span)
        .boxed()
    }
}
