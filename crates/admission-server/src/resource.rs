use k8s_openapi::apimachinery::pkg::{apis::meta::v1::ObjectMeta, runtime::RawExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::admission_request::{AdmissionRequest, GroupVersionKind};

pub const LABEL_APP_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const VALUE_KYVERNO_APP: &str = "kyverno";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to convert new raw to unstructured: {0}")]
    NewResource(#[source] serde_json::Error),

    #[error("failed to convert old raw to unstructured: {0}")]
    OldResource(#[source] serde_json::Error),
}

/// A Kubernetes object of any kind: typed metadata plus the rest of the
/// document as plain JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unstructured {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Unstructured {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    /// Whether the object is owned by the controller
    pub fn is_managed_by_kyverno(&self) -> bool {
        self.label(LABEL_APP_MANAGED_BY) == Some(VALUE_KYVERNO_APP)
    }

    fn set_group_version_kind(&mut self, gvk: &GroupVersionKind) {
        self.api_version = gvk.api_version();
        self.kind = gvk.kind.clone();
    }
}

/// Decode the new and old objects carried by `request`.
///
/// Absent or `null` objects are returned as `None`. Decoded objects get the
/// expected kind (the request kind when none is given) and the request
/// namespace, if any.
pub fn extract_resources(
    expected_gvk: Option<&GroupVersionKind>,
    request: &AdmissionRequest,
) -> Result<(Option<Unstructured>, Option<Unstructured>), ExtractionError> {
    let gvk = expected_gvk.unwrap_or(&request.kind);

    let new_resource = decode(request.object.as_ref())
        .map_err(ExtractionError::NewResource)?
        .map(|resource| stamp(resource, gvk, request.namespace.as_deref()));
    let old_resource = decode(request.old_object.as_ref())
        .map_err(ExtractionError::OldResource)?
        .map(|resource| stamp(resource, gvk, request.namespace.as_deref()));

    Ok((new_resource, old_resource))
}

fn decode(raw: Option<&RawExtension>) -> Result<Option<Unstructured>, serde_json::Error> {
    match raw {
        None => Ok(None),
        Some(RawExtension(Value::Null)) => Ok(None),
        Some(RawExtension(value)) => serde_json::from_value(value.clone()).map(Some),
    }
}

fn stamp(
    mut resource: Unstructured,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
) -> Unstructured {
    resource.set_group_version_kind(gvk);
    if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
        resource.metadata.namespace = Some(namespace.to_owned());
    }
    resource
}
