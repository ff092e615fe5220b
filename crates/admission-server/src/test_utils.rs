use serde_json::{Value, json};

use crate::{admission_request::AdmissionRequest, api::admission_review::AdmissionReviewRequest};

pub(crate) const CONTROLLER_USERNAME: &str =
    "system:serviceaccount:kyverno:kyverno-admission-controller";

/// A request for a ConfigMap in the `team-a` namespace, issued by `alice`
pub(crate) fn admission_request(
    operation: &str,
    object: Option<Value>,
    old_object: Option<Value>,
) -> AdmissionRequest {
    let mut request = json!({
        "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
        "kind": {"group": "", "version": "v1", "kind": "ConfigMap"},
        "resource": {"group": "", "version": "v1", "resource": "configmaps"},
        "name": "settings",
        "namespace": "team-a",
        "operation": operation,
        "userInfo": {
            "username": "alice",
            "groups": ["system:authenticated"]
        }
    });
    if let Some(object) = object {
        request["object"] = object;
    }
    if let Some(old_object) = old_object {
        request["oldObject"] = old_object;
    }

    serde_json::from_value(request).expect("deserialization should work")
}

pub(crate) fn issued_by(mut request: AdmissionRequest, username: &str) -> AdmissionRequest {
    request.user_info.username = Some(username.to_owned());
    request
}

pub(crate) fn managed_config_map() -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": "settings",
            "labels": { "app.kubernetes.io/managed-by": "kyverno" }
        }
    })
}

pub(crate) fn unmanaged_config_map() -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": "settings", "labels": { "app": "web" } }
    })
}

pub(crate) fn build_admission_review_request() -> AdmissionReviewRequest {
    let input = r#"
            {
                "apiVersion": "admission.k8s.io/v1",
                "kind": "AdmissionReview",
                "request": {
                    "uid": "hello",
                    "kind": {"group":"autoscaling","version":"v1","kind":"Scale"},
                    "resource": {"group":"apps","version":"v1","resource":"deployments"},
                    "subResource": "scale",
                    "requestKind": {"group":"autoscaling","version":"v1","kind":"Scale"},
                    "requestResource": {"group":"apps","version":"v1","resource":"deployments"},
                    "requestSubResource": "scale",
                    "name": "my-deployment",
                    "namespace": "my-namespace",
                    "operation": "UPDATE",
                    "userInfo": {
                      "username": "admin",
                      "uid": "014fbff9a07c",
                      "groups": ["system:authenticated","my-admin-group"],
                      "extra": {
                        "some-key":["some-value1", "some-value2"]
                      }
                    },
                    "object": {"apiVersion":"autoscaling/v1","kind":"Scale"},
                    "oldObject": {"apiVersion":"autoscaling/v1","kind":"Scale"},
                    "options": {"apiVersion":"meta.k8s.io/v1","kind":"UpdateOptions"},
                    "dryRun": false
                }
            }
        "#;

    serde_json::from_str(input).expect("deserialization should work")
}
