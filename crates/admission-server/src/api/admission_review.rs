use serde::{Deserialize, Serialize};

use crate::{admission_request::AdmissionRequest, admission_response::AdmissionResponse};

pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn new(response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(String::from(ADMISSION_REVIEW_API_VERSION)),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            response,
        }
    }

    /// Reply to a review using the same envelope the API server sent, the
    /// API server rejects replies of a different version.
    pub fn reply_to(
        api_version: Option<String>,
        kind: Option<String>,
        response: AdmissionResponse,
    ) -> Self {
        AdmissionReviewResponse {
            api_version: Some(
                api_version.unwrap_or_else(|| String::from(ADMISSION_REVIEW_API_VERSION)),
            ),
            kind: Some(kind.unwrap_or_else(|| String::from(ADMISSION_REVIEW_KIND))),
            response,
        }
    }
}
