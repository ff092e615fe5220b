use axum::{
    extract::{self, FromRequest},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

use crate::api::{
    admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
    api_error::ApiError,
    state::ApiServerState,
};

// an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(pub(crate) T);

impl<T: Serialize> IntoResponse for JsonExtractor<T> {
    fn into_response(self) -> axum::response::Response {
        let Self(value) = self;
        axum::Json(value).into_response()
    }
}

/// Run the admission chain against the request carried by the review.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> JsonExtractor<AdmissionReviewResponse> {
    let start_time = Instant::now();
    let AdmissionReviewRequest {
        api_version,
        kind,
        request,
    } = admission_review;
    let request = Arc::new(request);
    debug!(request_uid = request.uid.as_str(), "admission review received");

    let mut response = state.handler.handle(request.clone(), start_time).await;
    // the API server rejects reviews whose uid differs from the request one
    response.uid = request.uid.clone();

    JsonExtractor(AdmissionReviewResponse::reply_to(
        api_version,
        kind,
        response,
    ))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}
