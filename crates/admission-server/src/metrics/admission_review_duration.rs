use lazy_static::lazy_static;
use opentelemetry::{KeyValue, metrics::Histogram};
use std::time::Duration;

use super::AdmissionRequest;

lazy_static! {
    static ref ADMISSION_REVIEW_DURATION: Histogram<f64> =
        opentelemetry::global::meter(super::METER_NAME)
            .f64_histogram("kyverno_admission_review_duration_seconds")
            .with_unit("s")
            .with_description("time taken to review an admission request")
            .build();
}

pub(crate) fn record_admission_review_duration(
    duration: Duration,
    admission_request: &AdmissionRequest,
) {
    ADMISSION_REVIEW_DURATION.record(
        duration.as_secs_f64(),
        &Into::<Vec<KeyValue>>::into(admission_request),
    );
}
