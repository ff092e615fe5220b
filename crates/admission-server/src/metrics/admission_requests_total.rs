use lazy_static::lazy_static;
use opentelemetry::{KeyValue, metrics::Counter};

use super::AdmissionRequest;

lazy_static! {
    static ref ADMISSION_REQUESTS_TOTAL: Counter<u64> =
        opentelemetry::global::meter(super::METER_NAME)
            .u64_counter("kyverno_admission_requests_total")
            .with_description("number of admission requests processed")
            .build();
}

pub(crate) fn add_admission_request(admission_request: &AdmissionRequest) {
    ADMISSION_REQUESTS_TOTAL.add(1, &Into::<Vec<KeyValue>>::into(admission_request));
}
