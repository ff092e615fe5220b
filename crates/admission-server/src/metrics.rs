use anyhow::Result;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{ExportConfig, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

mod admission_requests_total;
pub(crate) use admission_requests_total::add_admission_request;
mod admission_review_duration;
pub(crate) use admission_review_duration::record_admission_review_duration;

const METER_NAME: &str = "kyverno";

/// Install a global meter provider exporting through OTLP.
///
/// The provider is returned so that it can be shut down, flushing the last
/// data points.
pub fn setup_metrics() -> Result<SdkMeterProvider> {
    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_export_config(ExportConfig::default())
        .build()?;

    let periodic_reader = PeriodicReader::builder(metric_exporter).build();
    let meter_provider = SdkMeterProvider::builder()
        .with_reader(periodic_reader)
        .build();

    global::set_meter_provider(meter_provider.clone());
    Ok(meter_provider)
}

#[derive(Clone)]
pub(crate) struct AdmissionRequest {
    pub(crate) resource_kind: String,
    pub(crate) resource_namespace: Option<String>,
    pub(crate) resource_request_operation: &'static str,
    pub(crate) allowed: bool,
}

#[allow(clippy::from_over_into)]
impl Into<Vec<KeyValue>> for &AdmissionRequest {
    fn into(self) -> Vec<KeyValue> {
        let mut baggage = vec![
            KeyValue::new("resource_kind", self.resource_kind.clone()),
            KeyValue::new("resource_request_operation", self.resource_request_operation),
            KeyValue::new("allowed", self.allowed),
        ];
        if let Some(resource_namespace) = &self.resource_namespace {
            baggage.push(KeyValue::new(
                "resource_namespace",
                resource_namespace.clone(),
            ));
        }
        baggage
    }
}
