use anyhow::{Result, anyhow};
use k8s_openapi::api::core::v1::Secret;
use kube_instrumentation::{ApiProvider, Clientset, ResourceClient};
use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tonic::transport::{Certificate, ClientTlsConfig};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config;

// Setup the tracing system. This MUST be done inside of a tokio Runtime
// because some collectors rely on it and would panic otherwise.
//
// When `otlp_endpoint` is set, spans are also exported to an OpenTelemetry
// collector listening there, using GRPC. With `collector_ca`, the connection
// is TLS and the collector certificate is verified against that PEM bundle.
// The returned provider must be shut down before exiting, to flush the
// pending spans.
pub fn setup_tracing(
    log_level: &str,
    log_fmt: &str,
    log_no_color: bool,
    otlp_endpoint: Option<&str>,
    collector_ca: Option<&[u8]>,
) -> Result<Option<SdkTracerProvider>> {
    // setup logging
    let filter_layer = EnvFilter::new(log_level)
        // some of our dependencies generate trace events too, but we don't care about them ->
        // let's filter them
        .add_directive("h2=off".parse()?)
        .add_directive("hyper=off".parse()?)
        .add_directive("rustls=off".parse()?)
        .add_directive("tonic=off".parse()?)
        .add_directive("tower=off".parse()?);

    let tracer_provider = otlp_endpoint
        .map(|endpoint| -> Result<SdkTracerProvider> {
            let mut builder = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint);
            if let Some(ca) = collector_ca {
                builder = builder.with_tls_config(
                    ClientTlsConfig::new().ca_certificate(Certificate::from_pem(ca)),
                );
            }
            let exporter = builder.build()?;
            Ok(SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(
                    Resource::builder()
                        .with_service_name(config::SERVICE_NAME)
                        .build(),
                )
                .build())
        })
        .transpose()?;

    let telemetry = tracer_provider.as_ref().map(|provider| {
        global::set_tracer_provider(provider.clone());
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config::SERVICE_NAME))
    });

    match log_fmt {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(telemetry)
            .with(fmt::layer().json())
            .try_init()?,
        "text" => {
            let fmt_layer = fmt::layer().with_ansi(!log_no_color);

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(telemetry)
                .with(fmt_layer)
                .try_init()?
        }
        _ => return Err(anyhow!("Unknown log message format")),
    };

    Ok(tracer_provider)
}

/// Key of the collector CA inside the tracing credentials secret
pub const COLLECTOR_CA_KEY: &str = "ca.crt";

/// Read the CA of the OpenTelemetry collector from the `secret_name` secret.
pub async fn fetch_collector_ca<C: ApiProvider>(
    clientset: &Clientset<C>,
    namespace: &str,
    secret_name: &str,
) -> Result<Vec<u8>> {
    let secret = clientset
        .core_v1()
        .secrets(namespace)
        .get(secret_name)
        .await
        .map_err(|e| anyhow!("cannot read tracing credentials {namespace}/{secret_name}: {e}"))?;
    collector_ca_from_secret(&secret)
}

fn collector_ca_from_secret(secret: &Secret) -> Result<Vec<u8>> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(COLLECTOR_CA_KEY))
        .map(|ca| ca.0.clone())
        .filter(|ca| !ca.is_empty())
        .ok_or_else(|| {
            anyhow!(
                "tracing credentials {} have no {COLLECTOR_CA_KEY} entry",
                secret.metadata.name.as_deref().unwrap_or_default()
            )
        })
}
