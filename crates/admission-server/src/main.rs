use std::process;

use admission_server::{
    AdmissionServer, cli,
    config::Config,
    connect_to_kubernetes,
    metrics::setup_metrics,
    tracing::{fetch_collector_ca, setup_tracing},
};
use anyhow::{Result, anyhow};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the rustls crypto provider"))?;

    // The tracing credentials live in a secret, the connection to Kubernetes
    // has to be ready before the span exporter.
    let connection = connect_to_kubernetes(&config).await;

    let collector_ca = match (&config.tracing.creds, &connection) {
        (Some(creds), Ok(clientset)) if config.tracing.enabled => Some(
            fetch_collector_ca(clientset, &config.controller_identity.namespace, creds).await?,
        ),
        (Some(creds), Err(e)) if config.tracing.enabled => {
            return Err(anyhow!("Cannot read the tracing credentials {creds}: {e}"));
        }
        _ => None,
    };

    let tracer_provider = setup_tracing(
        &config.log_level,
        &config.log_fmt,
        config.log_no_color,
        config.tracing.endpoint().as_deref(),
        collector_ca.as_deref(),
    )?;
    info!(
        enabled = config.tracing.enabled,
        address = config.tracing.address.as_str(),
        port = config.tracing.port.as_str(),
        creds = config.tracing.creds.as_deref().unwrap_or_default(),
        "setup tracing..."
    );
    debug!("tracing system ready");

    let meter_provider = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let clientset = match connection {
        Ok(clientset) => Ok(Some(clientset)),
        Err(e) if config.ignore_kubernetes_connection_failure => {
            warn!(
                error = %e,
                "Cannot connect to Kubernetes, the controller identity will not be verified"
            );
            Ok(None)
        }
        Err(e) => Err(anyhow!("Cannot connect to Kubernetes: {e}")),
    };

    let result = match clientset {
        Ok(clientset) => AdmissionServer::new(config, clientset).run().await,
        Err(e) => Err(e),
    };

    if let Some(meter_provider) = meter_provider {
        if let Err(e) = meter_provider.shutdown() {
            error!(error = %e, "cannot shut down the meter provider");
        }
    }
    if let Some(tracer_provider) = tracer_provider {
        if let Err(e) = tracer_provider.shutdown() {
            eprintln!("cannot shut down the tracer provider: {e}");
        }
    }

    if let Err(e) = result {
        error!(error = %e, "admission server failed");
        process::exit(1);
    }

    Ok(())
}
