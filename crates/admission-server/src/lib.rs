pub mod admission_request;
pub mod admission_response;
pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod resource;
pub mod tracing;

#[cfg(test)]
mod test_utils;

use ::tracing::{info, warn};
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use kube_instrumentation::{
    ClientType, Clientset, OtelMetricsManager, ResourceClient, SharedMetricsManager,
};
use std::{net::SocketAddr, sync::Arc};

use crate::{
    api::{
        handlers::{readiness_handler, validate_handler},
        state::ApiServerState,
    },
    certs::create_tls_config_and_watch_certificate_changes,
    config::{Config, TlsConfig},
    handlers::{
        ControllerIdentity, Dump, HandlerChain, Metrics, OperationFilter, Protection,
        SharedAdmissionHandler, Trace, admit,
    },
};

pub struct AdmissionServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
    clientset: Option<Clientset>,
    controller_identity: ControllerIdentity,
}

impl AdmissionServer {
    pub fn new(config: Config, clientset: Option<Clientset>) -> Self {
        let handler = build_handler(&config);
        let state = Arc::new(ApiServerState { handler });

        Self {
            router: api_router(state),
            addr: config.addr,
            tls_config: config.tls_config,
            clientset,
            controller_identity: config.controller_identity,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        if let Some(clientset) = &self.clientset {
            verify_controller_identity(clientset, &self.controller_identity).await;
        }

        match self.tls_config {
            Some(tls_config) => {
                let rustls_config =
                    create_tls_config_and_watch_certificate_changes(tls_config).await?;
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(self.addr).await?;
                info!(address = %self.addr, "started HTTP server");
                axum::serve(listener, self.router).await?;
            }
        }

        Ok(())
    }
}

/// Connect to Kubernetes, every query made by the server goes through the
/// instrumented clientset.
pub async fn connect_to_kubernetes(config: &Config) -> kube::Result<Clientset> {
    let manager: Option<SharedMetricsManager> = if config.metrics_enabled {
        Some(Arc::new(OtelMetricsManager::new(
            config.metrics_configuration.clone(),
        )))
    } else {
        None
    };
    let client = kube::Client::try_default().await?;

    Ok(Clientset::wrap(client, manager, ClientType::ControllerClient))
}

/// The admission chain served by `/validate`
pub fn build_handler(config: &Config) -> SharedAdmissionHandler {
    HandlerChain::new(admit())
        .with(Protection::new(
            config.protect_managed_resources,
            config.controller_identity.username(),
        ))
        .with(OperationFilter::new(config.operations.iter().copied()))
        .with(Dump::new(config.dump_payloads))
        .with(Metrics)
        .with(Trace)
        .build()
}

fn api_router(state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route("/validate", post(validate_handler))
        .route("/readiness", get(readiness_handler))
        .with_state(state)
}

/// Warn when the service account the protection relies on does not exist.
async fn verify_controller_identity(clientset: &Clientset, identity: &ControllerIdentity) {
    match clientset
        .core_v1()
        .service_accounts(&identity.namespace)
        .get(&identity.service_account)
        .await
    {
        Ok(_) => info!(
            username = identity.username().as_str(),
            "controller identity verified"
        ),
        Err(e) => warn!(
            username = identity.username().as_str(),
            error = %e,
            "cannot find the controller service account"
        ),
    }
}
