use admission_server::{
    AdmissionServer,
    admission_request::Operation,
    config::{Config, TracingConfig},
    handlers::ControllerIdentity,
};
use axum::Router;
use kube_instrumentation::MetricsConfiguration;
use std::net::SocketAddr;

pub(crate) const CONTROLLER_USERNAME: &str =
    "system:serviceaccount:kyverno:kyverno-admission-controller";

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        controller_identity: ControllerIdentity::new("kyverno", "kyverno-admission-controller"),
        protect_managed_resources: true,
        dump_payloads: false,
        metrics_enabled: false,
        metrics_configuration: MetricsConfiguration::default(),
        operations: vec![
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::Connect,
        ],
        tracing: TracingConfig {
            enabled: false,
            address: "127.0.0.1".to_owned(),
            port: "4317".to_owned(),
            creds: None,
        },
        ignore_kubernetes_connection_failure: true,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

/// The API router, without a Kubernetes connection
pub(crate) fn app(config: Config) -> Router {
    AdmissionServer::new(config, None).router()
}
