use anyhow::{Result, anyhow};
use clap::ArgMatches;
use kube_instrumentation::MetricsConfiguration;
use lazy_static::lazy_static;
use std::{net::SocketAddr, path::PathBuf};

use crate::{admission_request::Operation, handlers::ControllerIdentity};

pub static SERVICE_NAME: &str = "kyverno-admission-controller";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub controller_identity: ControllerIdentity,
    pub protect_managed_resources: bool,
    pub dump_payloads: bool,
    pub metrics_enabled: bool,
    pub metrics_configuration: MetricsConfiguration,
    pub operations: Vec<Operation>,
    pub tracing: TracingConfig,
    pub ignore_kubernetes_connection_failure: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

/// Export of the spans to an OpenTelemetry collector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingConfig {
    pub enabled: bool,
    pub address: String,
    pub port: String,
    /// Secret holding the collector CA, plaintext export when unset
    pub creds: Option<String>,
}

impl TracingConfig {
    /// The collector endpoint, `None` when tracing is disabled
    pub fn endpoint(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let scheme = if self.creds.is_some() { "https" } else { "http" };
        Some(format!("{scheme}://{}:{}", self.address, self.port))
    }
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub client_ca_file: Vec<PathBuf>,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;

        let controller_identity = ControllerIdentity::new(
            string_arg(matches, "controller-namespace")?,
            string_arg(matches, "controller-service-account")?,
        );
        let metrics_configuration = match matches.get_one::<String>("metrics-config") {
            Some(path) => MetricsConfiguration::load(&PathBuf::from(path))?,
            None => MetricsConfiguration::default(),
        };
        let tracing = TracingConfig {
            enabled: flag(matches, "enable-tracing"),
            address: string_arg(matches, "tracing-address")?,
            port: string_arg(matches, "tracing-port")?,
            creds: Some(string_arg(matches, "tracing-creds")?).filter(|creds| !creds.is_empty()),
        };
        let operations = matches
            .get_many::<String>("admission-operations")
            .into_iter()
            .flatten()
            .map(|operation| operation.parse::<Operation>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("error parsing arguments: {e}"))?;

        Ok(Self {
            addr,
            tls_config,
            controller_identity,
            protect_managed_resources: flag(matches, "protect-managed-resources"),
            dump_payloads: flag(matches, "dump-payloads"),
            metrics_enabled: flag(matches, "enable-metrics"),
            metrics_configuration,
            operations,
            tracing,
            ignore_kubernetes_connection_failure: flag(
                matches,
                "ignore-kubernetes-connection-failure",
            ),
            log_level: string_arg(matches, "log-level")?,
            log_fmt: string_arg(matches, "log-fmt")?,
            log_no_color: flag(matches, "log-no-color"),
        })
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("error parsing arguments: --{id} is not set"))
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.get_flag(id)
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        string_arg(matches, "address")?,
        string_arg(matches, "port")?
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = string_arg(matches, "cert-file")?;
    let key_file = string_arg(matches, "key-file")?;
    if cert_file.is_empty() != key_file.is_empty() {
        return Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        ));
    }
    if cert_file.is_empty() {
        return Ok(None);
    }

    let client_ca_file = matches
        .get_many::<String>("client-ca-file")
        .map(|files| files.map(PathBuf::from).collect())
        .unwrap_or_default();

    Ok(Some(TlsConfig {
        cert_file: PathBuf::from(cert_file),
        key_file: PathBuf::from(key_file),
        client_ca_file,
    }))
}
