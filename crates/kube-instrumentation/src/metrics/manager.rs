use serde::Deserialize;
use std::{fs::File, path::Path};
use tracing::trace;

use super::{ClientQuery, ClientQueryOperation, ClientType, MetricsConfigManager, add_client_query};
use crate::errors::MetricsConfigError;

/// Namespaces taken into account when recording namespaced queries.
///
/// An empty `include` list means every namespace. `exclude` always wins.
/// The `*` entry matches any namespace.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamespacesConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfiguration {
    #[serde(default)]
    pub namespaces: NamespacesConfig,
}

impl MetricsConfiguration {
    pub fn load(path: &Path) -> Result<Self, MetricsConfigError> {
        let file = File::open(path).map_err(|e| MetricsConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = serde_yaml::from_reader(file).map_err(|e| MetricsConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    pub fn check_namespace(&self, namespace: &str) -> bool {
        // "" is what callers use to query across all namespaces
        if namespace.is_empty() {
            return true;
        }
        if matches(&self.namespaces.exclude, namespace) {
            return false;
        }
        self.namespaces.include.is_empty() || matches(&self.namespaces.include, namespace)
    }
}

fn matches(patterns: &[String], namespace: &str) -> bool {
    patterns.iter().any(|p| p == "*" || p == namespace)
}

/// Records client queries using the global OpenTelemetry meter provider
pub struct OtelMetricsManager {
    config: MetricsConfiguration,
}

impl OtelMetricsManager {
    pub fn new(config: MetricsConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfiguration {
        &self.config
    }
}

impl MetricsConfigManager for OtelMetricsManager {
    fn record_client_query(
        &self,
        operation: ClientQueryOperation,
        client_type: ClientType,
        resource_kind: &str,
        namespace: Option<&str>,
    ) {
        if let Some(namespace) = namespace {
            if !self.config.check_namespace(namespace) {
                trace!(
                    namespace,
                    resource_kind,
                    operation = operation.as_str(),
                    "client query not recorded, namespace filtered out"
                );
                return;
            }
        }

        add_client_query(&ClientQuery {
            operation,
            client_type,
            resource_kind,
            resource_namespace: namespace,
        });
    }
}
