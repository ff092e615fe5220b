use std::{fmt, sync::Arc};

mod client_queries_total;
pub(crate) use client_queries_total::{ClientQuery, add_client_query};
mod manager;
pub use manager::{MetricsConfiguration, NamespacesConfig, OtelMetricsManager};

pub(crate) const METER_NAME: &str = "kyverno";

/// The logical client issuing a query. Used to tell apart metric series
/// produced by different clients talking to the same API server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientType {
    KubeClient,
    ControllerClient,
    DynamicClient,
    MetadataClient,
    ApiServerClient,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::KubeClient => "kubeclient",
            ClientType::ControllerClient => "kyverno",
            ClientType::DynamicClient => "dynamic",
            ClientType::MetadataClient => "metadata",
            ClientType::ApiServerClient => "apiserver",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations recorded by the instrumented clients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientQueryOperation {
    Get,
    List,
    Watch,
    Create,
    Update,
    UpdateStatus,
    Delete,
    DeleteCollection,
    Patch,
    Apply,
    ApplyStatus,
    Evict,
    Bind,
    CreateToken,
}

impl ClientQueryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientQueryOperation::Get => "get",
            ClientQueryOperation::List => "list",
            ClientQueryOperation::Watch => "watch",
            ClientQueryOperation::Create => "create",
            ClientQueryOperation::Update => "update",
            ClientQueryOperation::UpdateStatus => "update_status",
            ClientQueryOperation::Delete => "delete",
            ClientQueryOperation::DeleteCollection => "delete_collection",
            ClientQueryOperation::Patch => "patch",
            ClientQueryOperation::Apply => "apply",
            ClientQueryOperation::ApplyStatus => "apply_status",
            ClientQueryOperation::Evict => "evict",
            ClientQueryOperation::Bind => "bind",
            ClientQueryOperation::CreateToken => "create_token",
        }
    }
}

impl fmt::Display for ClientQueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Clustered,
    Namespaced(String),
}

impl Scope {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Scope::Clustered => None,
            Scope::Namespaced(namespace) => Some(namespace.as_str()),
        }
    }
}

/// Sink for client query metrics.
///
/// Implementations must be cheap and must never fail: recording happens on
/// the path of every Kubernetes API call.
pub trait MetricsConfigManager: Send + Sync {
    fn record_client_query(
        &self,
        operation: ClientQueryOperation,
        client_type: ClientType,
        resource_kind: &str,
        namespace: Option<&str>,
    );
}

pub type SharedMetricsManager = Arc<dyn MetricsConfigManager>;

/// Records operations for exactly one resource kind, scope and client type.
///
/// A recorder built without a manager is a no-op.
pub struct ClientQueryRecorder {
    manager: Option<SharedMetricsManager>,
    resource_kind: String,
    scope: Scope,
    client_type: ClientType,
}

pub fn clustered_client_query_recorder(
    manager: Option<&SharedMetricsManager>,
    resource_kind: impl Into<String>,
    client_type: ClientType,
) -> ClientQueryRecorder {
    ClientQueryRecorder {
        manager: manager.cloned(),
        resource_kind: resource_kind.into(),
        scope: Scope::Clustered,
        client_type,
    }
}

pub fn namespaced_client_query_recorder(
    manager: Option<&SharedMetricsManager>,
    namespace: impl Into<String>,
    resource_kind: impl Into<String>,
    client_type: ClientType,
) -> ClientQueryRecorder {
    ClientQueryRecorder {
        manager: manager.cloned(),
        resource_kind: resource_kind.into(),
        scope: Scope::Namespaced(namespace.into()),
        client_type,
    }
}

impl ClientQueryRecorder {
    pub fn resource_kind(&self) -> &str {
        &self.resource_kind
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn is_noop(&self) -> bool {
        self.manager.is_none()
    }

    pub fn record(&self, operation: ClientQueryOperation) {
        if let Some(manager) = &self.manager {
            manager.record_client_query(
                operation,
                self.client_type,
                &self.resource_kind,
                self.scope.namespace(),
            );
        }
    }

    /// Record `operation` once the returned guard goes out of scope.
    ///
    /// The guard fires on every exit path of the caller: success, error,
    /// cancellation of the enclosing future and unwinding.
    pub fn defer(&self, operation: ClientQueryOperation) -> RecordGuard<'_> {
        RecordGuard {
            recorder: self,
            operation,
        }
    }
}

impl fmt::Debug for ClientQueryRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientQueryRecorder")
            .field("resource_kind", &self.resource_kind)
            .field("scope", &self.scope)
            .field("client_type", &self.client_type)
            .field("noop", &self.is_noop())
            .finish()
    }
}

#[must_use = "the operation is recorded when the guard is dropped"]
pub struct RecordGuard<'a> {
    recorder: &'a ClientQueryRecorder,
    operation: ClientQueryOperation,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        self.recorder.record(self.operation);
    }
}
