//! Instrumentation of the Kubernetes API clients used by the controller.
//!
//! Every call made through a [`Clientset`] is recorded as one
//! `kyverno_client_queries` data point, tagged with the operation, the
//! resource kind, the namespace and the logical client issuing it.

pub mod client;
pub mod clientset;
pub mod errors;
pub mod group_version;
pub mod instrumented;
pub mod metrics;

pub use client::{
    ApiProvider, KubeResource, PodClient, ResourceClient, ServiceAccountClient, WatchStream,
};
pub use clientset::Clientset;
pub use instrumented::InstrumentedApi;
pub use metrics::{
    ClientQueryOperation, ClientQueryRecorder, ClientType, MetricsConfigManager,
    MetricsConfiguration, OtelMetricsManager, RecordGuard, Scope, SharedMetricsManager,
    clustered_client_query_recorder, namespaced_client_query_recorder,
};
