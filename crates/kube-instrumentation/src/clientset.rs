use kube::{
    Resource,
    core::{ClusterResourceScope, NamespaceResourceScope},
};

use crate::{
    client::{ApiProvider, KubeResource},
    group_version::*,
    instrumented::InstrumentedApi,
    metrics::{
        ClientType, SharedMetricsManager, clustered_client_query_recorder,
        namespaced_client_query_recorder,
    },
};

macro_rules! clientset {
    ($($accessor:ident => $group_version:ident),* $(,)?) => {
        /// Instrumented counterpart of the Kubernetes clientset.
        ///
        /// Every group/version client is built once, when the clientset is
        /// created. Resource clients are handed out on demand, each one bound
        /// to a fresh recorder.
        #[derive(Clone)]
        pub struct Clientset<C = kube::Client> {
            inner: C,
            manager: Option<SharedMetricsManager>,
            client_type: ClientType,
            $($accessor: $group_version<C>,)*
        }

        impl<C: ApiProvider> Clientset<C> {
            /// Wrap an existing clientset. Without a manager nothing is
            /// recorded.
            pub fn wrap(
                inner: C,
                manager: Option<SharedMetricsManager>,
                client_type: ClientType,
            ) -> Self {
                Self {
                    $($accessor: $group_version::new(inner.clone(), manager.clone(), client_type),)*
                    inner,
                    manager,
                    client_type,
                }
            }

            $(
                pub fn $accessor(&self) -> &$group_version<C> {
                    &self.$accessor
                }
            )*
        }
    };
}

clientset! {
    core_v1 => CoreV1,
    apps_v1 => AppsV1,
    batch_v1 => BatchV1,
    autoscaling_v2 => AutoscalingV2,
    coordination_v1 => CoordinationV1,
    discovery_v1 => DiscoveryV1,
    events_v1 => EventsV1,
    networking_v1 => NetworkingV1,
    policy_v1 => PolicyV1,
    rbac_v1 => RbacV1,
    storage_v1 => StorageV1,
    scheduling_v1 => SchedulingV1,
    node_v1 => NodeV1,
    certificates_v1 => CertificatesV1,
    admissionregistration_v1 => AdmissionregistrationV1,
    apiextensions_v1 => ApiextensionsV1,
}

impl<C: ApiProvider> Clientset<C> {
    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    /// The underlying clientset. Calls made through it are not recorded.
    pub fn rest_client(&self) -> &C {
        &self.inner
    }

    /// Client for any namespaced kind, custom resources included
    pub fn namespaced<K>(&self, namespace: &str) -> InstrumentedApi<C::Api<K>, K>
    where
        K: KubeResource + Resource<Scope = NamespaceResourceScope>,
    {
        let recorder = namespaced_client_query_recorder(
            self.manager.as_ref(),
            namespace,
            K::kind(&()),
            self.client_type,
        );
        InstrumentedApi::new(self.inner.namespaced::<K>(namespace), recorder)
    }

    /// Client for any cluster scoped kind, custom resources included
    pub fn cluster<K>(&self) -> InstrumentedApi<C::Api<K>, K>
    where
        K: KubeResource + Resource<Scope = ClusterResourceScope>,
    {
        let recorder =
            clustered_client_query_recorder(self.manager.as_ref(), K::kind(&()), self.client_type);
        InstrumentedApi::new(self.inner.all::<K>(), recorder)
    }
}

impl Clientset<kube::Client> {
    /// Build the underlying client from `config` and wrap it.
    pub fn new_for_config(
        config: kube::Config,
        manager: Option<SharedMetricsManager>,
        client_type: ClientType,
    ) -> kube::Result<Self> {
        let client = kube::Client::try_from(config)?;
        Ok(Self::wrap(client, manager, client_type))
    }

    /// Discovery of the API groups served by the cluster.
    ///
    /// Discovery talks to the underlying client directly: its calls never
    /// go through a recorder and are never recorded. The returned value owns
    /// a clone of the client and outlives the clientset.
    pub fn discovery(&self) -> kube::Discovery {
        kube::Discovery::new(self.inner.clone())
    }
}
