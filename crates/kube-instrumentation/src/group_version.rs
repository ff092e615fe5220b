//! Instrumented group/version clients.
//!
//! Each client mirrors one Kubernetes API group/version and exposes one
//! accessor per resource kind. The clients are generated from the tables at
//! the bottom of this file by [`instrumented_group_version`]: adding a kind is
//! a one line change.

use k8s_openapi::api::{
    admissionregistration, apps, autoscaling, batch, certificates, coordination, core, discovery,
    events, networking, node, policy, rbac, scheduling, storage,
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions;
use kube::Resource;

use crate::{
    client::ApiProvider,
    instrumented::InstrumentedApi,
    metrics::{
        ClientType, SharedMetricsManager, clustered_client_query_recorder,
        namespaced_client_query_recorder,
    },
};

/// Generates a group/version client.
///
/// Accessors listed under `namespaced` take the namespace and bind a
/// namespaced recorder, the ones listed under `cluster` bind a clustered
/// recorder. A fresh recorder is minted on every accessor call.
macro_rules! instrumented_group_version {
    (
        $(#[$meta:meta])*
        $name:ident {
            namespaced { $($ns_accessor:ident => $ns_kind:ty),* $(,)? }
            cluster { $($cl_accessor:ident => $cl_kind:ty),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name<C> {
            inner: C,
            manager: Option<SharedMetricsManager>,
            client_type: ClientType,
        }

        impl<C: ApiProvider> $name<C> {
            pub fn new(
                inner: C,
                manager: Option<SharedMetricsManager>,
                client_type: ClientType,
            ) -> Self {
                Self {
                    inner,
                    manager,
                    client_type,
                }
            }

            /// The underlying client. Calls made through it are not recorded.
            pub fn rest_client(&self) -> &C {
                &self.inner
            }

            $(
                pub fn $ns_accessor(
                    &self,
                    namespace: &str,
                ) -> InstrumentedApi<C::Api<$ns_kind>, $ns_kind> {
                    let recorder = namespaced_client_query_recorder(
                        self.manager.as_ref(),
                        namespace,
                        <$ns_kind as Resource>::kind(&()),
                        self.client_type,
                    );
                    InstrumentedApi::new(self.inner.namespaced::<$ns_kind>(namespace), recorder)
                }
            )*

            $(
                pub fn $cl_accessor(&self) -> InstrumentedApi<C::Api<$cl_kind>, $cl_kind> {
                    let recorder = clustered_client_query_recorder(
                        self.manager.as_ref(),
                        <$cl_kind as Resource>::kind(&()),
                        self.client_type,
                    );
                    InstrumentedApi::new(self.inner.all::<$cl_kind>(), recorder)
                }
            )*
        }
    };
}

instrumented_group_version! {
    /// `core/v1`
    CoreV1 {
        namespaced {
            config_maps => core::v1::ConfigMap,
            endpoints => core::v1::Endpoints,
            events => core::v1::Event,
            limit_ranges => core::v1::LimitRange,
            persistent_volume_claims => core::v1::PersistentVolumeClaim,
            pods => core::v1::Pod,
            pod_templates => core::v1::PodTemplate,
            replication_controllers => core::v1::ReplicationController,
            resource_quotas => core::v1::ResourceQuota,
            secrets => core::v1::Secret,
            service_accounts => core::v1::ServiceAccount,
            services => core::v1::Service,
        }
        cluster {
            component_statuses => core::v1::ComponentStatus,
            namespaces => core::v1::Namespace,
            nodes => core::v1::Node,
            persistent_volumes => core::v1::PersistentVolume,
        }
    }
}

instrumented_group_version! {
    /// `apps/v1`
    AppsV1 {
        namespaced {
            controller_revisions => apps::v1::ControllerRevision,
            daemon_sets => apps::v1::DaemonSet,
            deployments => apps::v1::Deployment,
            replica_sets => apps::v1::ReplicaSet,
            stateful_sets => apps::v1::StatefulSet,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `batch/v1`
    BatchV1 {
        namespaced {
            cron_jobs => batch::v1::CronJob,
            jobs => batch::v1::Job,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `autoscaling/v2`
    AutoscalingV2 {
        namespaced {
            horizontal_pod_autoscalers => autoscaling::v2::HorizontalPodAutoscaler,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `coordination.k8s.io/v1`
    CoordinationV1 {
        namespaced {
            leases => coordination::v1::Lease,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `discovery.k8s.io/v1`
    DiscoveryV1 {
        namespaced {
            endpoint_slices => discovery::v1::EndpointSlice,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `events.k8s.io/v1`
    EventsV1 {
        namespaced {
            events => events::v1::Event,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `networking.k8s.io/v1`
    NetworkingV1 {
        namespaced {
            ingresses => networking::v1::Ingress,
            network_policies => networking::v1::NetworkPolicy,
        }
        cluster {
            ingress_classes => networking::v1::IngressClass,
        }
    }
}

instrumented_group_version! {
    /// `policy/v1`
    PolicyV1 {
        namespaced {
            pod_disruption_budgets => policy::v1::PodDisruptionBudget,
        }
        cluster {}
    }
}

instrumented_group_version! {
    /// `rbac.authorization.k8s.io/v1`
    RbacV1 {
        namespaced {
            roles => rbac::v1::Role,
            role_bindings => rbac::v1::RoleBinding,
        }
        cluster {
            cluster_roles => rbac::v1::ClusterRole,
            cluster_role_bindings => rbac::v1::ClusterRoleBinding,
        }
    }
}

instrumented_group_version! {
    /// `storage.k8s.io/v1`
    StorageV1 {
        namespaced {
            csi_storage_capacities => storage::v1::CSIStorageCapacity,
        }
        cluster {
            csi_drivers => storage::v1::CSIDriver,
            csi_nodes => storage::v1::CSINode,
            storage_classes => storage::v1::StorageClass,
            volume_attachments => storage::v1::VolumeAttachment,
        }
    }
}

instrumented_group_version! {
    /// `scheduling.k8s.io/v1`
    SchedulingV1 {
        namespaced {}
        cluster {
            priority_classes => scheduling::v1::PriorityClass,
        }
    }
}

instrumented_group_version! {
    /// `node.k8s.io/v1`
    NodeV1 {
        namespaced {}
        cluster {
            runtime_classes => node::v1::RuntimeClass,
        }
    }
}

instrumented_group_version! {
    /// `certificates.k8s.io/v1`
    CertificatesV1 {
        namespaced {}
        cluster {
            certificate_signing_requests => certificates::v1::CertificateSigningRequest,
        }
    }
}

instrumented_group_version! {
    /// `admissionregistration.k8s.io/v1`
    AdmissionregistrationV1 {
        namespaced {}
        cluster {
            mutating_webhook_configurations => admissionregistration::v1::MutatingWebhookConfiguration,
            validating_admission_policies => admissionregistration::v1::ValidatingAdmissionPolicy,
            validating_admission_policy_bindings => admissionregistration::v1::ValidatingAdmissionPolicyBinding,
            validating_webhook_configurations => admissionregistration::v1::ValidatingWebhookConfiguration,
        }
    }
}

instrumented_group_version! {
    /// `apiextensions.k8s.io/v1`
    ApiextensionsV1 {
        namespaced {}
        cluster {
            custom_resource_definitions => apiextensions::v1::CustomResourceDefinition,
        }
    }
}
