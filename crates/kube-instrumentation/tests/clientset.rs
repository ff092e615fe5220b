mod common;

use std::{sync::Arc, time::Duration};

use common::{Behavior, FakeProvider, RecordingManager};
use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        authentication::v1::TokenRequest,
        core::v1::{
            Binding, ConfigMap, Namespace, ObjectReference, Pod, PodStatus, ServiceAccount,
        },
        rbac::v1::ClusterRole,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::api::{
    DeleteParams, EvictParams, ListParams, Patch, PatchParams, PostParams, WatchParams,
};
use kube_instrumentation::{
    ClientQueryOperation, ClientType, Clientset, PodClient, ResourceClient, ServiceAccountClient,
    SharedMetricsManager,
};
use serde_json::json;

fn clientset(
    client_type: ClientType,
) -> (Clientset<FakeProvider>, FakeProvider, Arc<RecordingManager>) {
    let provider = FakeProvider::default();
    let recording = Arc::new(RecordingManager::default());
    let manager: SharedMetricsManager = recording.clone();
    let clientset = Clientset::wrap(provider.clone(), Some(manager), client_type);
    (clientset, provider, recording)
}

fn pod(namespace: &str, name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn named<K: Default + kube::Resource>(name: &str) -> K {
    let mut object = K::default();
    object.meta_mut().name = Some(name.to_owned());
    object
}

#[tokio::test]
async fn results_are_the_ones_of_the_inner_client() {
    let (clientset, provider, _) = clientset(ClientType::KubeClient);
    let pods = clientset.core_v1().pods("team-a");

    let created = pods.create(&PostParams::default(), &pod("team-a", "nginx")).await.unwrap();
    assert_eq!(created, pod("team-a", "nginx"));

    let through_proxy = pods.get("nginx").await.unwrap();
    let direct = pods.inner().get("nginx").await.unwrap();
    assert_eq!(through_proxy, direct);

    let raw = kube_instrumentation::ApiProvider::namespaced::<Pod>(&provider, "team-a");
    assert_eq!(raw.get("nginx").await.unwrap(), through_proxy);
}

#[tokio::test]
async fn every_call_is_recorded_once_with_its_operation() {
    let (clientset, _, recording) = clientset(ClientType::KubeClient);
    let pods = clientset.core_v1().pods("team-a");

    pods.create(&PostParams::default(), &pod("team-a", "nginx")).await.unwrap();
    pods.get("nginx").await.unwrap();
    pods.list(&ListParams::default()).await.unwrap();
    pods.watch(&WatchParams::default(), "0").await.unwrap();
    pods.replace("nginx", &PostParams::default(), &pod("team-a", "nginx"))
        .await
        .unwrap();
    let mut running = pod("team-a", "nginx");
    running.status = Some(PodStatus {
        phase: Some("Running".to_owned()),
        ..Default::default()
    });
    let updated = pods
        .replace_status("nginx", &PostParams::default(), &running)
        .await
        .unwrap();
    assert_eq!(
        updated.status.and_then(|s| s.phase),
        Some("Running".to_owned())
    );
    pods.patch(
        "nginx",
        &PatchParams::default(),
        &Patch::Merge(json!({ "metadata": { "labels": { "app": "web" } } })),
    )
    .await
    .unwrap();
    pods.patch(
        "nginx",
        &PatchParams::apply("kyverno"),
        &Patch::Apply(json!({ "metadata": { "labels": { "tier": "front" } } })),
    )
    .await
    .unwrap();
    pods.patch_status(
        "nginx",
        &PatchParams::apply("kyverno"),
        &Patch::Apply(json!({ "status": { "phase": "Succeeded" } })),
    )
    .await
    .unwrap();
    let binding = Binding {
        target: ObjectReference {
            name: Some("node-1".to_owned()),
            ..Default::default()
        },
        ..Default::default()
    };
    pods.bind("nginx", &PostParams::default(), &binding).await.unwrap();
    pods.evict("nginx", &EvictParams::default()).await.unwrap();
    pods.create(&PostParams::default(), &pod("team-a", "redis")).await.unwrap();
    pods.delete("redis", &DeleteParams::default()).await.unwrap();
    pods.delete_collection(&DeleteParams::default(), &ListParams::default())
        .await
        .unwrap();

    assert_eq!(
        recording.operations(),
        vec![
            "create",
            "get",
            "list",
            "watch",
            "update",
            "update_status",
            "patch",
            "apply",
            "apply_status",
            "bind",
            "evict",
            "create",
            "delete",
            "delete_collection",
        ]
    );
    assert!(recording.queries().iter().all(|(_, client_type, kind, namespace)| {
        *client_type == ClientType::KubeClient
            && kind == "Pod"
            && namespace.as_deref() == Some("team-a")
    }));
}

#[tokio::test]
async fn create_token_is_recorded() {
    let (clientset, _, recording) = clientset(ClientType::ControllerClient);
    let service_accounts = clientset.core_v1().service_accounts("kyverno");

    service_accounts
        .create(&PostParams::default(), &named::<ServiceAccount>("kyverno-admission-controller"))
        .await
        .unwrap();
    let request = TokenRequest::default();
    let issued = service_accounts
        .create_token("kyverno-admission-controller", &PostParams::default(), &request)
        .await
        .unwrap();
    assert_eq!(issued, request);

    let queries = recording.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].0, ClientQueryOperation::CreateToken);
    assert_eq!(queries[1].1, ClientType::ControllerClient);
    assert_eq!(queries[1].2, "ServiceAccount");
}

#[tokio::test]
async fn cluster_scoped_accessors_record_no_namespace() {
    let (clientset, _, recording) = clientset(ClientType::DynamicClient);

    clientset
        .core_v1()
        .namespaces()
        .create(&PostParams::default(), &named::<Namespace>("team-a"))
        .await
        .unwrap();
    clientset
        .rbac_v1()
        .cluster_roles()
        .list(&ListParams::default())
        .await
        .unwrap();

    assert_eq!(
        recording.queries(),
        vec![
            (
                ClientQueryOperation::Create,
                ClientType::DynamicClient,
                "Namespace".to_owned(),
                None
            ),
            (
                ClientQueryOperation::List,
                ClientType::DynamicClient,
                "ClusterRole".to_owned(),
                None
            ),
        ]
    );
}

#[tokio::test]
async fn each_accessor_call_binds_its_own_namespace() {
    let (clientset, _, recording) = clientset(ClientType::KubeClient);

    let team_a = clientset.apps_v1().deployments("team-a");
    let team_b = clientset.apps_v1().deployments("team-b");
    team_b.list(&ListParams::default()).await.unwrap();
    team_a.list(&ListParams::default()).await.unwrap();

    let namespaces: Vec<_> = recording
        .queries()
        .into_iter()
        .map(|(_, _, kind, namespace)| (kind, namespace))
        .collect();
    assert_eq!(
        namespaces,
        vec![
            ("Deployment".to_owned(), Some("team-b".to_owned())),
            ("Deployment".to_owned(), Some("team-a".to_owned())),
        ]
    );
}

#[tokio::test]
async fn generic_accessors_reach_any_kind() {
    let (clientset, _, recording) = clientset(ClientType::KubeClient);

    clientset
        .namespaced::<ConfigMap>("team-a")
        .create(&PostParams::default(), &named::<ConfigMap>("settings"))
        .await
        .unwrap();
    clientset
        .cluster::<ClusterRole>()
        .create(&PostParams::default(), &named::<ClusterRole>("viewer"))
        .await
        .unwrap();
    let deployments = clientset
        .namespaced::<Deployment>("")
        .list(&ListParams::default())
        .await
        .unwrap();
    assert!(deployments.items.is_empty());

    let queries = recording.queries();
    assert_eq!(queries[0].2, "ConfigMap");
    assert_eq!(queries[0].3.as_deref(), Some("team-a"));
    assert_eq!(queries[1].2, "ClusterRole");
    assert_eq!(queries[1].3, None);
    assert_eq!(queries[2].3.as_deref(), Some(""));
}

#[tokio::test]
async fn pass_through_accessors_are_not_recorded() {
    let (clientset, provider, recording) = clientset(ClientType::KubeClient);

    let raw =
        kube_instrumentation::ApiProvider::namespaced::<Pod>(clientset.rest_client(), "team-a");
    raw.create(&PostParams::default(), &pod("team-a", "nginx")).await.unwrap();

    let pods = clientset.core_v1().pods("team-a");
    pods.inner().get("nginx").await.unwrap();
    kube_instrumentation::ApiProvider::all::<Namespace>(clientset.core_v1().rest_client())
        .list(&ListParams::default())
        .await
        .unwrap();

    assert_eq!(provider.object_count(), 1);
    assert!(recording.queries().is_empty());
}

#[tokio::test]
async fn errors_are_returned_verbatim_and_still_recorded() {
    let (clientset, provider, recording) = clientset(ClientType::KubeClient);
    let pods = clientset.core_v1().pods("team-a");

    let missing = pods.get("ghost").await.unwrap_err();
    let direct = pods.inner().get("ghost").await.unwrap_err();
    assert_eq!(missing.to_string(), direct.to_string());

    provider.set_behavior(Behavior::Fail);
    let err = pods.list(&ListParams::default()).await.unwrap_err();
    assert!(err.to_string().contains("injected failure"));

    assert_eq!(recording.operations(), vec!["get", "list"]);
}

#[tokio::test]
async fn cancelled_calls_are_recorded() {
    let (clientset, provider, recording) = clientset(ClientType::KubeClient);
    provider.set_behavior(Behavior::Stall);
    let pods = clientset.core_v1().pods("team-a");

    let outcome = tokio::time::timeout(Duration::from_millis(20), pods.get("nginx")).await;
    assert!(outcome.is_err());

    assert_eq!(recording.operations(), vec!["get"]);
}

#[tokio::test]
async fn without_manager_nothing_is_recorded() {
    let provider = FakeProvider::default();
    let clientset = Clientset::wrap(provider.clone(), None, ClientType::KubeClient);

    let pods = clientset.core_v1().pods("team-a");
    assert!(pods.recorder().is_noop());

    pods.create(&PostParams::default(), &pod("team-a", "nginx")).await.unwrap();
    assert_eq!(pods.get("nginx").await.unwrap(), pod("team-a", "nginx"));
    assert_eq!(provider.object_count(), 1);
}

fn discovery_outlives_the_clientset(clientset: Clientset) -> kube::Discovery {
    let discovery = clientset.discovery();
    drop(clientset);
    discovery
}

#[test]
fn discovery_is_detached_from_the_recorders() {
    // the discovery client borrows nothing from the clientset, hence from
    // its manager and recorders
    let _: fn(Clientset) -> kube::Discovery = discovery_outlives_the_clientset;
}
