#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fmt::Debug,
    marker::PhantomData,
    sync::{Arc, Mutex},
};

use either::Either;
use futures::{StreamExt, stream};
use k8s_openapi::api::{
    authentication::v1::TokenRequest,
    core::v1::{Binding, Pod, ServiceAccount},
};
use kube::{
    Resource,
    api::{
        DeleteParams, EvictParams, ListParams, ObjectList, Patch, PatchParams, PostParams,
        WatchParams,
    },
    core::{NamespaceResourceScope, Status},
};
use kube_instrumentation::{
    ApiProvider, ClientQueryOperation, ClientType, KubeResource, MetricsConfigManager,
    PodClient, ResourceClient, ServiceAccountClient, WatchStream,
};
use serde::Serialize;
use serde_json::{Value, json};

/// How the fake API server answers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Serve,
    Fail,
    /// never answers
    Stall,
}

type Key = (String, String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, Value>,
    behavior: Option<Behavior>,
}

/// In-memory stand-in for `kube::Client`
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<State>>,
}

impl FakeProvider {
    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.lock().unwrap().behavior = Some(behavior);
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }
}

impl ApiProvider for FakeProvider {
    type Api<K: KubeResource> = FakeApi<K>;

    fn namespaced<K>(&self, namespace: &str) -> FakeApi<K>
    where
        K: KubeResource + kube::Resource<Scope = NamespaceResourceScope>,
    {
        FakeApi::new(self.state.clone(), namespace)
    }

    fn all<K: KubeResource>(&self) -> FakeApi<K> {
        FakeApi::new(self.state.clone(), "")
    }
}

pub struct FakeApi<K> {
    state: Arc<Mutex<State>>,
    namespace: String,
    _resource: PhantomData<fn() -> K>,
}

pub fn fake_error(msg: &str) -> kube::Error {
    kube::Error::SerdeError(<serde_json::Error as serde::de::Error>::custom(msg))
}

fn success() -> Status {
    serde_json::from_value(json!({ "status": "Success" })).unwrap()
}

fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

impl<K: KubeResource> FakeApi<K> {
    fn new(state: Arc<Mutex<State>>, namespace: &str) -> Self {
        Self {
            state,
            namespace: namespace.to_owned(),
            _resource: PhantomData,
        }
    }

    fn key(&self, name: &str) -> Key {
        (
            K::kind(&()).to_string(),
            self.namespace.clone(),
            name.to_owned(),
        )
    }

    /// Resolves once the fake decided how to answer
    async fn gate(&self) -> kube::Result<()> {
        let behavior = self.state.lock().unwrap().behavior;
        match behavior.unwrap_or(Behavior::Serve) {
            Behavior::Serve => Ok(()),
            Behavior::Fail => Err(fake_error("injected failure")),
            Behavior::Stall => futures::future::pending().await,
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> kube::Result<T> {
        serde_json::from_value(value).map_err(kube::Error::SerdeError)
    }

    fn lookup(&self, name: &str) -> kube::Result<Value> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&self.key(name))
            .cloned()
            .ok_or_else(|| fake_error(&format!("{} {name} not found", K::kind(&()))))
    }

    fn store(&self, name: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(self.key(name), value);
    }

    fn items(&self) -> Vec<Value> {
        let kind = K::kind(&()).to_string();
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|((k, ns, _), _)| {
                *k == kind && (self.namespace.is_empty() || *ns == self.namespace)
            })
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn object_list(items: Vec<Value>) -> kube::Result<ObjectList<K>> {
        Self::decode(json!({
            "apiVersion": "v1",
            "kind": "List",
            "metadata": {},
            "items": items,
        }))
    }

    fn patch_value<P: Serialize>(patch: &Patch<P>) -> kube::Result<Value> {
        match patch {
            Patch::Apply(p) | Patch::Merge(p) | Patch::Strategic(p) => {
                serde_json::to_value(p).map_err(kube::Error::SerdeError)
            }
            _ => Err(fake_error("unsupported patch type")),
        }
    }
}

impl<K: KubeResource> ResourceClient<K> for FakeApi<K> {
    async fn get(&self, name: &str) -> kube::Result<K> {
        self.gate().await?;
        Self::decode(self.lookup(name)?)
    }

    async fn list(&self, _lp: &ListParams) -> kube::Result<ObjectList<K>> {
        self.gate().await?;
        Self::object_list(self.items())
    }

    async fn watch(&self, _wp: &WatchParams, _version: &str) -> kube::Result<WatchStream<K>> {
        self.gate().await?;
        Ok(stream::empty().boxed())
    }

    async fn create(&self, _pp: &PostParams, data: &K) -> kube::Result<K> {
        self.gate().await?;
        let name = data.meta().name.clone().unwrap_or_default();
        let value = serde_json::to_value(data).map_err(kube::Error::SerdeError)?;
        self.store(&name, value);
        Ok(data.clone())
    }

    async fn replace(&self, name: &str, _pp: &PostParams, data: &K) -> kube::Result<K> {
        self.gate().await?;
        self.lookup(name)?;
        let value = serde_json::to_value(data).map_err(kube::Error::SerdeError)?;
        self.store(name, value);
        Ok(data.clone())
    }

    async fn replace_status(&self, name: &str, _pp: &PostParams, data: &K) -> kube::Result<K> {
        self.gate().await?;
        let mut current = self.lookup(name)?;
        let update = serde_json::to_value(data).map_err(kube::Error::SerdeError)?;
        current["status"] = update.get("status").cloned().unwrap_or(Value::Null);
        self.store(name, current.clone());
        Self::decode(current)
    }

    async fn delete(&self, name: &str, _dp: &DeleteParams) -> kube::Result<Either<K, Status>> {
        self.gate().await?;
        let removed = self.state.lock().unwrap().objects.remove(&self.key(name));
        match removed {
            Some(value) => Ok(Either::Left(Self::decode(value)?)),
            None => Err(fake_error(&format!("{} {name} not found", K::kind(&())))),
        }
    }

    async fn delete_collection(
        &self,
        _dp: &DeleteParams,
        _lp: &ListParams,
    ) -> kube::Result<Either<ObjectList<K>, Status>> {
        self.gate().await?;
        let items = self.items();
        let kind = K::kind(&()).to_string();
        self.state
            .lock()
            .unwrap()
            .objects
            .retain(|(k, ns, _), _| {
                !(*k == kind && (self.namespace.is_empty() || *ns == self.namespace))
            });
        Ok(Either::Left(Self::object_list(items)?))
    }

    async fn patch<P>(&self, name: &str, _pp: &PatchParams, patch: &Patch<P>) -> kube::Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.gate().await?;
        let patch = Self::patch_value(patch)?;
        let mut current = self.lookup(name)?;
        merge(&mut current, &patch);
        self.store(name, current.clone());
        Self::decode(current)
    }

    async fn patch_status<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> kube::Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.patch(name, pp, patch).await
    }
}

impl PodClient for FakeApi<Pod> {
    async fn evict(&self, name: &str, _ep: &EvictParams) -> kube::Result<Status> {
        self.gate().await?;
        self.state.lock().unwrap().objects.remove(&self.key(name));
        Ok(success())
    }

    async fn bind(&self, name: &str, _pp: &PostParams, binding: &Binding) -> kube::Result<Status> {
        self.gate().await?;
        let mut current = self.lookup(name)?;
        current["spec"]["nodeName"] = json!(binding.target.name);
        self.store(name, current);
        Ok(success())
    }
}

impl ServiceAccountClient for FakeApi<ServiceAccount> {
    async fn create_token(
        &self,
        name: &str,
        _pp: &PostParams,
        token_request: &TokenRequest,
    ) -> kube::Result<TokenRequest> {
        self.gate().await?;
        self.lookup(name)?;
        Ok(token_request.clone())
    }
}

pub type RecordedQuery = (ClientQueryOperation, ClientType, String, Option<String>);

/// Keeps every query it is asked to record
#[derive(Default)]
pub struct RecordingManager {
    queries: Mutex<Vec<RecordedQuery>>,
}

impl RecordingManager {
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|(op, ..)| op.as_str())
            .collect()
    }
}

impl MetricsConfigManager for RecordingManager {
    fn record_client_query(
        &self,
        operation: ClientQueryOperation,
        client_type: ClientType,
        resource_kind: &str,
        namespace: Option<&str>,
    ) {
        self.queries.lock().unwrap().push((
            operation,
            client_type,
            resource_kind.to_owned(),
            namespace.map(str::to_owned),
        ));
    }
}
