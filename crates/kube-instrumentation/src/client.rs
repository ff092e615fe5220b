//! The typed API surface wrapped by the instrumented clients.
//!
//! [`ResourceClient`] is the method set of a single resource kind, it is
//! implemented by [`kube::Api`] and by [`crate::InstrumentedApi`]. The
//! [`ApiProvider`] trait abstracts the "real" clientset handing out those
//! per-kind clients.

use either::Either;
use futures::{StreamExt, stream::BoxStream};
use k8s_openapi::api::{
    authentication::v1::TokenRequest,
    core::v1::{Binding, Pod, ServiceAccount},
};
use kube::{
    Api,
    api::{
        DeleteParams, EvictParams, ListParams, ObjectList, Patch, PatchParams, PostParams,
        WatchEvent, WatchParams,
    },
    core::{NamespaceResourceScope, Status},
};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Debug, future::Future};

/// Bounds shared by every typed Kubernetes resource handled by this crate
pub trait KubeResource:
    kube::Resource<DynamicType = ()>
    + Clone
    + DeserializeOwned
    + Serialize
    + Debug
    + Send
    + Sync
    + 'static
{
}

impl<K> KubeResource for K where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static
{
}

pub type WatchStream<K> = BoxStream<'static, kube::Result<WatchEvent<K>>>;

pub trait ResourceClient<K: KubeResource>: Send + Sync {
    fn get(&self, name: &str) -> impl Future<Output = kube::Result<K>> + Send;

    fn list(&self, lp: &ListParams) -> impl Future<Output = kube::Result<ObjectList<K>>> + Send;

    fn watch(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> impl Future<Output = kube::Result<WatchStream<K>>> + Send;

    fn create(&self, pp: &PostParams, data: &K) -> impl Future<Output = kube::Result<K>> + Send;

    /// Update of the whole object
    fn replace(
        &self,
        name: &str,
        pp: &PostParams,
        data: &K,
    ) -> impl Future<Output = kube::Result<K>> + Send;

    /// Update of the `status` subresource
    fn replace_status(
        &self,
        name: &str,
        pp: &PostParams,
        data: &K,
    ) -> impl Future<Output = kube::Result<K>> + Send;

    fn delete(
        &self,
        name: &str,
        dp: &DeleteParams,
    ) -> impl Future<Output = kube::Result<Either<K, Status>>> + Send;

    fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> impl Future<Output = kube::Result<Either<ObjectList<K>, Status>>> + Send;

    /// Patch the object. Server-side apply is a [`Patch::Apply`] patch.
    fn patch<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> impl Future<Output = kube::Result<K>> + Send
    where
        P: Serialize + Debug + Send + Sync;

    fn patch_status<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> impl Future<Output = kube::Result<K>> + Send
    where
        P: Serialize + Debug + Send + Sync;
}

/// Verbs that only exist for Pods
pub trait PodClient: ResourceClient<Pod> {
    fn evict(
        &self,
        name: &str,
        ep: &EvictParams,
    ) -> impl Future<Output = kube::Result<Status>> + Send;

    fn bind(
        &self,
        name: &str,
        pp: &PostParams,
        binding: &Binding,
    ) -> impl Future<Output = kube::Result<Status>> + Send;
}

/// Verbs that only exist for ServiceAccounts
pub trait ServiceAccountClient: ResourceClient<ServiceAccount> {
    fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> impl Future<Output = kube::Result<TokenRequest>> + Send;
}

/// The underlying clientset: hands out one typed client per resource kind
pub trait ApiProvider: Clone + Send + Sync + 'static {
    type Api<K: KubeResource>: ResourceClient<K>;

    /// Client for a namespaced kind. An empty namespace means all namespaces.
    fn namespaced<K>(&self, namespace: &str) -> Self::Api<K>
    where
        K: KubeResource + kube::Resource<Scope = NamespaceResourceScope>;

    /// Client for a cluster scoped kind, or for a namespaced kind across all
    /// namespaces.
    fn all<K: KubeResource>(&self) -> Self::Api<K>;
}

impl ApiProvider for kube::Client {
    type Api<K: KubeResource> = Api<K>;

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: KubeResource + kube::Resource<Scope = NamespaceResourceScope>,
    {
        if namespace.is_empty() {
            Api::all(self.clone())
        } else {
            Api::namespaced(self.clone(), namespace)
        }
    }

    fn all<K: KubeResource>(&self) -> Api<K> {
        Api::all(self.clone())
    }
}

impl<K: KubeResource> ResourceClient<K> for Api<K> {
    async fn get(&self, name: &str) -> kube::Result<K> {
        Api::get(self, name).await
    }

    async fn list(&self, lp: &ListParams) -> kube::Result<ObjectList<K>> {
        Api::list(self, lp).await
    }

    async fn watch(&self, wp: &WatchParams, version: &str) -> kube::Result<WatchStream<K>> {
        Api::watch(self, wp, version)
            .await
            .map(|stream| stream.boxed())
    }

    async fn create(&self, pp: &PostParams, data: &K) -> kube::Result<K> {
        Api::create(self, pp, data).await
    }

    async fn replace(&self, name: &str, pp: &PostParams, data: &K) -> kube::Result<K> {
        Api::replace(self, name, pp, data).await
    }

    async fn replace_status(&self, name: &str, pp: &PostParams, data: &K) -> kube::Result<K> {
        Api::replace_status(self, name, pp, data).await
    }

    async fn delete(&self, name: &str, dp: &DeleteParams) -> kube::Result<Either<K, Status>> {
        Api::delete(self, name, dp).await
    }

    async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> kube::Result<Either<ObjectList<K>, Status>> {
        Api::delete_collection(self, dp, lp).await
    }

    async fn patch<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> kube::Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch(self, name, pp, patch).await
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
        Api::patch_status(self, name, pp, patch).await
    }
}

impl PodClient for Api<Pod> {
    async fn evict(&self, name: &str, ep: &EvictParams) -> kube::Result<Status> {
        Api::evict(self, name, ep).await
    }

    async fn bind(&self, name: &str, pp: &PostParams, binding: &Binding) -> kube::Result<Status> {
        self.create_subresource("binding", name, pp, binding).await
    }
}

impl ServiceAccountClient for Api<ServiceAccount> {
    async fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> kube::Result<TokenRequest> {
        self.create_token_request(name, pp, token_request).await
    }
}
