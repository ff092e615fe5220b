use either::Either;
use k8s_openapi::api::{
    authentication::v1::TokenRequest,
    core::v1::{Binding, Pod, ServiceAccount},
};
use kube::{
    api::{
        DeleteParams, EvictParams, ListParams, ObjectList, Patch, PatchParams, PostParams,
        WatchParams,
    },
    core::Status,
};
use serde::Serialize;
use std::{fmt::Debug, marker::PhantomData};

use crate::{
    client::{KubeResource, PodClient, ResourceClient, ServiceAccountClient, WatchStream},
    metrics::{ClientQueryOperation, ClientQueryRecorder},
};

/// Decorates a typed client of one resource kind.
///
/// Every typed call records its operation through the recorder, then returns
/// whatever the inner client returned. The recording happens when the call
/// completes, regardless of its outcome.
pub struct InstrumentedApi<C, K> {
    inner: C,
    recorder: ClientQueryRecorder,
    _resource: PhantomData<fn() -> K>,
}

impl<C, K> InstrumentedApi<C, K> {
    pub fn new(inner: C, recorder: ClientQueryRecorder) -> Self {
        Self {
            inner,
            recorder,
            _resource: PhantomData,
        }
    }

    /// The wrapped client. Calls made through it are not recorded.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn recorder(&self) -> &ClientQueryRecorder {
        &self.recorder
    }
}

fn patch_operation<P: Serialize>(patch: &Patch<P>) -> ClientQueryOperation {
    match patch {
        Patch::Apply(_) => ClientQueryOperation::Apply,
        _ => ClientQueryOperation::Patch,
    }
}

fn patch_status_operation<P: Serialize>(patch: &Patch<P>) -> ClientQueryOperation {
    match patch {
        Patch::Apply(_) => ClientQueryOperation::ApplyStatus,
        _ => ClientQueryOperation::Patch,
    }
}

impl<C, K> ResourceClient<K> for InstrumentedApi<C, K>
where
    K: KubeResource,
    C: ResourceClient<K>,
{
    async fn get(&self, name: &str) -> kube::Result<K> {
        let _record = self.recorder.defer(ClientQueryOperation::Get);
        self.inner.get(name).await
    }

    async fn list(&self, lp: &ListParams) -> kube::Result<ObjectList<K>> {
        let _record = self.recorder.defer(ClientQueryOperation::List);
        self.inner.list(lp).await
    }

    async fn watch(&self, wp: &WatchParams, version: &str) -> kube::Result<WatchStream<K>> {
        let _record = self.recorder.defer(ClientQueryOperation::Watch);
        self.inner.watch(wp, version).await
    }

    async fn create(&self, pp: &PostParams, data: &K) -> kube::Result<K> {
        let _record = self.recorder.defer(ClientQueryOperation::Create);
        self.inner.create(pp, data).await
    }

    async fn replace(&self, name: &str, pp: &PostParams, data: &K) -> kube::Result<K> {
        let _record = self.recorder.defer(ClientQueryOperation::Update);
        self.inner.replace(name, pp, data).await
    }

    async fn replace_status(&self, name: &str, pp: &PostParams, data: &K) -> kube::Result<K> {
        let _record = self.recorder.defer(ClientQueryOperation::UpdateStatus);
        self.inner.replace_status(name, pp, data).await
    }

    async fn delete(&self, name: &str, dp: &DeleteParams) -> kube::Result<Either<K, Status>> {
        let _record = self.recorder.defer(ClientQueryOperation::Delete);
        self.inner.delete(name, dp).await
    }

    async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> kube::Result<Either<ObjectList<K>, Status>> {
        let _record = self.recorder.defer(ClientQueryOperation::DeleteCollection);
        self.inner.delete_collection(dp, lp).await
    }

    async fn patch<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> kube::Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        let _record = self.recorder.defer(patch_operation(patch));
        self.inner.patch(name, pp, patch).await
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
        let _record = self.recorder.defer(patch_status_operation(patch));
        self.inner.patch_status(name, pp, patch).await
    }
}

impl<C: PodClient> PodClient for InstrumentedApi<C, Pod> {
    async fn evict(&self, name: &str, ep: &EvictParams) -> kube::Result<Status> {
        let _record = self.recorder.defer(ClientQueryOperation::Evict);
        self.inner.evict(name, ep).await
    }

    async fn bind(&self, name: &str, pp: &PostParams, binding: &Binding) -> kube::Result<Status> {
        let _record = self.recorder.defer(ClientQueryOperation::Bind);
        self.inner.bind(name, pp, binding).await
    }
}

impl<C: ServiceAccountClient> ServiceAccountClient for InstrumentedApi<C, ServiceAccount> {
    async fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> kube::Result<TokenRequest> {
        let _record = self.recorder.defer(ClientQueryOperation::CreateToken);
        self.inner.create_token(name, pp, token_request).await
    }
}
