use lazy_static::lazy_static;
use opentelemetry::{KeyValue, metrics::Counter};

use super::{ClientQueryOperation, ClientType};

lazy_static! {
    static ref CLIENT_QUERIES_TOTAL: Counter<u64> =
        opentelemetry::global::meter(super::METER_NAME)
            .u64_counter("kyverno_client_queries")
            .with_description("number of queries issued to the Kubernetes API server")
            .build();
}

pub(crate) struct ClientQuery<'a> {
    pub(crate) operation: ClientQueryOperation,
    pub(crate) client_type: ClientType,
    pub(crate) resource_kind: &'a str,
    pub(crate) resource_namespace: Option<&'a str>,
}

#[allow(clippy::from_over_into)]
impl Into<Vec<KeyValue>> for &ClientQuery<'_> {
    fn into(self) -> Vec<KeyValue> {
        let mut baggage = vec![
            KeyValue::new("operation", self.operation.as_str()),
            KeyValue::new("client_type", self.client_type.as_str()),
            KeyValue::new("resource_kind", self.resource_kind.to_owned()),
        ];
        if let Some(resource_namespace) = self.resource_namespace {
            baggage.push(KeyValue::new(
                "resource_namespace",
                resource_namespace.to_owned(),
            ));
        }
        baggage
    }
}

pub(crate) fn add_client_query(client_query: &ClientQuery) {
    CLIENT_QUERIES_TOTAL.add(1, &Into::<Vec<KeyValue>>::into(client_query));
}
