//! Custom resources of the Kafka provider.

use kube::{CustomResource, ResourceExt};
use provider_kafka_operator_common::controller::base::Conditions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "kafka.provider.io";

/// Overrides the name of the topic on the Kafka cluster. Defaults to the
/// resource name.
pub const ANNOTATION_EXTERNAL_NAME: &str = "kafka.provider.io/external-name";

/// A Topic is a managed, partitioned, replicated message log on a Kafka
/// cluster.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.provider.io",
    version = "v1alpha1",
    kind = "Topic",
    plural = "topics",
    shortname = "ktop",
    status = "TopicStatus",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Partitions","type":"integer","jsonPath":".spec.partitions"}"#,
    printcolumn = r#"{"name":"Replication","type":"integer","jsonPath":".spec.replicationFactor"}"#,
    printcolumn = r#"{"name":"Id","type":"string","jsonPath":".status.atProvider.id"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TopicSpec {
    /// The provider config holding the cluster connection details.
    pub provider_config_ref: ProviderConfigReference,

    /// Desired number of partitions.
    #[serde(default = "default::partitions")]
    pub partitions: i32,

    /// Desired per-partition replication factor.
    #[serde(default = "default::replication_factor")]
    pub replication_factor: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicStatus {
    #[serde(default)]
    pub conditions: Conditions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// State of the topic as last observed on the cluster.
    #[serde(default)]
    pub at_provider: AtProvider,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AtProvider {
    /// The externally tracked topic identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<i32>,
}

/// Connection details for a Kafka cluster, referenced by topics.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kafka.provider.io",
    version = "v1alpha1",
    kind = "ProviderConfig",
    plural = "providerconfigs"
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    pub credentials: ProviderCredentials,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// The secret key holding the JSON credentials document.
    pub secret_ref: SecretKeySelector,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

/// The name of the topic on the Kafka cluster.
pub fn external_name(topic: &Topic) -> String {
    topic
        .annotations()
        .get(ANNOTATION_EXTERNAL_NAME)
        .cloned()
        .unwrap_or_else(|| topic.name_any())
}

mod default {
    pub(crate) fn partitions() -> i32 {
        1
    }

    pub(crate) fn replication_factor() -> i32 {
        1
    }
}
