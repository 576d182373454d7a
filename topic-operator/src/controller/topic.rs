//! The external client mapping a [`Topic`] onto the Kafka admin API.

use crate::{
    controller::ControllerConfig,
    crd::{external_name, ProviderConfig, Topic, TopicSpec},
    kafka::{KafkaConfig, ObservedTopic, TopicErrorConverter},
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use provider_kafka_operator_common::controller::{
    external::{
        ExternalClient, ExternalConnector, ExternalCreation, ExternalObservation, ExternalUpdate,
    },
    reconciler::ReconcileError,
};
use rdkafka::{
    admin::{AdminClient, AdminOptions, NewTopic, TopicReplication},
    client::DefaultClientContext,
    error::{KafkaError, KafkaResult, RDKafkaErrorCode},
    util::Timeout,
    ClientConfig,
};

const ERR_GET_PROVIDER_CONFIG: &str = "cannot get provider config";
const ERR_GET_CREDENTIALS: &str = "cannot get credentials";
const ERR_NEW_CLIENT: &str = "cannot create new Kafka client";

/// Produces a [`TopicClient`] by resolving the topic's provider config and
/// the credentials secret it references.
pub struct TopicConnector {
    kube: Client,
    config: ControllerConfig,
}

impl TopicConnector {
    pub fn new(kube: Client, config: ControllerConfig) -> Self {
        Self {
            kube,
            config: config.translate(),
        }
    }

    async fn credentials(&self, mg: &Topic) -> Result<KafkaConfig, ReconcileError> {
        let provider_configs: Api<ProviderConfig> = Api::all(self.kube.clone());
        let provider_config = provider_configs
            .get(&mg.spec.provider_config_ref.name)
            .await
            .map_err(|err| {
                ReconcileError::temporary(format!("{ERR_GET_PROVIDER_CONFIG}: {err}"))
            })?;

        let secret_ref = &provider_config.spec.credentials.secret_ref;
        let secrets: Api<Secret> = Api::namespaced(self.kube.clone(), &secret_ref.namespace);
        let secret = secrets
            .get(&secret_ref.name)
            .await
            .map_err(|err| ReconcileError::temporary(format!("{ERR_GET_CREDENTIALS}: {err}")))?;

        let data = secret
            .data
            .as_ref()
            .and_then(|data| data.get(&secret_ref.key))
            .ok_or_else(|| {
                ReconcileError::permanent(format!(
                    "{ERR_GET_CREDENTIALS}: missing key '{}'",
                    secret_ref.key
                ))
            })?;

        serde_json::from_slice(&data.0)
            .map_err(|err| ReconcileError::permanent(format!("{ERR_GET_CREDENTIALS}: {err}")))
    }
}

#[async_trait]
impl ExternalConnector<Topic> for TopicConnector {
    type Client = TopicClient;

    async fn connect(&self, mg: &Topic) -> Result<TopicClient, ReconcileError> {
        let credentials = self.credentials(mg).await?;

        let mut client_config: ClientConfig = credentials.into();
        // a metadata probe must not implicitly create the topic
        client_config.set("allow.auto.create.topics", "false");

        let admin = client_config
            .create()
            .map_err(|err| ReconcileError::permanent(format!("{ERR_NEW_CLIENT}: {err}")))?;

        Ok(TopicClient {
            admin,
            config: self.config.clone(),
        })
    }
}

pub struct TopicClient {
    admin: AdminClient<DefaultClientContext>,
    config: ControllerConfig,
}

impl TopicClient {
    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(Timeout::from(self.config.timeout)))
    }

    fn observe_topic(&self, name: &str) -> Result<Option<ObservedTopic>, KafkaError> {
        let metadata = self
            .admin
            .inner()
            .fetch_metadata(Some(name), self.config.timeout)?;

        let topic = match metadata.topics().iter().find(|t| t.name() == name) {
            Some(topic) => topic,
            None => return Ok(None),
        };

        let partition_replicas: Vec<usize> = topic
            .partitions()
            .iter()
            .map(|p| p.replicas().len())
            .collect();

        ObservedTopic::from_metadata(
            name,
            topic.error().map(RDKafkaErrorCode::from),
            &partition_replicas,
        )
    }
}

#[async_trait]
impl ExternalClient<Topic> for TopicClient {
    async fn observe(&self, mg: &mut Topic) -> Result<ExternalObservation, ReconcileError> {
        let name = external_name(mg);

        let observed = self
            .observe_topic(&name)
            .map_err(|err| ReconcileError::temporary(format!("cannot list topics: {err}")))?;

        let observed = match observed {
            Some(observed) => observed,
            None => {
                return Ok(ExternalObservation {
                    resource_exists: false,
                    resource_up_to_date: false,
                })
            }
        };

        let up_to_date = up_to_date(&mg.spec, &observed);

        let status = mg.status.get_or_insert_with(Default::default);
        status.at_provider.id = Some(observed.name);
        status.at_provider.partitions = Some(observed.partitions);
        status.at_provider.replication_factor = Some(observed.replication_factor);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
        })
    }

    async fn create(&self, mg: &mut Topic) -> Result<ExternalCreation, ReconcileError> {
        let name = external_name(mg);

        let mut config = Vec::with_capacity(self.config.properties.len());
        for (k, v) in &self.config.properties {
            config.push((k.as_str(), v.as_str()));
        }

        let topic = NewTopic {
            name: &name,
            num_partitions: mg.spec.partitions,
            replication: TopicReplication::Fixed(mg.spec.replication_factor),
            config,
        };

        let created = self
            .admin
            .create_topics(&[topic], &self.admin_options())
            .await
            .single_topic_response()
            .map_err(|err| ReconcileError::temporary(format!("create failed: {err}")))?;

        log::debug!("Topic {created} created");

        let status = mg.status.get_or_insert_with(Default::default);
        status.at_provider.id = Some(created);

        Ok(ExternalCreation)
    }

    async fn update(&self, mg: &mut Topic) -> Result<ExternalUpdate, ReconcileError> {
        // TODO: grow partitions via create_partitions, reject shrinking
        log::info!("Topic updates not supported yet: {}", external_name(mg));
        Ok(ExternalUpdate)
    }

    async fn delete(&self, mg: &mut Topic) -> Result<(), ReconcileError> {
        let name = external_name(mg);

        let result = self
            .admin
            .delete_topics(&[&name], &self.admin_options())
            .await
            .single_topic_response();

        interpret_delete(result, &name)
    }
}

/// Digest the deletion response. A topic which is already gone counts as
/// deleted.
fn interpret_delete(result: KafkaResult<String>, name: &str) -> Result<(), ReconcileError> {
    match result {
        Ok(deleted) => {
            log::info!("Topic {deleted} deleted");
            Ok(())
        }
        Err(KafkaError::AdminOp(
            RDKafkaErrorCode::UnknownTopic | RDKafkaErrorCode::UnknownTopicOrPartition,
        )) => {
            log::info!("Topic {name} was already deleted");
            Ok(())
        }
        Err(err) => Err(ReconcileError::temporary(format!("delete failed: {err}"))),
    }
}

/// Whether the live topic matches the desired spec. The replication factor
/// is taken from the first partition, and only checked when the topic has
/// partitions at all.
fn up_to_date(spec: &TopicSpec, observed: &ObservedTopic) -> bool {
    if observed.partitions != spec.partitions {
        return false;
    }
    if observed.partitions > 0 && observed.replication_factor != spec.replication_factor {
        return false;
    }
    true
}
