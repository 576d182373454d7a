use rdkafka::{
    admin::TopicResult,
    error::{KafkaError, KafkaResult, RDKafkaErrorCode},
    ClientConfig,
};
use serde::Deserialize;

/// The credentials document stored in the provider config secret.
#[derive(Clone, Debug, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    #[serde(default)]
    pub sasl: Option<KafkaSasl>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KafkaSasl {
    #[serde(default = "default_mechanism")]
    pub mechanism: String,
    pub username: String,
    pub password: String,
}

fn default_mechanism() -> String {
    "PLAIN".into()
}

impl From<KafkaConfig> for ClientConfig {
    fn from(cfg: KafkaConfig) -> Self {
        let mut result = ClientConfig::new();
        result.set("bootstrap.servers", cfg.brokers.join(","));

        if let Some(sasl) = cfg.sasl {
            result.set("security.protocol", "SASL_PLAINTEXT");
            result.set("sasl.mechanism", sasl.mechanism);
            result.set("sasl.username", sasl.username);
            result.set("sasl.password", sasl.password);
        }

        result
    }
}

pub trait TopicErrorConverter {
    /// Expect exactly one per-topic response, turning a missing, surplus, or
    /// failed response into an error.
    fn single_topic_response(self) -> KafkaResult<String>;
}

impl TopicErrorConverter for KafkaResult<Vec<TopicResult>> {
    fn single_topic_response(self) -> KafkaResult<String> {
        self.and_then(|mut r| {
            if r.len() > 1 {
                return Err(KafkaError::AdminOpCreation(format!(
                    "Unexpected number of topic responses: {}",
                    r.len()
                )));
            }
            match r.pop() {
                Some(Ok(topic)) => Ok(topic),
                Some(Err((_, err))) => Err(KafkaError::AdminOp(err)),
                None => Err(KafkaError::AdminOpCreation("Missing response".into())),
            }
        })
    }
}

/// Live topic state as reported by the cluster metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedTopic {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl ObservedTopic {
    /// Interpret the metadata of a single topic. An unknown topic maps to
    /// `Ok(None)`, any other topic-level error is passed through.
    ///
    /// `partition_replicas` holds the replica count of each partition.
    pub fn from_metadata(
        name: &str,
        error: Option<RDKafkaErrorCode>,
        partition_replicas: &[usize],
    ) -> KafkaResult<Option<Self>> {
        match error {
            Some(RDKafkaErrorCode::UnknownTopicOrPartition)
            | Some(RDKafkaErrorCode::UnknownTopic) => return Ok(None),
            Some(code) => return Err(KafkaError::MetadataFetch(code)),
            None => {}
        }

        Ok(Some(Self {
            name: name.into(),
            partitions: partition_replicas.len() as i32,
            replication_factor: partition_replicas.first().copied().unwrap_or_default() as i32,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_config_plain() {
        let cfg = KafkaConfig {
            brokers: vec!["kafka-0:9092".into(), "kafka-1:9092".into()],
            sasl: None,
        };

        let client: ClientConfig = cfg.into();
        assert_eq!(
            client.get("bootstrap.servers"),
            Some("kafka-0:9092,kafka-1:9092")
        );
        assert_eq!(client.get("security.protocol"), None);
    }

    #[test]
    fn client_config_sasl() {
        let cfg: KafkaConfig = serde_json::from_value(json!({
            "brokers": ["kafka:9092"],
            "sasl": {
                "username": "admin",
                "password": "secret",
            }
        }))
        .unwrap();

        let client: ClientConfig = cfg.into();
        assert_eq!(client.get("security.protocol"), Some("SASL_PLAINTEXT"));
        assert_eq!(client.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(client.get("sasl.username"), Some("admin"));
        assert_eq!(client.get("sasl.password"), Some("secret"));
    }

    #[test]
    fn single_response_ok() {
        let result: KafkaResult<Vec<TopicResult>> = Ok(vec![Ok("events".into())]);
        assert_eq!(result.single_topic_response().unwrap(), "events");
    }

    #[test]
    fn single_response_missing() {
        let result: KafkaResult<Vec<TopicResult>> = Ok(vec![]);
        assert!(result.single_topic_response().is_err());
    }

    #[test]
    fn single_response_surplus() {
        let result: KafkaResult<Vec<TopicResult>> =
            Ok(vec![Ok("a".into()), Ok("b".into())]);
        assert!(result.single_topic_response().is_err());
    }

    #[test]
    fn single_response_failed() {
        let result: KafkaResult<Vec<TopicResult>> = Ok(vec![Err((
            "events".into(),
            RDKafkaErrorCode::TopicAlreadyExists,
        ))]);
        assert!(matches!(
            result.single_topic_response(),
            Err(KafkaError::AdminOp(RDKafkaErrorCode::TopicAlreadyExists))
        ));
    }

    #[test]
    fn single_response_call_error() {
        let result: KafkaResult<Vec<TopicResult>> =
            Err(KafkaError::AdminOp(RDKafkaErrorCode::BrokerTransportFailure));
        assert!(matches!(
            result.single_topic_response(),
            Err(KafkaError::AdminOp(RDKafkaErrorCode::BrokerTransportFailure))
        ));
    }

    #[test]
    fn observed_unknown_topic_is_absent() {
        let observed = ObservedTopic::from_metadata(
            "events",
            Some(RDKafkaErrorCode::UnknownTopicOrPartition),
            &[],
        )
        .unwrap();
        assert_eq!(observed, None);
    }

    #[test]
    fn observed_other_error_propagates() {
        let result = ObservedTopic::from_metadata(
            "events",
            Some(RDKafkaErrorCode::TopicAuthorizationFailed),
            &[],
        );
        assert!(result.is_err());
    }

    #[test]
    fn observed_counts() {
        let observed = ObservedTopic::from_metadata("events", None, &[3, 3, 3])
            .unwrap()
            .unwrap();
        assert_eq!(observed.partitions, 3);
        assert_eq!(observed.replication_factor, 3);
    }

    #[test]
    fn observed_no_partitions() {
        let observed = ObservedTopic::from_metadata("events", None, &[])
            .unwrap()
            .unwrap();
        assert_eq!(observed.partitions, 0);
        assert_eq!(observed.replication_factor, 0);
    }

    #[test]
    fn credentials_parsing() {
        let cfg: KafkaConfig = serde_json::from_value(json!({
            "brokers": ["kafka:9092"],
        }))
        .unwrap();
        assert!(cfg.sasl.is_none());
    }
}
