mod controller;
mod crd;
mod kafka;

pub use crate::controller::ControllerConfig;
pub use crate::crd::{ProviderConfig, Topic};

use crate::controller::topic::TopicConnector;
use anyhow::Context as _;
use futures::StreamExt;
use kube::{
    api::{Api, Patch, PatchParams},
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Error as FinalizerError, Event},
        watcher,
    },
    Client, ResourceExt,
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use provider_kafka_operator_common::controller::{
    base::{ProcessOutcome, ReadyState, CONDITION_READY, CONDITION_RECONCILED},
    reconciler::{ManagedReconciler, ReconcileError},
};
use provider_kafka_service_common::health::{HealthServer, HealthServerConfig};
use serde::Deserialize;
use std::sync::Arc;

const FINALIZER: &str = "kafka.provider.io/topic";

lazy_static! {
    static ref RECONCILES: IntCounterVec = register_int_counter_vec!(
        "topic_operator_reconciles",
        "Reconciliation passes by outcome",
        &["outcome"]
    )
    .expect("Metric must register");
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub health: Option<HealthServerConfig>,
}

struct Context {
    topics: Api<Topic>,
    reconciler: ManagedReconciler<TopicConnector>,
    config: ControllerConfig,
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    log::debug!("Config: {:#?}", config);

    let kube = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let topics: Api<Topic> = Api::all(kube.clone());

    // controller

    let reconciler = ManagedReconciler::new(TopicConnector::new(
        kube.clone(),
        config.controller.clone(),
    ))
    .with_retry_delay(config.controller.retry_delay);

    let context = Arc::new(Context {
        topics: topics.clone(),
        reconciler,
        config: config.controller,
    });

    // health server

    if let Some(health) = config.health {
        let health = HealthServer::new(
            health,
            vec![],
            Some(prometheus::default_registry().clone()),
        );
        tokio::spawn(async move {
            if let Err(err) = health.run().await {
                log::error!("Health server failed: {err}");
            }
        });
    }

    // run

    log::info!("Running service ...");
    Controller::new(topics, watcher::Config::default())
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((topic, action)) => {
                    log::debug!("Reconciled {}: {:?}", topic.name, action);
                }
                Err(err) => {
                    log::info!("Reconciliation failed: {err}");
                }
            }
        })
        .await;

    // the watch stream never ends on a healthy cluster connection
    Err(anyhow::anyhow!("Controller exited unexpectedly"))
}

async fn reconcile(
    topic: Arc<Topic>,
    ctx: Arc<Context>,
) -> Result<Action, FinalizerError<ReconcileError>> {
    finalizer(&ctx.topics, FINALIZER, topic, |event| {
        let ctx = ctx.clone();
        async move {
            match event {
                Event::Apply(topic) => apply(topic, ctx).await,
                Event::Cleanup(topic) => cleanup(topic, ctx).await,
            }
        }
    })
    .await
}

fn error_policy(
    _topic: Arc<Topic>,
    err: &FinalizerError<ReconcileError>,
    ctx: Arc<Context>,
) -> Action {
    RECONCILES.with_label_values(&["error"]).inc();
    log::warn!("Reconciliation failed, requeueing: {err}");
    Action::requeue(ctx.config.retry_delay)
}

async fn apply(topic: Arc<Topic>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let mut mg = (*topic).clone();

    let result = ctx.reconciler.reconcile(&mut mg).await;

    // record the outcome in the status conditions

    let mut status = mg.status.take().unwrap_or_default();
    match &result {
        Ok(outcome) => {
            RECONCILES.with_label_values(&[outcome_label(outcome)]).inc();
            status.conditions.update(
                CONDITION_READY,
                if outcome.resource_exists {
                    ReadyState::Complete
                } else {
                    ReadyState::Progressing
                },
            );
            status.conditions.update(
                CONDITION_RECONCILED,
                if outcome.is_complete() {
                    ReadyState::Complete
                } else {
                    ReadyState::Progressing
                },
            );
        }
        Err(err) => {
            status
                .conditions
                .update(CONDITION_READY, ReadyState::Failed(err.to_string()));
            status
                .conditions
                .update(CONDITION_RECONCILED, ReadyState::Failed(err.to_string()));
        }
    }
    status.observed_generation = mg.metadata.generation;

    ctx.topics
        .patch_status(
            &mg.name_any(),
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await?;

    match result {
        Ok(ProcessOutcome::Complete(_)) => Ok(Action::requeue(ctx.config.sync_interval)),
        Ok(ProcessOutcome::Retry(_, delay)) => {
            Ok(Action::requeue(delay.unwrap_or(ctx.config.retry_delay)))
        }
        Err(err) if err.is_temporary() => Err(err),
        Err(err) => {
            // permanent, settle until the next sync
            log::warn!("Reconciliation failed permanently: {err}");
            Ok(Action::requeue(ctx.config.sync_interval))
        }
    }
}

async fn cleanup(topic: Arc<Topic>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let mut mg = (*topic).clone();

    ctx.reconciler.cleanup(&mut mg).await?;

    RECONCILES.with_label_values(&["deleted"]).inc();
    Ok(Action::await_change())
}

fn outcome_label<T>(outcome: &ProcessOutcome<T>) -> &'static str {
    if outcome.is_complete() {
        "complete"
    } else {
        "retry"
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn outcomes_are_labelled() {
        assert_eq!(outcome_label(&ProcessOutcome::Complete(())), "complete");
        assert_eq!(outcome_label(&ProcessOutcome::Retry((), None)), "retry");
    }
}
