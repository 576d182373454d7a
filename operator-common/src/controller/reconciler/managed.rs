use crate::controller::{
    base::ProcessOutcome,
    external::{ExternalClient, ExternalConnector, ExternalObservation},
    reconciler::ReconcileError,
};
use std::time::Duration;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Drives a single reconciliation pass of a managed resource against the
/// external system.
///
/// The watch loop, backoff and work queueing are owned by the calling
/// framework. This type only decides which of the external operations to
/// run: create when the resource is absent, update when it drifted, and
/// nothing when it is settled.
pub struct ManagedReconciler<C> {
    connector: C,
    retry_delay: Duration,
}

impl<C> ManagedReconciler<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Delay before re-observing a resource we just mutated.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub async fn reconcile<T>(
        &self,
        mg: &mut T,
    ) -> Result<ProcessOutcome<ExternalObservation>, ReconcileError>
    where
        T: Send + Sync,
        C: ExternalConnector<T>,
    {
        let client = self.connector.connect(mg).await?;

        let observation = client.observe(mg).await?;

        if !observation.resource_exists {
            log::debug!("External resource missing, creating");
            client.create(mg).await?;
            return Ok(ProcessOutcome::Retry(observation, Some(self.retry_delay)));
        }

        if !observation.resource_up_to_date {
            log::debug!("External resource out of date, updating");
            client.update(mg).await?;
            return Ok(ProcessOutcome::Retry(observation, Some(self.retry_delay)));
        }

        Ok(ProcessOutcome::Complete(observation))
    }

    /// Tear down the external resource for a managed resource being deleted.
    pub async fn cleanup<T>(&self, mg: &mut T) -> Result<(), ReconcileError>
    where
        T: Send + Sync,
        C: ExternalConnector<T>,
    {
        let client = self.connector.connect(mg).await?;
        client.delete(mg).await
    }
}
