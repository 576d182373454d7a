//! The boundary towards the external system.
//!
//! A connector produces an external client for a managed resource, and the
//! client maps the resource's desired state onto the external system with
//! the observe/create/update/delete capability set.

use crate::controller::reconciler::ReconcileError;
use async_trait::async_trait;

/// The result of observing the external resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// Whether the external resource exists at all.
    pub resource_exists: bool,
    /// Whether the external resource matches the desired state.
    pub resource_up_to_date: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalCreation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalUpdate;

/// Operations against the external system, for a single managed resource.
///
/// Implementations may record observed state on the resource (e.g. in its
/// status section), which the caller is expected to persist.
#[async_trait]
pub trait ExternalClient<T>: Send + Sync
where
    T: Send + Sync,
{
    async fn observe(&self, mg: &mut T) -> Result<ExternalObservation, ReconcileError>;
    async fn create(&self, mg: &mut T) -> Result<ExternalCreation, ReconcileError>;
    async fn update(&self, mg: &mut T) -> Result<ExternalUpdate, ReconcileError>;
    async fn delete(&self, mg: &mut T) -> Result<(), ReconcileError>;
}

/// Produces an [`ExternalClient`] for a managed resource.
///
/// Called once per reconciliation pass, so that credential changes are
/// picked up without restarting the controller.
#[async_trait]
pub trait ExternalConnector<T>: Send + Sync
where
    T: Send + Sync,
{
    type Client: ExternalClient<T>;

    async fn connect(&self, mg: &T) -> Result<Self::Client, ReconcileError>;
}
