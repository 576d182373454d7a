mod conditions;

pub use conditions::*;

use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

pub const CONDITION_RECONCILED: &str = "Reconciled";
pub const CONDITION_READY: &str = "Ready";

/// The result of processing a resource.
///
/// `Retry` carries an optional delay after which the resource should be
/// handed back to us. Without a delay, the scheduling is up to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome<T> {
    Complete(T),
    Retry(T, Option<Duration>),
}

impl<T> ProcessOutcome<T> {
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Self::Complete(_) => None,
            Self::Retry(_, delay) => *delay,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

impl<T> Deref for ProcessOutcome<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Complete(result) => result,
            Self::Retry(result, _) => result,
        }
    }
}

impl<T> DerefMut for ProcessOutcome<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Complete(ref mut result) => result,
            Self::Retry(ref mut result, _) => result,
        }
    }
}
