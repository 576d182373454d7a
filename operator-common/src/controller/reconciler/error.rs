use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Reconciliation failed with a permanent error: {0}")]
    Permanent(String),
    #[error("Reconciliation failed with a temporary error: {0}")]
    Temporary(String),
}

impl ReconcileError {
    pub fn permanent<S: ToString>(s: S) -> Self {
        Self::Permanent(s.to_string())
    }

    pub fn temporary<S: ToString>(s: S) -> Self {
        Self::Temporary(s.to_string())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl From<kube::Error> for ReconcileError {
    fn from(err: kube::Error) -> Self {
        // API server trouble is worth retrying
        Self::temporary(err)
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        Self::permanent(err)
    }
}
