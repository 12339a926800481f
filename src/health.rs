//! Deep health check results.

use crate::error::{Error, Result};
use serde::Serialize;

/// Outcome of a single dependency check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Health of one dependency, e.g. `{"name":"db","status":"healthy"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub name: String,
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of pinging every dependency, in check order.
///
/// Serializes as `{"status":"healthy","details":[...]}`.
#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub details: Vec<HealthStatus>,
    #[serde(skip)]
    failures: Vec<Error>,
}

impl HealthReport {
    pub(crate) fn new() -> Self {
        HealthReport {
            status: HealthState::Healthy,
            details: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record the outcome of checking `name`.
    pub(crate) fn check(&mut self, name: &str, what: &str, result: Result<()>) {
        let (status, error) = match result {
            Ok(()) => (HealthState::Healthy, None),
            Err(e) => {
                let message = format!("failed to ping {}: {}", what, e);
                self.failures.push(e);
                self.status = HealthState::Unhealthy;
                (HealthState::Unhealthy, Some(message))
            }
        };

        self.details.push(HealthStatus {
            name: name.to_string(),
            status,
            error,
        });
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }

    /// First failure in check order.
    pub fn error(&self) -> Option<&Error> {
        self.failures.first()
    }
}
