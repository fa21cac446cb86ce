//! Liveness endpoint.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// `"healthy"` while serving, `"draining"` during shutdown.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Seconds since the server was created.
    pub uptime_seconds: u64,
    /// Number of bound routes.
    pub routes: usize,
}

/// Produces [`HealthStatus`] snapshots.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started: Instant,
}

impl HealthCheck {
    /// Creates a health check starting now.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    /// Time since creation.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self, routes: usize, draining: bool) -> HealthStatus {
        HealthStatus {
            status: if draining { "draining" } else { "healthy" }.to_string(),
            service: self.service.clone(),
            version: self.version.clone(),
            uptime_seconds: self.uptime().as_secs(),
            routes,
        }
    }
}
