//! Endpoint health state.
//!
//! # States
//! - Unknown: never checked
//! - Healthy: endpoint receives traffic
//! - Unhealthy: endpoint excluded from selection
//!
//! # State Transitions
//! ```text
//! any → Healthy:   connection attached, or probe answered Serving
//! any → Unhealthy: dial failed, probe failed/timed out/not serving,
//!                  or the connection was retired
//! ```
//!
//! An endpoint without a live connection is never Healthy.

use serde::Serialize;

/// Health State enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn from_probe(serving: bool) -> Self {
        if serving {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == HealthState::Healthy
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Unknown => write!(f, "unknown"),
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Unhealthy => write!(f, "unhealthy"),
        }
    }
}
