//! Per-service lifecycle state machine.

use crate::error::{ManagementError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a service unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// No runtime object installed.
    Uninstalled,
    /// Installation in progress; runtime object being built and started.
    Installing,
    /// Runtime object confirmed running.
    Running,
    /// Stop requested; waiting for the runtime object to release.
    Stopping,
}

impl ServiceState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_installed(&self) -> bool {
        !matches!(self, Self::Uninstalled)
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::Uninstalled
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

impl std::str::FromStr for ServiceState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "uninstalled" => Ok(Self::Uninstalled),
            "installing" => Ok(Self::Installing),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            _ => Err(format!("Invalid service state: {s}")),
        }
    }
}

/// Events driving the service state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceEvent {
    /// Begin installation of an uninstalled service.
    Install,
    /// Installation finished; the runtime object is confirmed running.
    Started,
    /// Begin stopping a running service.
    Stop,
    /// The runtime object has been released.
    Stopped,
    /// Begin an in-place recreation of a running service.
    Recreate,
    /// Installation failed before the service reached running.
    Fail,
}

/// Determine the target state for an event, or reject the transition.
pub fn determine_target_state(
    service: &str,
    current: ServiceState,
    event: ServiceEvent,
) -> Result<ServiceState> {
    let target = match (current, event) {
        (ServiceState::Uninstalled, ServiceEvent::Install) => ServiceState::Installing,
        (ServiceState::Installing, ServiceEvent::Started) => ServiceState::Running,
        (ServiceState::Running, ServiceEvent::Stop) => ServiceState::Stopping,
        (ServiceState::Stopping, ServiceEvent::Stopped) => ServiceState::Uninstalled,
        // Direct recreate edge used by the restart strategies.
        (ServiceState::Running, ServiceEvent::Recreate) => ServiceState::Installing,
        (ServiceState::Installing, ServiceEvent::Fail) => ServiceState::Uninstalled,
        (from, event) => {
            return Err(ManagementError::InvalidStateTransition {
                service: service.to_string(),
                from: from.to_string(),
                event: format!("{event:?}"),
            })
        }
    };
    Ok(target)
}
