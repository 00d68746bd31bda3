//! Event types exchanged with the presentation layer.
//!
//! - Control commands: sent INTO the controller loop.
//! - State events: emitted FROM supervisors on every state transition.

use super::node::SupervisorState;
use serde::Serialize;

/// Commands a presentation layer sends into the controller loop.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    /// Start every node that is not already running.
    StartAll,
    /// Stop every node; no-op on already-stopped nodes.
    StopAll,
    /// Force a stop-then-start cycle on one node, picking up any pending
    /// launch-prefix edit.
    Restart {
        name: String,
    },
    Stop {
        name: String,
    },
    ToggleRespawn {
        name: String,
        enabled: bool,
    },
    /// Stage a new launch prefix; takes effect at the next start.
    SetLaunchPrefix {
        name: String,
        prefix: String,
    },
}

/// State events emitted by supervisors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Spawn is about to be attempted
    Starting {
        name: String,
    },
    /// Process spawned successfully
    Started {
        name: String,
        pid: u32,
        spawn_count: u32,
    },
    /// Graceful termination in progress
    Stopping {
        name: String,
    },
    /// Process is gone; clean exit or deliberate stop
    Stopped {
        name: String,
        exit_code: Option<i32>,
    },
    /// Process died with a nonzero exit code or was killed by a signal
    Died {
        name: String,
        exit_code: Option<i32>,
    },
    /// Automatic restart triggered by death detection
    Respawning {
        name: String,
    },
}

impl StateEvent {
    /// Get the node name this event refers to.
    pub fn node_name(&self) -> &str {
        match self {
            StateEvent::Starting { name }
            | StateEvent::Started { name, .. }
            | StateEvent::Stopping { name }
            | StateEvent::Stopped { name, .. }
            | StateEvent::Died { name, .. }
            | StateEvent::Respawning { name } => name,
        }
    }

    /// The supervisor state this event announces.
    pub fn state(&self) -> SupervisorState {
        match self {
            StateEvent::Starting { .. } | StateEvent::Respawning { .. } => {
                SupervisorState::Starting
            }
            StateEvent::Started { .. } => SupervisorState::Running,
            StateEvent::Stopping { .. } => SupervisorState::Stopping,
            StateEvent::Stopped { .. } => SupervisorState::Stopped,
            StateEvent::Died { .. } => SupervisorState::Died,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_name() {
        let event = StateEvent::Started {
            name: "/demo/talker".to_string(),
            pid: 123,
            spawn_count: 1,
        };
        assert_eq!(event.node_name(), "/demo/talker");
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(
            StateEvent::Respawning {
                name: "n".to_string()
            }
            .state(),
            SupervisorState::Starting
        );
        assert_eq!(
            StateEvent::Died {
                name: "n".to_string(),
                exit_code: Some(1)
            }
            .state(),
            SupervisorState::Died
        );
    }

    #[test]
    fn test_serialization() {
        let event = StateEvent::Died {
            name: "/talker".to_string(),
            exit_code: Some(3),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"died\""));
        assert!(json.contains("\"exit_code\":3"));
    }
}
