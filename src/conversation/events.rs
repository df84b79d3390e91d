//! Events observed on a run's stream.

use crate::tools::ToolCallRequest;

/// A single event delivered by a conversation run stream.
///
/// Only `RequiresAction` and the terminal variants drive resolution;
/// everything else is forwarded to the observer untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The run moved through a non-terminal status (created, queued, in progress)
    RunStatus {
        /// Run identifier
        run_id: String,
        /// Thread the run belongs to
        thread_id: String,
        /// Raw status string
        status: String,
    },
    /// An incremental chunk of assistant text
    MessageDelta {
        /// Message identifier
        message_id: String,
        /// Text added by this delta
        text: String,
    },
    /// An assistant message finished
    MessageCompleted {
        /// Message identifier
        message_id: String,
        /// Full message text
        text: String,
    },
    /// The run paused and is waiting for tool outputs
    RequiresAction {
        /// Run identifier
        run_id: String,
        /// Thread the run belongs to
        thread_id: String,
        /// Requested calls, in the order the service listed them
        tool_calls: Vec<ToolCallRequest>,
    },
    /// The run finished successfully
    RunCompleted {
        /// Run identifier
        run_id: String,
    },
    /// The run failed on the service side
    RunFailed {
        /// Run identifier
        run_id: String,
        /// Reason reported by the service
        reason: String,
    },
    /// The run was cancelled
    RunCancelled {
        /// Run identifier
        run_id: String,
    },
    /// The run expired before tool outputs arrived
    RunExpired {
        /// Run identifier
        run_id: String,
    },
    /// The run ended without completing
    RunIncomplete {
        /// Run identifier
        run_id: String,
        /// Reason reported by the service
        reason: String,
    },
    /// Any event this crate does not interpret
    Other {
        /// Event name as sent by the service
        event: String,
    },
}

impl RunEvent {
    /// Returns true if no further events follow for this run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RunCompleted { .. }
                | Self::RunFailed { .. }
                | Self::RunCancelled { .. }
                | Self::RunExpired { .. }
                | Self::RunIncomplete { .. }
        )
    }

    /// Returns the run identifier carried by this event, if any.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::RunStatus { run_id, .. }
            | Self::RequiresAction { run_id, .. }
            | Self::RunCompleted { run_id }
            | Self::RunFailed { run_id, .. }
            | Self::RunCancelled { run_id }
            | Self::RunExpired { run_id }
            | Self::RunIncomplete { run_id, .. } => Some(run_id),
            Self::MessageDelta { .. } | Self::MessageCompleted { .. } | Self::Other { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(RunEvent::RunCompleted { run_id: "r".into() }.is_terminal());
        assert!(RunEvent::RunExpired { run_id: "r".into() }.is_terminal());
        assert!(!RunEvent::RequiresAction {
            run_id: "r".into(),
            thread_id: "t".into(),
            tool_calls: vec![],
        }
        .is_terminal());
        assert!(!RunEvent::Other { event: "thread.run.step.created".into() }.is_terminal());
    }

    #[test]
    fn run_id_accessor() {
        let event = RunEvent::RunFailed {
            run_id: "run_1".into(),
            reason: "server_error".into(),
        };
        assert_eq!(event.run_id(), Some("run_1"));
        let delta = RunEvent::MessageDelta {
            message_id: "msg_1".into(),
            text: "hi".into(),
        };
        assert_eq!(delta.run_id(), None);
    }
}
