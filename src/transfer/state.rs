//! Transfer Process FSM State Definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::process::{ProcessState, Transition};

/// Transfer Process States
///
/// Terminal states: COMPLETED, TERMINATED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferState {
    /// Consumer asked for a transfer under an agreement
    Requested,
    /// Data may flow
    Started,
    /// Paused by either side, resumable with a new start
    Suspended,
    /// Terminal: transfer finished
    Completed,
    /// Terminal: either side gave up
    Terminated,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Requested => "REQUESTED",
            TransferState::Started => "STARTED",
            TransferState::Suspended => "SUSPENDED",
            TransferState::Completed => "COMPLETED",
            TransferState::Terminated => "TERMINATED",
        }
    }
}

impl ProcessState for TransferState {
    #[inline]
    fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Terminated)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal edges of the transfer state machine
pub mod transitions {
    use super::TransferState::{self, *};
    use crate::process::Transition;

    pub const REQUEST: Transition<TransferState> = Transition {
        operation: "RequestTransfer",
        from: &[],
        to: Requested,
    };

    pub const START: Transition<TransferState> = Transition {
        operation: "StartTransfer",
        from: &[Requested, Suspended],
        to: Started,
    };

    pub const SUSPEND: Transition<TransferState> = Transition {
        operation: "SuspendTransfer",
        from: &[Started],
        to: Suspended,
    };

    pub const COMPLETE: Transition<TransferState> = Transition {
        operation: "CompleteTransfer",
        from: &[Started],
        to: Completed,
    };

    pub const TERMINATE: Transition<TransferState> = Transition {
        operation: "TerminateTransfer",
        from: &[Requested, Started, Suspended],
        to: Terminated,
    };

    pub const ALL: &[Transition<TransferState>] = &[REQUEST, START, SUSPEND, COMPLETE, TERMINATE];
}

/// Whether `from → to` is an edge of the transfer graph
pub fn is_legal(from: TransferState, to: TransferState) -> bool {
    transitions::ALL
        .iter()
        .any(|t: &Transition<TransferState>| t.to == to && t.allows(from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransferState::*;

    const STATES: [TransferState; 5] = [Requested, Started, Suspended, Completed, Terminated];

    #[test]
    fn test_terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Terminated.is_terminal());
        assert!(!Requested.is_terminal());
        assert!(!Started.is_terminal());
        assert!(!Suspended.is_terminal());
    }

    #[test]
    fn test_no_edge_leaves_terminal_state() {
        for from in STATES.iter().filter(|s| s.is_terminal()) {
            for to in STATES {
                assert!(!is_legal(*from, to), "{} -> {} must not exist", from, to);
            }
        }
    }

    #[test]
    fn test_resume_and_completion_edges() {
        assert!(is_legal(Suspended, Started));
        assert!(is_legal(Requested, Started));
        assert!(!is_legal(Requested, Completed));
        assert!(!is_legal(Suspended, Completed));
        assert!(!is_legal(Requested, Suspended));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(Suspended).unwrap(), "SUSPENDED");
        let parsed: TransferState = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, Completed);
    }
}
