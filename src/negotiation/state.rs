//! Contract Negotiation FSM State Definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::process::{ProcessState, Transition};

/// Contract Negotiation States
///
/// Terminal states: FINALIZED, TERMINATED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationState {
    /// Consumer has requested (or counter-requested) an offer
    Requested,
    /// Provider has offered (or counter-offered)
    Offered,
    /// Consumer accepted the latest offer
    Accepted,
    /// Provider minted an agreement
    Agreed,
    /// Consumer verified the agreement
    Verified,
    /// Terminal: negotiation concluded with a binding agreement
    Finalized,
    /// Terminal: either side gave up
    Terminated,
}

impl NegotiationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationState::Requested => "REQUESTED",
            NegotiationState::Offered => "OFFERED",
            NegotiationState::Accepted => "ACCEPTED",
            NegotiationState::Agreed => "AGREED",
            NegotiationState::Verified => "VERIFIED",
            NegotiationState::Finalized => "FINALIZED",
            NegotiationState::Terminated => "TERMINATED",
        }
    }
}

impl ProcessState for NegotiationState {
    #[inline]
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Finalized | NegotiationState::Terminated
        )
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal edges of the negotiation state machine
pub mod transitions {
    use super::NegotiationState::{self, *};
    use crate::process::Transition;

    pub const REQUEST_NEW: Transition<NegotiationState> = Transition {
        operation: "RequestContract",
        from: &[],
        to: Requested,
    };

    pub const REQUEST: Transition<NegotiationState> = Transition {
        operation: "RequestContract",
        from: &[Offered],
        to: Requested,
    };

    pub const OFFER_NEW: Transition<NegotiationState> = Transition {
        operation: "OfferContract",
        from: &[],
        to: Offered,
    };

    pub const OFFER: Transition<NegotiationState> = Transition {
        operation: "OfferContract",
        from: &[Requested],
        to: Offered,
    };

    pub const ACCEPT: Transition<NegotiationState> = Transition {
        operation: "AcceptOffer",
        from: &[Offered],
        to: Accepted,
    };

    pub const AGREE: Transition<NegotiationState> = Transition {
        operation: "AgreeContract",
        from: &[Requested, Accepted],
        to: Agreed,
    };

    pub const VERIFY: Transition<NegotiationState> = Transition {
        operation: "VerifyAgreement",
        from: &[Agreed],
        to: Verified,
    };

    pub const FINALIZE: Transition<NegotiationState> = Transition {
        operation: "FinalizeContract",
        from: &[Verified],
        to: Finalized,
    };

    pub const TERMINATE: Transition<NegotiationState> = Transition {
        operation: "TerminateContract",
        from: &[Requested, Offered, Accepted, Agreed, Verified],
        to: Terminated,
    };

    pub const ALL: &[Transition<NegotiationState>] = &[
        REQUEST_NEW,
        REQUEST,
        OFFER_NEW,
        OFFER,
        ACCEPT,
        AGREE,
        VERIFY,
        FINALIZE,
        TERMINATE,
    ];
}

/// Whether `from → to` is an edge of the negotiation graph
pub fn is_legal(from: NegotiationState, to: NegotiationState) -> bool {
    transitions::ALL
        .iter()
        .any(|t: &Transition<NegotiationState>| t.to == to && t.allows(from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use NegotiationState::*;

    const STATES: [NegotiationState; 7] = [
        Requested, Offered, Accepted, Agreed, Verified, Finalized, Terminated,
    ];

    #[test]
    fn test_terminal_states() {
        assert!(Finalized.is_terminal());
        assert!(Terminated.is_terminal());

        assert!(!Requested.is_terminal());
        assert!(!Offered.is_terminal());
        assert!(!Accepted.is_terminal());
        assert!(!Agreed.is_terminal());
        assert!(!Verified.is_terminal());
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
    fn test_termination_from_every_open_state() {
        for from in STATES.iter().filter(|s| !s.is_terminal()) {
            assert!(is_legal(*from, Terminated));
        }
    }

    #[test]
    fn test_agree_from_requested_or_accepted() {
        assert!(is_legal(Requested, Agreed));
        assert!(is_legal(Accepted, Agreed));
        assert!(!is_legal(Offered, Agreed));
        assert!(!is_legal(Agreed, Agreed));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(Verified).unwrap(), "VERIFIED");
        let parsed: NegotiationState = serde_json::from_str("\"FINALIZED\"").unwrap();
        assert_eq!(parsed, Finalized);
        assert_eq!(Agreed.to_string(), "AGREED");
    }
}
