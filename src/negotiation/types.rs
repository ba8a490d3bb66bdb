//! Contract Negotiation record

use serde::{Deserialize, Serialize};

use super::state::NegotiationState;
use crate::policy::Offer;
use crate::process::{Pids, Process, StatusReason};

/// One side's view of a negotiation, keyed by that side's pid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRecord {
    #[serde(flatten)]
    pub pids: Pids,
    pub state: NegotiationState,
    /// Latest offer exchanged, with any consumer-bound constraint values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<Offer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<String>,
    #[serde(default)]
    pub assigner: String,
    #[serde(default)]
    pub assignee: String,
    /// Counterpart's protocol base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<StatusReason>,
}

impl NegotiationRecord {
    pub fn new(pids: Pids, state: NegotiationState, callback_address: impl Into<String>) -> Self {
        Self {
            pids,
            state,
            offer: None,
            agreement_id: None,
            assigner: String::new(),
            assignee: String::new(),
            callback_address: Some(callback_address.into()),
            termination: None,
        }
    }

    /// Record the offer under negotiation and the parties it binds
    pub fn bind_offer(&mut self, offer: Offer) {
        self.assigner = offer.assigner.clone();
        if !offer.assignee.is_empty() {
            self.assignee = offer.assignee.clone();
        }
        self.offer = Some(offer);
    }
}

impl Process for NegotiationRecord {
    type State = NegotiationState;

    const ACK_TYPE: &'static str = "ContractNegotiation";
    const KIND: &'static str = "negotiation";

    fn pids(&self) -> &Pids {
        &self.pids
    }

    fn pids_mut(&mut self) -> &mut Pids {
        &mut self.pids
    }

    fn state(&self) -> NegotiationState {
        self.state
    }

    fn set_state(&mut self, state: NegotiationState) {
        self.state = state;
    }

    fn callback_address(&self) -> Option<&str> {
        self.callback_address.as_deref()
    }

    fn set_callback_address(&mut self, address: String) {
        self.callback_address = Some(address);
    }
}
