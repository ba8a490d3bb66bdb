//! Contract Negotiation protocol messages
//!
//! Flat JSON objects: `@context`, `@type`, both pids, and the
//! operation-specific payload.

use serde::{Deserialize, Serialize};

use super::state::NegotiationState;
use crate::policy::{Agreement, Offer};
use crate::process::{Pids, Snapshot, StatusReason, default_context};

pub const CONTRACT_REQUEST: &str = "ContractRequestMessage";
pub const CONTRACT_OFFER: &str = "ContractOfferMessage";
pub const CONTRACT_AGREEMENT: &str = "ContractAgreementMessage";
pub const AGREEMENT_VERIFICATION: &str = "ContractAgreementVerificationMessage";
pub const NEGOTIATION_EVENT: &str = "ContractNegotiationEventMessage";
pub const NEGOTIATION_TERMINATION: &str = "ContractNegotiationTerminationMessage";
pub const NEGOTIATION_ERROR: &str = "ContractNegotiationError";

/// Acknowledgment / read snapshot of a negotiation
pub type NegotiationSnapshot = Snapshot<NegotiationState>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequestMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub offer: Offer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
}

impl ContractRequestMessage {
    pub fn new(pids: Pids, offer: Offer, callback_address: Option<String>) -> Self {
        Self {
            context: default_context(),
            kind: CONTRACT_REQUEST.to_string(),
            pids,
            offer,
            callback_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractOfferMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub offer: Offer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
}

impl ContractOfferMessage {
    pub fn new(pids: Pids, offer: Offer, callback_address: Option<String>) -> Self {
        Self {
            context: default_context(),
            kind: CONTRACT_OFFER.to_string(),
            pids,
            offer,
            callback_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAgreementMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub agreement: Agreement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
}

impl ContractAgreementMessage {
    pub fn new(pids: Pids, agreement: Agreement, callback_address: Option<String>) -> Self {
        Self {
            context: default_context(),
            kind: CONTRACT_AGREEMENT.to_string(),
            pids,
            agreement,
            callback_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAgreementVerificationMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
}

impl ContractAgreementVerificationMessage {
    pub fn new(pids: Pids) -> Self {
        Self {
            context: default_context(),
            kind: AGREEMENT_VERIFICATION.to_string(),
            pids,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationEvent {
    Accepted,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNegotiationEventMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub event_type: NegotiationEvent,
}

impl ContractNegotiationEventMessage {
    pub fn new(pids: Pids, event_type: NegotiationEvent) -> Self {
        Self {
            context: default_context(),
            kind: NEGOTIATION_EVENT.to_string(),
            pids,
            event_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNegotiationTerminationMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    #[serde(flatten)]
    pub status: StatusReason,
}

impl ContractNegotiationTerminationMessage {
    pub fn new(pids: Pids, status: StatusReason) -> Self {
        Self {
            context: default_context(),
            kind: NEGOTIATION_TERMINATION.to_string(),
            pids,
            status,
        }
    }
}
