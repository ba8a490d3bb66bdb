//! Transfer Process protocol messages

use serde::{Deserialize, Serialize};

use super::state::TransferState;
use super::types::{DataAddress, TransferFormat};
use crate::process::{Pids, Snapshot, StatusReason, default_context};

pub const TRANSFER_REQUEST: &str = "TransferRequestMessage";
pub const TRANSFER_START: &str = "TransferStartMessage";
pub const TRANSFER_SUSPENSION: &str = "TransferSuspensionMessage";
pub const TRANSFER_COMPLETION: &str = "TransferCompletionMessage";
pub const TRANSFER_TERMINATION: &str = "TransferTerminationMessage";
pub const TRANSFER_ERROR: &str = "TransferError";

pub type TransferSnapshot = Snapshot<TransferState>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub agreement_id: String,
    pub format: TransferFormat,
    /// Consumer sink, required for PUSH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<DataAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
}

impl TransferRequestMessage {
    pub fn new(
        pids: Pids,
        agreement_id: impl Into<String>,
        format: TransferFormat,
        data_address: Option<DataAddress>,
        callback_address: Option<String>,
    ) -> Self {
        Self {
            context: default_context(),
            kind: TRANSFER_REQUEST.to_string(),
            pids,
            agreement_id: agreement_id.into(),
            format,
            data_address,
            callback_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStartMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    /// Provider source, required for PULL unless already known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<DataAddress>,
}

impl TransferStartMessage {
    pub fn new(pids: Pids, data_address: Option<DataAddress>) -> Self {
        Self {
            context: default_context(),
            kind: TRANSFER_START.to_string(),
            pids,
            data_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSuspensionMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    #[serde(flatten)]
    pub status: StatusReason,
}

impl TransferSuspensionMessage {
    pub fn new(pids: Pids, status: StatusReason) -> Self {
        Self {
            context: default_context(),
            kind: TRANSFER_SUSPENSION.to_string(),
            pids,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCompletionMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
}

impl TransferCompletionMessage {
    pub fn new(pids: Pids) -> Self {
        Self {
            context: default_context(),
            kind: TRANSFER_COMPLETION.to_string(),
            pids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTerminationMessage {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    #[serde(flatten)]
    pub status: StatusReason,
}

impl TransferTerminationMessage {
    pub fn new(pids: Pids, status: StatusReason) -> Self {
        Self {
            context: default_context(),
            kind: TRANSFER_TERMINATION.to_string(),
            pids,
            status,
        }
    }
}
