//! Correlated process machinery
//!
//! Shared by the negotiation and transfer engines. A *process* is one logical
//! exchange, identified by a pair of pids: one minted by each side. Each side
//! stores its own view, keyed by its own pid.
//!
//! # Seven-step outbound protocol
//!
//! ```text
//! load → check state → build message → resolve address → send → validate ack → persist
//! ```
//!
//! Inbound messages run the mirrored `load → check → apply → persist → ack`.
//! Both directions execute under the per-pid lock of [`lock::PidLocks`].

pub mod executor;
pub mod lock;
pub mod store;

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use executor::{Executor, Outgoing};
pub use lock::PidLocks;
pub use store::{MemoryRecordStore, RecordStore, StoreError};

/// JSON-LD context carried by every protocol message
pub const DSP_CONTEXT: &str = "https://w3id.org/dspace/2024/1/context.json";

pub(crate) fn default_context() -> String {
    DSP_CONTEXT.to_string()
}

/// Which side of an exchange a node plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Provider,
    Consumer,
}

impl Side {
    /// This side's own pid
    pub fn local<'a>(&self, pids: &'a Pids) -> &'a str {
        match self {
            Side::Provider => &pids.provider_pid,
            Side::Consumer => &pids.consumer_pid,
        }
    }

    /// The other side's pid (empty until the counterpart has answered)
    pub fn counterpart<'a>(&self, pids: &'a Pids) -> &'a str {
        match self {
            Side::Provider => &pids.consumer_pid,
            Side::Consumer => &pids.provider_pid,
        }
    }

    pub fn set_local(&self, pids: &mut Pids, pid: String) {
        match self {
            Side::Provider => pids.provider_pid = pid,
            Side::Consumer => pids.consumer_pid = pid,
        }
    }

    pub fn set_counterpart(&self, pids: &mut Pids, pid: String) {
        match self {
            Side::Provider => pids.consumer_pid = pid,
            Side::Consumer => pids.provider_pid = pid,
        }
    }

    /// Wire name of the local pid field
    pub fn local_field(&self) -> &'static str {
        match self {
            Side::Provider => "providerPid",
            Side::Consumer => "consumerPid",
        }
    }

    pub fn counterpart_field(&self) -> &'static str {
        match self {
            Side::Provider => "consumerPid",
            Side::Consumer => "providerPid",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Provider => "provider",
            Side::Consumer => "consumer",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the local node, embedded in outbound messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub participant_id: String,
    /// Base URL of this node's protocol endpoints
    pub callback_address: String,
}

impl Participant {
    pub fn new(participant_id: impl Into<String>, callback_address: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            callback_address: callback_address.into(),
        }
    }
}

/// Type-level role marker used to parametrize the engines
pub trait Role: Send + Sync + 'static {
    const SIDE: Side;
}

/// Data provider role
#[derive(Debug, Clone, Copy)]
pub struct Provider;

/// Data consumer role
#[derive(Debug, Clone, Copy)]
pub struct Consumer;

impl Role for Provider {
    const SIDE: Side = Side::Provider;
}

impl Role for Consumer {
    const SIDE: Side = Side::Consumer;
}

/// `PhantomData` that keeps the engines `Send + Sync` for any role
pub(crate) type RoleMarker<R> = PhantomData<fn() -> R>;

/// The correlation id pair of one process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pids {
    #[serde(default)]
    pub provider_pid: String,
    #[serde(default)]
    pub consumer_pid: String,
}

impl Pids {
    pub fn new(provider_pid: impl Into<String>, consumer_pid: impl Into<String>) -> Self {
        Self {
            provider_pid: provider_pid.into(),
            consumer_pid: consumer_pid.into(),
        }
    }
}

/// State of a process state machine
pub trait ProcessState:
    Copy + Eq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// No transition leaves a terminal state
    fn is_terminal(&self) -> bool;
}

/// A locally stored process record
pub trait Process: Clone + Send + Sync + 'static {
    type State: ProcessState;

    /// `@type` of the acknowledgment snapshot for this process kind
    const ACK_TYPE: &'static str;

    /// Used in error messages ("negotiation", "transfer process")
    const KIND: &'static str;

    fn pids(&self) -> &Pids;
    fn pids_mut(&mut self) -> &mut Pids;
    fn state(&self) -> Self::State;
    fn set_state(&mut self, state: Self::State);
    fn callback_address(&self) -> Option<&str>;
    fn set_callback_address(&mut self, address: String);

    fn snapshot(&self) -> Snapshot<Self::State> {
        Snapshot::new(Self::ACK_TYPE, self.pids().clone(), self.state())
    }
}

/// One legal edge set of a state machine
///
/// An empty `from` means the operation creates the record.
#[derive(Debug, Clone, Copy)]
pub struct Transition<S: 'static> {
    pub operation: &'static str,
    pub from: &'static [S],
    pub to: S,
}

impl<S: ProcessState> Transition<S> {
    pub fn allows(&self, state: S) -> bool {
        self.from.contains(&state)
    }

    pub fn expected(&self) -> String {
        self.from
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Acknowledgment / read snapshot of a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<S> {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(flatten)]
    pub pids: Pids,
    pub state: S,
}

impl<S> Snapshot<S> {
    pub fn new(kind: &str, pids: Pids, state: S) -> Self {
        Self {
            context: default_context(),
            kind: kind.to_string(),
            pids,
            state,
        }
    }
}

/// Code and reasons carried by termination and suspension messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReason {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub reason: Vec<String>,
}

impl StatusReason {
    pub fn new(code: impl Into<String>, reason: Vec<String>) -> Self {
        Self {
            code: code.into(),
            reason,
        }
    }
}

/// Reject a message whose `@type` is not the one the endpoint serves
pub(crate) fn expect_type(kind: &str, expected: &str) -> Result<(), crate::ProtocolError> {
    if kind != expected {
        return Err(crate::ProtocolError::InvalidRequest(format!(
            "expected @type {}, got {}",
            expected, kind
        )));
    }
    Ok(())
}
