//! Dataspace Connector - Contract Negotiation and Transfer Process engines
//!
//! Two participants, a data provider and a data consumer, negotiate usage
//! terms for a dataset and then track a bounded data exchange, purely through
//! request/acknowledgment messages. Each side stores its own view of every
//! exchange; the engines keep both views consistent without coordination.
//!
//! # Modules
//!
//! - [`process`] - Correlated process machinery (pids, roles, executor, locks, stores)
//! - [`negotiation`] - Contract Negotiation engine, both roles
//! - [`transfer`] - Transfer Process engine, both roles
//! - [`policy`] - Offers and agreements
//! - [`transport`] - Outbound message delivery
//! - [`ids`] - Correlation id generation
//! - [`node`] - Composition root
//! - [`gateway`] - axum HTTP surface

// Core
pub mod error;
pub mod ids;
pub mod process;

// Protocols
pub mod negotiation;
pub mod policy;
pub mod transfer;

// Seams and hosting
pub mod config;
pub mod gateway;
pub mod logging;
pub mod node;
pub mod transport;

// Convenient re-exports at crate root
pub use error::ProtocolError;
pub use negotiation::{NegotiationEngine, NegotiationRecord, NegotiationState};
pub use node::Node;
pub use process::{Consumer, Participant, Pids, Provider, Role, Side, StatusReason};
pub use transfer::{TransferEngine, TransferRecord, TransferState};
