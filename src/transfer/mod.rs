//! Transfer Process
//!
//! Tracks one bounded data exchange under a concluded agreement. The engines
//! only move the correlated state; the data plane itself is driven by whoever
//! observes a transfer in STARTED.
//!
//! # State Machine
//!
//! ```text
//! REQUESTED ── start ──▶ STARTED ── complete ──▶ COMPLETED
//!     │                   │   ▲
//!     │             suspend   start
//!     │                   ▼   │
//!     │                 SUSPENDED
//!     │                   │
//!     └─────── terminate ─┴──────────────────▶ TERMINATED
//! ```
//!
//! # Invariants
//!
//! 1. **Agreement First**: a provider only accepts requests under a stored agreement
//! 2. **Addressed Legs**: PUSH is requested with a sink, PULL starts with a source
//! 3. **Terminal Is Final**: COMPLETED and TERMINATED records accept no transition

pub mod consumer;
pub mod engine;
pub mod messages;
pub mod provider;
pub mod state;
pub mod types;


pub use consumer::TransferParams;
pub use engine::TransferEngine;
pub use messages::TransferSnapshot;
pub use state::TransferState;
pub use types::{DataAddress, EndpointProperty, TransferFormat, TransferRecord};
