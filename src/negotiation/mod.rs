//! Contract Negotiation
//!
//! Provider and consumer agree on the usage policy of one dataset. Each side
//! keeps its own [`NegotiationRecord`] keyed by its own pid; every transition
//! is either driven locally (and acknowledged by the counterpart) or applied
//! on receipt of a counterpart message.
//!
//! # State Machine
//!
//! ```text
//!            ┌──────── OfferContract ────────┐
//!            ▼                               │
//! REQUESTED ───── OfferContract ────▶ OFFERED ──── AcceptOffer ───▶ ACCEPTED
//!     │    ◀──── RequestContract ─────                                 │
//!     │                                                                │
//!     └──────────────── AgreeContract ──────▶ AGREED ◀── AgreeContract ┘
//!                                               │
//!                                        VerifyAgreement
//!                                               ▼
//!                                           VERIFIED ── FinalizeContract ──▶ FINALIZED
//!
//! any non-terminal state ── TerminateContract ──▶ TERMINATED
//! ```
//!
//! # Invariants
//!
//! 1. **One Agreement**: at most one agreement is minted per negotiation
//! 2. **Assigner Stability**: the assigner named by the first offer never changes
//! 3. **Terminal Is Final**: FINALIZED and TERMINATED records accept no transition

pub mod consumer;
pub mod engine;
pub mod messages;
pub mod provider;
pub mod state;
pub mod types;


pub use consumer::RequestParams;
pub use engine::NegotiationEngine;
pub use messages::NegotiationSnapshot;
pub use provider::OfferParams;
pub use state::NegotiationState;
pub use types::NegotiationRecord;
