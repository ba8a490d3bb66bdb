//! Offers and Agreements
//!
//! Offers are published by the provider (or learned by the consumer from a
//! received `ContractOfferMessage`). Agreements are minted by the provider's
//! negotiation engine and stored on both sides, exactly once per negotiation.

pub mod store;
pub mod types;

pub use store::{MemoryPolicyStore, PolicyStore};
pub use types::{Agreement, Constraint, Offer, Rule};
