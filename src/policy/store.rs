//! Offer and Agreement stores

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::types::{Agreement, Offer};
use crate::process::StoreError;

/// Offer / Agreement store capability
///
/// Both record kinds are immutable once stored.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn offer(&self, id: &str) -> Result<Option<Offer>, StoreError>;

    /// Publish an offer; `false` if one with that id already exists
    async fn insert_offer(&self, offer: Offer) -> Result<bool, StoreError>;

    async fn agreement(&self, id: &str) -> Result<Option<Agreement>, StoreError>;

    /// Store a new agreement; `StoreError::Duplicate` if the id is taken
    async fn insert_agreement(&self, agreement: Agreement) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryPolicyStore {
    offers: DashMap<String, Offer>,
    agreements: DashMap<String, Agreement>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn offer(&self, id: &str) -> Result<Option<Offer>, StoreError> {
        Ok(self.offers.get(id).map(|o| o.value().clone()))
    }

    async fn insert_offer(&self, offer: Offer) -> Result<bool, StoreError> {
        match self.offers.entry(offer.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(offer);
                Ok(true)
            }
        }
    }

    async fn agreement(&self, id: &str) -> Result<Option<Agreement>, StoreError> {
        Ok(self.agreements.get(id).map(|a| a.value().clone()))
    }

    async fn insert_agreement(&self, agreement: Agreement) -> Result<(), StoreError> {
        match self.agreements.entry(agreement.id.clone()) {
            Entry::Occupied(slot) => Err(StoreError::Duplicate(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(agreement);
                Ok(())
            }
        }
    }
}
