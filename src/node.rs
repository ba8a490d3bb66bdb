//! Composition root
//!
//! A [`Node`] bundles the engines one participant runs in one role, wired to
//! shared stores, one transport and one id generator.

use std::sync::Arc;

use tracing::info;

use crate::error::ProtocolError;
use crate::ids::IdGenerator;
use crate::negotiation::{NegotiationEngine, NegotiationRecord};
use crate::policy::{MemoryPolicyStore, Offer, PolicyStore};
use crate::process::{MemoryRecordStore, Participant, RecordStore, Role};
use crate::transfer::{TransferEngine, TransferRecord};
use crate::transport::Transport;

pub struct Node<R: Role> {
    pub negotiations: Arc<NegotiationEngine<R>>,
    pub transfers: Arc<TransferEngine<R>>,
    pub policies: Arc<dyn PolicyStore>,
    pub participant: Participant,
}

// Manual impl: `R` itself need not be `Clone`
impl<R: Role> Clone for Node<R> {
    fn clone(&self) -> Self {
        Self {
            negotiations: self.negotiations.clone(),
            transfers: self.transfers.clone(),
            policies: self.policies.clone(),
            participant: self.participant.clone(),
        }
    }
}

impl<R: Role> Node<R> {
    /// Node backed by in-memory stores
    pub fn new(
        participant: Participant,
        transport: Arc<dyn Transport>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self::with_stores(
            participant,
            transport,
            ids,
            MemoryRecordStore::<NegotiationRecord>::shared(),
            MemoryRecordStore::<TransferRecord>::shared(),
            Arc::new(MemoryPolicyStore::new()),
        )
    }

    pub fn with_stores(
        participant: Participant,
        transport: Arc<dyn Transport>,
        ids: Arc<dyn IdGenerator>,
        negotiation_store: Arc<dyn RecordStore<NegotiationRecord>>,
        transfer_store: Arc<dyn RecordStore<TransferRecord>>,
        policies: Arc<dyn PolicyStore>,
    ) -> Self {
        let negotiations = NegotiationEngine::new(
            participant.clone(),
            negotiation_store,
            policies.clone(),
            transport.clone(),
            ids.clone(),
        );
        let transfers = TransferEngine::new(
            participant.clone(),
            transfer_store,
            policies.clone(),
            transport,
            ids,
        );
        info!(
            side = %R::SIDE,
            participant_id = %participant.participant_id,
            callback_address = %participant.callback_address,
            "Node assembled"
        );
        Self {
            negotiations: Arc::new(negotiations),
            transfers: Arc::new(transfers),
            policies,
            participant,
        }
    }

    /// Make an offer available for negotiation; `false` if the id is taken
    pub async fn publish_offer(&self, offer: Offer) -> Result<bool, ProtocolError> {
        Ok(self.policies.insert_offer(offer).await?)
    }
}
