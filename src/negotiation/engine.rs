//! Contract Negotiation Engine
//!
//! `NegotiationEngine<R>` is instantiated once per role. Operations both
//! roles share live here; role-only operations live in `provider.rs` and
//! `consumer.rs`.

use std::sync::Arc;

use tracing::info;

use super::messages::{
    ContractNegotiationTerminationMessage, NEGOTIATION_TERMINATION, NegotiationSnapshot,
};
use super::state::transitions;
use super::types::NegotiationRecord;
use crate::error::ProtocolError;
use crate::ids::IdGenerator;
use crate::policy::{Agreement, PolicyStore};
use crate::process::{
    Executor, Outgoing, Participant, Process, RecordStore, Role, RoleMarker, StatusReason,
    expect_type,
};
use crate::transport::Transport;

pub struct NegotiationEngine<R: Role> {
    pub(super) exec: Executor<NegotiationRecord>,
    pub(super) policies: Arc<dyn PolicyStore>,
    pub(super) local: Participant,
    _role: RoleMarker<R>,
}

impl<R: Role> NegotiationEngine<R> {
    pub fn new(
        local: Participant,
        store: Arc<dyn RecordStore<NegotiationRecord>>,
        policies: Arc<dyn PolicyStore>,
        transport: Arc<dyn Transport>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            exec: Executor::new(R::SIDE, store, transport, ids),
            policies,
            local,
            _role: Default::default(),
        }
    }

    pub fn participant(&self) -> &Participant {
        &self.local
    }

    /// Full local record by our own pid
    pub async fn get(&self, pid: &str) -> Result<NegotiationRecord, ProtocolError> {
        self.exec.get(pid).await
    }

    /// Protocol view (`GET /negotiations/{pid}`); terminal records stay readable
    pub async fn snapshot(&self, pid: &str) -> Result<NegotiationSnapshot, ProtocolError> {
        Ok(self.exec.get(pid).await?.snapshot())
    }

    pub async fn agreement(&self, id: &str) -> Result<Agreement, ProtocolError> {
        self.policies
            .agreement(id)
            .await?
            .ok_or_else(|| ProtocolError::not_found("agreement", id))
    }

    /// TerminateContract: any open state → TERMINATED, notifying the counterpart
    pub async fn terminate(
        &self,
        pid: &str,
        status: StatusReason,
    ) -> Result<NegotiationRecord, ProtocolError> {
        let side = R::SIDE;
        let record = self
            .exec
            .send(&transitions::TERMINATE, pid, None, |record| {
                record.termination = Some(status.clone());
                let path = format!("negotiations/{}/termination", side.counterpart(&record.pids));
                let msg = ContractNegotiationTerminationMessage::new(record.pids.clone(), status);
                Outgoing::new(path, &msg)
            })
            .await?;
        info!(side = %side, pid = %pid, "Negotiation terminated");
        Ok(record)
    }

    /// Counterpart terminated the negotiation
    pub async fn handle_termination(
        &self,
        msg: ContractNegotiationTerminationMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, NEGOTIATION_TERMINATION)?;
        let status = msg.status;
        let record = self
            .exec
            .receive(&transitions::TERMINATE, &msg.pids, None, |record| {
                record.termination = Some(status);
                Ok(())
            })
            .await?;
        Ok(record.snapshot())
    }
}
