//! Transfer Process Engine
//!
//! Start, suspend, complete and terminate are symmetric: either side may
//! drive them and either side handles them. Only the request leg is
//! role-specific.

use std::sync::Arc;

use tracing::info;

use super::messages::{
    TRANSFER_COMPLETION, TRANSFER_START, TRANSFER_SUSPENSION, TRANSFER_TERMINATION,
    TransferCompletionMessage, TransferSnapshot, TransferStartMessage, TransferSuspensionMessage,
    TransferTerminationMessage,
};
use super::state::transitions;
use super::types::{DataAddress, TransferRecord};
use crate::error::ProtocolError;
use crate::ids::IdGenerator;
use crate::policy::PolicyStore;
use crate::process::{
    Executor, Outgoing, Participant, Process, RecordStore, Role, RoleMarker, Side, StatusReason,
    expect_type,
};
use crate::transport::Transport;

pub struct TransferEngine<R: Role> {
    pub(super) exec: Executor<TransferRecord>,
    pub(super) policies: Arc<dyn PolicyStore>,
    pub(super) local: Participant,
    _role: RoleMarker<R>,
}

impl<R: Role> TransferEngine<R> {
    pub fn new(
        local: Participant,
        store: Arc<dyn RecordStore<TransferRecord>>,
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

    pub async fn get(&self, pid: &str) -> Result<TransferRecord, ProtocolError> {
        self.exec.get(pid).await
    }

    /// Protocol view (`GET /transfers/{pid}`)
    pub async fn snapshot(&self, pid: &str) -> Result<TransferSnapshot, ProtocolError> {
        Ok(self.exec.get(pid).await?.snapshot())
    }

    /// StartTransfer: REQUESTED | SUSPENDED → STARTED
    ///
    /// A PULL transfer needs a source address, either supplied here or
    /// stored by an earlier start.
    pub async fn start(
        &self,
        pid: &str,
        data_address: Option<DataAddress>,
    ) -> Result<TransferRecord, ProtocolError> {
        self.exec
            .send(&transitions::START, pid, None, |record| {
                record.prepare_start(data_address)?;
                let msg =
                    TransferStartMessage::new(record.pids.clone(), record.data_address.clone());
                Outgoing::new(action_path(R::SIDE, record, "start"), &msg)
            })
            .await
    }

    /// SuspendTransfer: STARTED → SUSPENDED
    pub async fn suspend(
        &self,
        pid: &str,
        status: StatusReason,
    ) -> Result<TransferRecord, ProtocolError> {
        self.exec
            .send(&transitions::SUSPEND, pid, None, |record| {
                record.reason = Some(status.clone());
                let msg = TransferSuspensionMessage::new(record.pids.clone(), status);
                Outgoing::new(action_path(R::SIDE, record, "suspension"), &msg)
            })
            .await
    }

    /// CompleteTransfer: STARTED → COMPLETED
    pub async fn complete(&self, pid: &str) -> Result<TransferRecord, ProtocolError> {
        self.exec
            .send(&transitions::COMPLETE, pid, None, |record| {
                let msg = TransferCompletionMessage::new(record.pids.clone());
                Outgoing::new(action_path(R::SIDE, record, "completion"), &msg)
            })
            .await
    }

    /// TerminateTransfer: REQUESTED | STARTED | SUSPENDED → TERMINATED
    pub async fn terminate(
        &self,
        pid: &str,
        status: StatusReason,
    ) -> Result<TransferRecord, ProtocolError> {
        let record = self
            .exec
            .send(&transitions::TERMINATE, pid, None, |record| {
                record.reason = Some(status.clone());
                let msg = TransferTerminationMessage::new(record.pids.clone(), status);
                Outgoing::new(action_path(R::SIDE, record, "termination"), &msg)
            })
            .await?;
        info!(side = %R::SIDE, pid = %pid, "Transfer terminated");
        Ok(record)
    }

    pub async fn handle_start(
        &self,
        msg: TransferStartMessage,
    ) -> Result<TransferSnapshot, ProtocolError> {
        expect_type(&msg.kind, TRANSFER_START)?;
        let address = msg.data_address;
        let record = self
            .exec
            .receive(&transitions::START, &msg.pids, None, |record| {
                record.prepare_start(address)
            })
            .await?;
        Ok(record.snapshot())
    }

    pub async fn handle_suspension(
        &self,
        msg: TransferSuspensionMessage,
    ) -> Result<TransferSnapshot, ProtocolError> {
        expect_type(&msg.kind, TRANSFER_SUSPENSION)?;
        let status = msg.status;
        let record = self
            .exec
            .receive(&transitions::SUSPEND, &msg.pids, None, |record| {
                record.reason = Some(status);
                Ok(())
            })
            .await?;
        Ok(record.snapshot())
    }

    pub async fn handle_completion(
        &self,
        msg: TransferCompletionMessage,
    ) -> Result<TransferSnapshot, ProtocolError> {
        expect_type(&msg.kind, TRANSFER_COMPLETION)?;
        let record = self
            .exec
            .receive(&transitions::COMPLETE, &msg.pids, None, |_| Ok(()))
            .await?;
        Ok(record.snapshot())
    }

    pub async fn handle_termination(
        &self,
        msg: TransferTerminationMessage,
    ) -> Result<TransferSnapshot, ProtocolError> {
        expect_type(&msg.kind, TRANSFER_TERMINATION)?;
        let status = msg.status;
        let record = self
            .exec
            .receive(&transitions::TERMINATE, &msg.pids, None, |record| {
                record.reason = Some(status);
                Ok(())
            })
            .await?;
        Ok(record.snapshot())
    }
}

/// `transfers/{counterpart pid}/{action}`
fn action_path(side: Side, record: &TransferRecord, action: &str) -> String {
    format!("transfers/{}/{}", side.counterpart(&record.pids), action)
}
