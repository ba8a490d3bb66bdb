//! Provider-side transfer request handling

use super::engine::TransferEngine;
use super::messages::{TRANSFER_REQUEST, TransferRequestMessage, TransferSnapshot};
use super::state::transitions;
use super::types::{TransferRecord, require_sink};
use crate::error::ProtocolError;
use crate::process::{Process, Provider, expect_type};

impl TransferEngine<Provider> {
    /// Inbound TransferRequestMessage: new process in REQUESTED
    ///
    /// The referenced agreement must have been concluded with this provider.
    pub async fn handle_request(
        &self,
        msg: TransferRequestMessage,
    ) -> Result<TransferSnapshot, ProtocolError> {
        expect_type(&msg.kind, TRANSFER_REQUEST)?;
        if self.policies.agreement(&msg.agreement_id).await?.is_none() {
            return Err(ProtocolError::not_found("agreement", msg.agreement_id));
        }
        require_sink(msg.format, msg.data_address.as_ref())?;

        let mut proto = TransferRecord::new(
            msg.pids,
            msg.agreement_id,
            msg.format,
            msg.callback_address.unwrap_or_default(),
        );
        proto.data_address = msg.data_address;
        let record = self
            .exec
            .receive_new(&transitions::REQUEST, proto, |_| Ok(()))
            .await?;
        Ok(record.snapshot())
    }
}
