//! Consumer-side transfer request

use serde::Deserialize;

use super::engine::TransferEngine;
use super::messages::TransferRequestMessage;
use super::state::transitions;
use super::types::{DataAddress, TransferFormat, TransferRecord, require_sink};
use crate::error::ProtocolError;
use crate::process::{Consumer, Outgoing, Pids};

/// Parameters of RequestTransfer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub agreement_id: String,
    pub format: TransferFormat,
    /// Sink for PUSH transfers
    #[serde(default)]
    pub data_address: Option<DataAddress>,
    /// Provider's protocol address
    pub callback_address: String,
}

impl TransferEngine<Consumer> {
    /// RequestTransfer: no record → REQUESTED
    pub async fn request(&self, params: TransferParams) -> Result<TransferRecord, ProtocolError> {
        require_sink(params.format, params.data_address.as_ref())?;

        let own_address = Some(self.local.callback_address.clone());
        let mut proto = TransferRecord::new(
            Pids::default(),
            params.agreement_id,
            params.format,
            params.callback_address,
        );
        proto.data_address = params.data_address;

        self.exec
            .send_new(&transitions::REQUEST, proto, |record| {
                let msg = TransferRequestMessage::new(
                    record.pids.clone(),
                    record.agreement_id.clone(),
                    record.format,
                    record.data_address.clone(),
                    own_address,
                );
                Outgoing::new("transfers/request", &msg)
            })
            .await
    }
}
