//! Transfer process record and data addresses

use serde::{Deserialize, Serialize};

use super::state::TransferState;
use crate::error::ProtocolError;
use crate::process::{Pids, Process, StatusReason};

/// Who moves the data: provider pushes to a consumer sink, or consumer pulls
/// from a provider source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferFormat {
    Push,
    Pull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProperty {
    pub name: String,
    pub value: String,
}

/// Data-plane endpoint plus credential properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAddress {
    pub endpoint_type: String,
    pub endpoint: String,
    #[serde(default)]
    pub endpoint_properties: Vec<EndpointProperty>,
}

impl DataAddress {
    pub fn new(endpoint_type: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint_type: endpoint_type.into(),
            endpoint: endpoint.into(),
            endpoint_properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint_properties.push(EndpointProperty {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_empty()
    }
}

/// One side's view of a transfer process, keyed by that side's pid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(flatten)]
    pub pids: Pids,
    pub state: TransferState,
    pub agreement_id: String,
    pub format: TransferFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<DataAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    /// Last suspension or termination code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,
}

impl TransferRecord {
    pub fn new(
        pids: Pids,
        agreement_id: impl Into<String>,
        format: TransferFormat,
        callback_address: impl Into<String>,
    ) -> Self {
        Self {
            pids,
            state: TransferState::Requested,
            agreement_id: agreement_id.into(),
            format,
            data_address: None,
            callback_address: Some(callback_address.into()),
            reason: None,
        }
    }

    /// Take over a newly supplied address, then require one for PULL
    pub fn prepare_start(&mut self, address: Option<DataAddress>) -> Result<(), ProtocolError> {
        if let Some(address) = address.filter(|a| !a.is_empty()) {
            self.data_address = Some(address);
        }
        let has_address = self.data_address.as_ref().is_some_and(|a| !a.is_empty());
        if self.format == TransferFormat::Pull && !has_address {
            return Err(ProtocolError::MissingAttribute("dataAddress"));
        }
        Ok(())
    }
}

/// A PUSH transfer cannot be requested without the consumer's sink
pub(crate) fn require_sink(
    format: TransferFormat,
    address: Option<&DataAddress>,
) -> Result<(), ProtocolError> {
    if format == TransferFormat::Push && !address.is_some_and(|a| !a.is_empty()) {
        return Err(ProtocolError::MissingAttribute("dataAddress"));
    }
    Ok(())
}

impl Process for TransferRecord {
    type State = TransferState;

    const ACK_TYPE: &'static str = "TransferProcess";
    const KIND: &'static str = "transfer process";

    fn pids(&self) -> &Pids {
        &self.pids
    }

    fn pids_mut(&mut self) -> &mut Pids {
        &mut self.pids
    }

    fn state(&self) -> TransferState {
        self.state
    }

    fn set_state(&mut self, state: TransferState) {
        self.state = state;
    }

    fn callback_address(&self) -> Option<&str> {
        self.callback_address.as_deref()
    }

    fn set_callback_address(&mut self, address: String) {
        self.callback_address = Some(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(format: TransferFormat) -> TransferRecord {
        TransferRecord::new(Pids::new("p-1", "c-1"), "agr-1", format, "http://consumer")
    }

    #[test]
    fn test_pull_start_needs_address() {
        let mut pull = record(TransferFormat::Pull);
        assert_eq!(
            pull.prepare_start(None),
            Err(ProtocolError::MissingAttribute("dataAddress"))
        );
        assert_eq!(
            pull.prepare_start(Some(DataAddress::new("HttpData", ""))),
            Err(ProtocolError::MissingAttribute("dataAddress"))
        );

        let source =
            DataAddress::new("HttpData", "http://provider/data").with_property("token", "t");
        pull.prepare_start(Some(source.clone())).unwrap();
        assert_eq!(pull.data_address, Some(source.clone()));

        // Resuming reuses the stored address
        pull.prepare_start(None).unwrap();
        assert_eq!(pull.data_address, Some(source));
    }

    #[test]
    fn test_push_start_without_address() {
        let mut push = record(TransferFormat::Push);
        assert!(push.prepare_start(None).is_ok());
        assert!(push.data_address.is_none());
    }

    #[test]
    fn test_push_request_needs_sink() {
        assert!(require_sink(TransferFormat::Push, None).is_err());
        assert!(require_sink(TransferFormat::Pull, None).is_ok());
        let sink = DataAddress::new("S3", "s3://bucket/key");
        assert!(require_sink(TransferFormat::Push, Some(&sink)).is_ok());
    }

    #[test]
    fn test_record_wire_shape() {
        let json = serde_json::to_value(record(TransferFormat::Pull)).unwrap();
        assert_eq!(json["providerPid"], "p-1");
        assert_eq!(json["agreementId"], "agr-1");
        assert_eq!(json["format"], "PULL");
        assert_eq!(json["state"], "REQUESTED");
        assert!(json.get("dataAddress").is_none());
    }
}
