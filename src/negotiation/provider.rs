//! Provider-side negotiation operations
//!
//! Outbound: OfferContract, AgreeContract, FinalizeContract.
//! Inbound: ContractRequestMessage, ACCEPTED event, agreement verification.

use std::sync::OnceLock;

use serde::Deserialize;
use tracing::info;

use super::engine::NegotiationEngine;
use super::messages::{
    AGREEMENT_VERIFICATION, CONTRACT_REQUEST, ContractAgreementMessage,
    ContractAgreementVerificationMessage, ContractNegotiationEventMessage, ContractOfferMessage,
    ContractRequestMessage, NEGOTIATION_EVENT, NegotiationEvent, NegotiationSnapshot,
};
use super::state::{NegotiationState, transitions};
use super::types::NegotiationRecord;
use crate::error::ProtocolError;
use crate::policy::{Agreement, Offer};
use crate::process::{Outgoing, Pids, Process, Provider, expect_type};

/// Parameters of OfferContract
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferParams {
    pub offer_id: String,
    /// Continue the negotiation with this pid; `None` starts a new one
    #[serde(default)]
    pub provider_pid: Option<String>,
    /// Must match the stored consumer pid when continuing
    #[serde(default)]
    pub consumer_pid: Option<String>,
    /// Consumer's protocol address; required when starting a negotiation
    #[serde(default)]
    pub callback_address: Option<String>,
    /// Consumer participant the offer is addressed to; required when starting
    /// a negotiation unless the stored offer names one
    #[serde(default)]
    pub assignee: Option<String>,
}

impl NegotiationEngine<Provider> {
    async fn stored_offer(&self, offer_id: &str) -> Result<Offer, ProtocolError> {
        self.policies
            .offer(offer_id)
            .await?
            .ok_or_else(|| ProtocolError::not_found("offer", offer_id))
    }

    /// OfferContract: no record → OFFERED, or REQUESTED → OFFERED
    ///
    /// A new negotiation must name the consumer participant, either in
    /// `assignee` or on the stored offer.
    pub async fn offer(&self, params: OfferParams) -> Result<NegotiationRecord, ProtocolError> {
        let mut offer = self.stored_offer(&params.offer_id).await?;
        if let Some(assignee) = params.assignee.filter(|a| !a.is_empty()) {
            offer.assignee = assignee;
        }
        let own_address = Some(self.local.callback_address.clone());

        match params.provider_pid.filter(|p| !p.is_empty()) {
            None => {
                let address = params
                    .callback_address
                    .ok_or(ProtocolError::MissingAttribute("callbackAddress"))?;
                // The agreement is minted for this party
                if offer.assignee.is_empty() {
                    return Err(ProtocolError::MissingAttribute("assignee"));
                }
                let record =
                    NegotiationRecord::new(Pids::default(), NegotiationState::Offered, address);
                self.exec
                    .send_new(&transitions::OFFER_NEW, record, |record| {
                        record.bind_offer(offer.clone());
                        let msg =
                            ContractOfferMessage::new(record.pids.clone(), offer, own_address);
                        Outgoing::new("negotiations/offers", &msg)
                    })
                    .await
            }
            Some(pid) => {
                let expected_consumer = params.consumer_pid.filter(|c| !c.is_empty());
                self.exec
                    .send(
                        &transitions::OFFER,
                        &pid,
                        params.callback_address,
                        |record| {
                            if let Some(consumer_pid) = expected_consumer {
                                if consumer_pid != record.pids.consumer_pid {
                                    return Err(ProtocolError::mismatch(
                                        "consumerPid",
                                        record.pids.consumer_pid.clone(),
                                        consumer_pid,
                                    ));
                                }
                            }
                            record.bind_offer(offer.clone());
                            let path = format!("negotiations/{}/offers", record.pids.consumer_pid);
                            let msg =
                                ContractOfferMessage::new(record.pids.clone(), offer, own_address);
                            Outgoing::new(path, &msg)
                        },
                    )
                    .await
            }
        }
    }

    /// AgreeContract: REQUESTED | ACCEPTED → AGREED, minting exactly one Agreement
    ///
    /// The agreement is stored under the pid lock once the consumer has
    /// acknowledged it and before the record commits, so a failed store leaves
    /// the negotiation where it was.
    pub async fn agree(&self, pid: &str) -> Result<(NegotiationRecord, Agreement), ProtocolError> {
        let agreement_id = self.exec.mint_id();
        let own_address = Some(self.local.callback_address.clone());
        let minted = OnceLock::new();
        let policies = self.policies.clone();

        let record = self
            .exec
            .send_guarded(
                &transitions::AGREE,
                pid,
                None,
                |record| {
                    let offer = record
                        .offer
                        .as_ref()
                        .ok_or(ProtocolError::MissingAttribute("offer"))?;
                    if record.assignee.is_empty() {
                        return Err(ProtocolError::MissingAttribute("assignee"));
                    }
                    let agreement =
                        Agreement::from_offer(agreement_id, offer, record.assignee.clone());
                    record.agreement_id = Some(agreement.id.clone());

                    let path = format!("negotiations/{}/agreement", record.pids.consumer_pid);
                    let msg = ContractAgreementMessage::new(
                        record.pids.clone(),
                        agreement.clone(),
                        own_address,
                    );
                    let outgoing = Outgoing::new(path, &msg)?;
                    let _ = minted.set(agreement);
                    Ok(outgoing)
                },
                |_| {
                    let agreement = minted.get().cloned();
                    async move {
                        let agreement = agreement.ok_or_else(|| {
                            ProtocolError::Internal("agreement was not minted".to_string())
                        })?;
                        policies.insert_agreement(agreement).await?;
                        Ok::<(), ProtocolError>(())
                    }
                },
            )
            .await?;

        let agreement = minted
            .into_inner()
            .ok_or_else(|| ProtocolError::Internal("agreement was not minted".to_string()))?;
        info!(
            provider_pid = %record.pids.provider_pid,
            agreement_id = %agreement.id,
            "Agreement minted"
        );
        Ok((record, agreement))
    }

    /// FinalizeContract: VERIFIED → FINALIZED
    pub async fn finalize(&self, pid: &str) -> Result<NegotiationRecord, ProtocolError> {
        self.exec
            .send(&transitions::FINALIZE, pid, None, |record| {
                let path = format!("negotiations/{}/events", record.pids.consumer_pid);
                let msg = ContractNegotiationEventMessage::new(
                    record.pids.clone(),
                    NegotiationEvent::Finalized,
                );
                Outgoing::new(path, &msg)
            })
            .await
    }

    /// Inbound ContractRequestMessage: new negotiation, or OFFERED → REQUESTED
    ///
    /// The referenced offer must exist here and name the same assigner.
    pub async fn handle_request(
        &self,
        msg: ContractRequestMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, CONTRACT_REQUEST)?;

        let stored = self.stored_offer(&msg.offer.id).await?;
        if msg.offer.assigner != stored.assigner {
            return Err(ProtocolError::mismatch(
                "assigner",
                stored.assigner,
                msg.offer.assigner,
            ));
        }

        let offer = msg.offer;
        let record = if msg.pids.provider_pid.is_empty() {
            let proto = NegotiationRecord::new(
                msg.pids,
                NegotiationState::Requested,
                msg.callback_address.unwrap_or_default(),
            );
            self.exec
                .receive_new(&transitions::REQUEST_NEW, proto, |record| {
                    record.bind_offer(offer);
                    Ok(())
                })
                .await?
        } else {
            self.exec
                .receive(
                    &transitions::REQUEST,
                    &msg.pids,
                    msg.callback_address,
                    |record| {
                        record.bind_offer(offer);
                        Ok(())
                    },
                )
                .await?
        };
        Ok(record.snapshot())
    }

    /// Inbound ACCEPTED event: OFFERED → ACCEPTED
    pub async fn handle_event(
        &self,
        msg: ContractNegotiationEventMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, NEGOTIATION_EVENT)?;
        if msg.event_type != NegotiationEvent::Accepted {
            return Err(ProtocolError::InvalidRequest(format!(
                "provider does not accept {:?} events",
                msg.event_type
            )));
        }
        let record = self
            .exec
            .receive(&transitions::ACCEPT, &msg.pids, None, |_| Ok(()))
            .await?;
        Ok(record.snapshot())
    }

    /// Inbound agreement verification: AGREED → VERIFIED
    pub async fn handle_verification(
        &self,
        msg: ContractAgreementVerificationMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, AGREEMENT_VERIFICATION)?;
        let record = self
            .exec
            .receive(&transitions::VERIFY, &msg.pids, None, |_| Ok(()))
            .await?;
        Ok(record.snapshot())
    }
}
