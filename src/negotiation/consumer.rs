//! Consumer-side negotiation operations
//!
//! Outbound: RequestContract, AcceptOffer, VerifyAgreement.
//! Inbound: ContractOfferMessage, ContractAgreementMessage, FINALIZED event.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use super::engine::NegotiationEngine;
use super::messages::{
    CONTRACT_AGREEMENT, CONTRACT_OFFER, ContractAgreementMessage,
    ContractAgreementVerificationMessage, ContractNegotiationEventMessage, ContractOfferMessage,
    ContractRequestMessage, NEGOTIATION_EVENT, NegotiationEvent, NegotiationSnapshot,
};
use super::state::{NegotiationState, transitions};
use super::types::NegotiationRecord;
use crate::error::ProtocolError;
use crate::process::{Consumer, Outgoing, Pids, Process, StoreError, expect_type};

/// Parameters of RequestContract
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub offer_id: String,
    /// Continue the negotiation with this pid; `None` starts a new one
    #[serde(default)]
    pub consumer_pid: Option<String>,
    /// Must match the stored provider pid when continuing
    #[serde(default)]
    pub provider_pid: Option<String>,
    /// Provider's protocol address; required when starting a negotiation
    #[serde(default)]
    pub callback_address: Option<String>,
    /// Constraint values bound into the requested offer, by `leftOperand`
    #[serde(default)]
    pub constraints: HashMap<String, String>,
}

impl NegotiationEngine<Consumer> {
    /// RequestContract: no record → REQUESTED, or OFFERED → REQUESTED
    pub async fn request(&self, params: RequestParams) -> Result<NegotiationRecord, ProtocolError> {
        let stored = self
            .policies
            .offer(&params.offer_id)
            .await?
            .ok_or_else(|| ProtocolError::not_found("offer", &params.offer_id))?;
        let mut offer = stored.bind(&params.constraints)?;
        offer.assignee = self.local.participant_id.clone();
        let own_address = Some(self.local.callback_address.clone());

        match params.consumer_pid.filter(|c| !c.is_empty()) {
            None => {
                let address = params
                    .callback_address
                    .ok_or(ProtocolError::MissingAttribute("callbackAddress"))?;
                let record =
                    NegotiationRecord::new(Pids::default(), NegotiationState::Requested, address);
                self.exec
                    .send_new(&transitions::REQUEST_NEW, record, |record| {
                        record.bind_offer(offer.clone());
                        let msg =
                            ContractRequestMessage::new(record.pids.clone(), offer, own_address);
                        Outgoing::new("negotiations/request", &msg)
                    })
                    .await
            }
            Some(pid) => {
                let expected_provider = params.provider_pid.filter(|p| !p.is_empty());
                self.exec
                    .send(
                        &transitions::REQUEST,
                        &pid,
                        params.callback_address,
                        |record| {
                            if let Some(provider_pid) = expected_provider {
                                if provider_pid != record.pids.provider_pid {
                                    return Err(ProtocolError::mismatch(
                                        "providerPid",
                                        record.pids.provider_pid.clone(),
                                        provider_pid,
                                    ));
                                }
                            }
                            record.bind_offer(offer.clone());
                            let path = format!("negotiations/{}/request", record.pids.provider_pid);
                            let msg = ContractRequestMessage::new(
                                record.pids.clone(),
                                offer,
                                own_address,
                            );
                            Outgoing::new(path, &msg)
                        },
                    )
                    .await
            }
        }
    }

    /// AcceptOffer: OFFERED → ACCEPTED
    pub async fn accept(&self, pid: &str) -> Result<NegotiationRecord, ProtocolError> {
        self.exec
            .send(&transitions::ACCEPT, pid, None, |record| {
                let path = format!("negotiations/{}/events", record.pids.provider_pid);
                let msg = ContractNegotiationEventMessage::new(
                    record.pids.clone(),
                    NegotiationEvent::Accepted,
                );
                Outgoing::new(path, &msg)
            })
            .await
    }

    /// VerifyAgreement: AGREED → VERIFIED
    pub async fn verify(&self, pid: &str) -> Result<NegotiationRecord, ProtocolError> {
        self.exec
            .send(&transitions::VERIFY, pid, None, |record| {
                let path = format!(
                    "negotiations/{}/agreement/verification",
                    record.pids.provider_pid
                );
                let msg = ContractAgreementVerificationMessage::new(record.pids.clone());
                Outgoing::new(path, &msg)
            })
            .await
    }

    /// Inbound ContractOfferMessage: new negotiation, or REQUESTED → OFFERED
    ///
    /// A counter-offer must keep the negotiation's assigner. Received offers
    /// are remembered so a later RequestContract can reference them by id.
    pub async fn handle_offer(
        &self,
        msg: ContractOfferMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, CONTRACT_OFFER)?;
        if msg.offer.assigner.is_empty() {
            return Err(ProtocolError::MissingAttribute("assigner"));
        }

        let offer = msg.offer.clone();
        let participant_id = self.local.participant_id.clone();
        let record = if msg.pids.consumer_pid.is_empty() {
            let proto = NegotiationRecord::new(
                msg.pids,
                NegotiationState::Offered,
                msg.callback_address.unwrap_or_default(),
            );
            self.exec
                .receive_new(&transitions::OFFER_NEW, proto, |record| {
                    record.assignee = participant_id;
                    record.bind_offer(offer);
                    Ok(())
                })
                .await?
        } else {
            self.exec
                .receive(
                    &transitions::OFFER,
                    &msg.pids,
                    msg.callback_address,
                    |record| {
                        if offer.assigner != record.assigner {
                            return Err(ProtocolError::mismatch(
                                "assigner",
                                record.assigner.clone(),
                                offer.assigner,
                            ));
                        }
                        record.bind_offer(offer);
                        Ok(())
                    },
                )
                .await?
        };

        if !self.policies.insert_offer(msg.offer).await? {
            debug!(consumer_pid = %record.pids.consumer_pid, "Offer already known");
        }
        Ok(record.snapshot())
    }

    /// Inbound ContractAgreementMessage: REQUESTED | ACCEPTED → AGREED
    ///
    /// The agreement is stored under the pid lock before the record commits;
    /// an id that is already taken rejects the message.
    pub async fn handle_agreement(
        &self,
        msg: ContractAgreementMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, CONTRACT_AGREEMENT)?;

        let agreement = msg.agreement;
        let id = agreement.id.clone();
        let assigner = agreement.assigner.clone();
        let agreement_id = id.clone();
        let policies = self.policies.clone();
        let record = self
            .exec
            .receive_guarded(
                &transitions::AGREE,
                &msg.pids,
                msg.callback_address,
                |record| {
                    if assigner != record.assigner {
                        return Err(ProtocolError::mismatch(
                            "assigner",
                            record.assigner.clone(),
                            assigner,
                        ));
                    }
                    record.agreement_id = Some(agreement_id);
                    Ok(())
                },
                |_| async move {
                    let taken = agreement.id.clone();
                    policies
                        .insert_agreement(agreement)
                        .await
                        .map_err(|e| match e {
                            StoreError::Duplicate(_) => duplicate_agreement(&taken),
                            other => other.into(),
                        })
                },
            )
            .await?;

        info!(
            consumer_pid = %record.pids.consumer_pid,
            agreement_id = %id,
            "Agreement received"
        );
        Ok(record.snapshot())
    }

    /// Inbound FINALIZED event: VERIFIED → FINALIZED
    pub async fn handle_event(
        &self,
        msg: ContractNegotiationEventMessage,
    ) -> Result<NegotiationSnapshot, ProtocolError> {
        expect_type(&msg.kind, NEGOTIATION_EVENT)?;
        if msg.event_type != NegotiationEvent::Finalized {
            return Err(ProtocolError::InvalidRequest(format!(
                "consumer does not accept {:?} events",
                msg.event_type
            )));
        }
        let record = self
            .exec
            .receive(&transitions::FINALIZE, &msg.pids, None, |_| Ok(()))
            .await?;
        Ok(record.snapshot())
    }
}

fn duplicate_agreement(id: &str) -> ProtocolError {
    ProtocolError::StateConflict {
        operation: "AgreeContract",
        pid: id.to_string(),
        expected: "new agreement".to_string(),
        actual: "agreement exists".to_string(),
    }
}
