//! Contract Negotiation protocol endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::{check_fresh, path_pids, respond};
use crate::gateway::types::{ProtocolResult, check_path_pid, message};
use crate::negotiation::NegotiationSnapshot;
use crate::negotiation::messages::{
    ContractAgreementMessage, ContractAgreementVerificationMessage,
    ContractNegotiationEventMessage, ContractNegotiationTerminationMessage, ContractOfferMessage,
    ContractRequestMessage, NEGOTIATION_ERROR,
};
use crate::node::Node;
use crate::process::{Consumer, Provider, Role};

/// GET /negotiations/{pid}
pub async fn get_negotiation<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
) -> ProtocolResult<NegotiationSnapshot> {
    let result = node.negotiations.snapshot(&pid).await;
    respond(NEGOTIATION_ERROR, path_pids(R::SIDE, &pid), result)
}

/// POST /negotiations/{pid}/termination
pub async fn termination<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractNegotiationTerminationMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, R::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_termination(msg).await)
}

// ============================================================================
// Provider
// ============================================================================

/// POST /negotiations/request
pub async fn initial_request(
    State(node): State<Node<Provider>>,
    payload: Result<Json<ContractRequestMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_fresh(NEGOTIATION_ERROR, Provider::SIDE, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_request(msg).await)
}

/// POST /negotiations/{pid}/request
pub async fn counter_request(
    State(node): State<Node<Provider>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractRequestMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Provider::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_request(msg).await)
}

/// POST /negotiations/{pid}/events (ACCEPTED)
pub async fn provider_event(
    State(node): State<Node<Provider>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractNegotiationEventMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Provider::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_event(msg).await)
}

/// POST /negotiations/{pid}/agreement/verification
pub async fn verification(
    State(node): State<Node<Provider>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractAgreementVerificationMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Provider::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_verification(msg).await)
}

// ============================================================================
// Consumer
// ============================================================================

/// POST /negotiations/offers
pub async fn initial_offer(
    State(node): State<Node<Consumer>>,
    payload: Result<Json<ContractOfferMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_fresh(NEGOTIATION_ERROR, Consumer::SIDE, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_offer(msg).await)
}

/// POST /negotiations/{pid}/offers
pub async fn counter_offer(
    State(node): State<Node<Consumer>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractOfferMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Consumer::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_offer(msg).await)
}

/// POST /negotiations/{pid}/agreement
pub async fn agreement(
    State(node): State<Node<Consumer>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractAgreementMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Consumer::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_agreement(msg).await)
}

/// POST /negotiations/{pid}/events (FINALIZED)
pub async fn consumer_event(
    State(node): State<Node<Consumer>>,
    Path(pid): Path<String>,
    payload: Result<Json<ContractNegotiationEventMessage>, JsonRejection>,
) -> ProtocolResult<NegotiationSnapshot> {
    let msg = message(NEGOTIATION_ERROR, payload)?;
    check_path_pid(NEGOTIATION_ERROR, Consumer::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(NEGOTIATION_ERROR, pids, node.negotiations.handle_event(msg).await)
}
