//! Management API
//!
//! Local controller entry points: each call drives one outbound protocol
//! operation and returns the updated local record.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::gateway::types::{ApiResult, ok};
use crate::negotiation::{NegotiationRecord, OfferParams, RequestParams};
use crate::node::Node;
use crate::policy::Agreement;
use crate::process::{Consumer, Provider, Role, StatusReason};
use crate::transfer::{DataAddress, TransferParams, TransferRecord};

#[derive(Debug, Serialize)]
pub struct AgreeResponse {
    pub negotiation: NegotiationRecord,
    pub agreement: Agreement,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    #[serde(default)]
    pub data_address: Option<DataAddress>,
}

// ============================================================================
// Negotiation
// ============================================================================

/// POST /api/v1/negotiations/offer (provider)
pub async fn offer(
    State(node): State<Node<Provider>>,
    payload: Result<Json<OfferParams>, JsonRejection>,
) -> ApiResult<NegotiationRecord> {
    let Json(params) = payload?;
    ok(node.negotiations.offer(params).await?)
}

/// POST /api/v1/negotiations/{pid}/agree (provider)
pub async fn agree(
    State(node): State<Node<Provider>>,
    Path(pid): Path<String>,
) -> ApiResult<AgreeResponse> {
    let (negotiation, agreement) = node.negotiations.agree(&pid).await?;
    ok(AgreeResponse {
        negotiation,
        agreement,
    })
}

/// POST /api/v1/negotiations/{pid}/finalize (provider)
pub async fn finalize(
    State(node): State<Node<Provider>>,
    Path(pid): Path<String>,
) -> ApiResult<NegotiationRecord> {
    ok(node.negotiations.finalize(&pid).await?)
}

/// POST /api/v1/negotiations/request (consumer)
pub async fn request(
    State(node): State<Node<Consumer>>,
    payload: Result<Json<RequestParams>, JsonRejection>,
) -> ApiResult<NegotiationRecord> {
    let Json(params) = payload?;
    ok(node.negotiations.request(params).await?)
}

/// POST /api/v1/negotiations/{pid}/accept (consumer)
pub async fn accept(
    State(node): State<Node<Consumer>>,
    Path(pid): Path<String>,
) -> ApiResult<NegotiationRecord> {
    ok(node.negotiations.accept(&pid).await?)
}

/// POST /api/v1/negotiations/{pid}/verify (consumer)
pub async fn verify(
    State(node): State<Node<Consumer>>,
    Path(pid): Path<String>,
) -> ApiResult<NegotiationRecord> {
    ok(node.negotiations.verify(&pid).await?)
}

/// POST /api/v1/negotiations/{pid}/terminate
pub async fn terminate_negotiation<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<StatusReason>, JsonRejection>,
) -> ApiResult<NegotiationRecord> {
    let Json(status) = payload?;
    ok(node.negotiations.terminate(&pid, status).await?)
}

/// GET /api/v1/negotiations/{pid}
pub async fn get_negotiation<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
) -> ApiResult<NegotiationRecord> {
    ok(node.negotiations.get(&pid).await?)
}

/// GET /api/v1/agreements/{id}
pub async fn get_agreement<R: Role>(
    State(node): State<Node<R>>,
    Path(id): Path<String>,
) -> ApiResult<Agreement> {
    ok(node.negotiations.agreement(&id).await?)
}

// ============================================================================
// Transfer
// ============================================================================

/// POST /api/v1/transfers/request (consumer)
pub async fn request_transfer(
    State(node): State<Node<Consumer>>,
    payload: Result<Json<TransferParams>, JsonRejection>,
) -> ApiResult<TransferRecord> {
    let Json(params) = payload?;
    ok(node.transfers.request(params).await?)
}

/// POST /api/v1/transfers/{pid}/start
pub async fn start_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<StartParams>, JsonRejection>,
) -> ApiResult<TransferRecord> {
    let Json(params) = payload?;
    ok(node.transfers.start(&pid, params.data_address).await?)
}

/// POST /api/v1/transfers/{pid}/suspend
pub async fn suspend_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<StatusReason>, JsonRejection>,
) -> ApiResult<TransferRecord> {
    let Json(status) = payload?;
    ok(node.transfers.suspend(&pid, status).await?)
}

/// POST /api/v1/transfers/{pid}/complete
pub async fn complete_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
) -> ApiResult<TransferRecord> {
    ok(node.transfers.complete(&pid).await?)
}

/// POST /api/v1/transfers/{pid}/terminate
pub async fn terminate_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<StatusReason>, JsonRejection>,
) -> ApiResult<TransferRecord> {
    let Json(status) = payload?;
    ok(node.transfers.terminate(&pid, status).await?)
}

/// GET /api/v1/transfers/{pid}
pub async fn get_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
) -> ApiResult<TransferRecord> {
    ok(node.transfers.get(&pid).await?)
}
