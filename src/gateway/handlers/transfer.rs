//! Transfer Process protocol endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::{check_fresh, path_pids, respond};
use crate::gateway::types::{ProtocolResult, check_path_pid, message};
use crate::node::Node;
use crate::process::{Provider, Role};
use crate::transfer::TransferSnapshot;
use crate::transfer::messages::{
    TRANSFER_ERROR, TransferCompletionMessage, TransferRequestMessage, TransferStartMessage,
    TransferSuspensionMessage, TransferTerminationMessage,
};

/// GET /transfers/{pid}
pub async fn get_transfer<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
) -> ProtocolResult<TransferSnapshot> {
    let result = node.transfers.snapshot(&pid).await;
    respond(TRANSFER_ERROR, path_pids(R::SIDE, &pid), result)
}

/// POST /transfers/request (provider)
pub async fn request(
    State(node): State<Node<Provider>>,
    payload: Result<Json<TransferRequestMessage>, JsonRejection>,
) -> ProtocolResult<TransferSnapshot> {
    let msg = message(TRANSFER_ERROR, payload)?;
    check_fresh(TRANSFER_ERROR, Provider::SIDE, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(TRANSFER_ERROR, pids, node.transfers.handle_request(msg).await)
}

/// POST /transfers/{pid}/start
pub async fn start<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<TransferStartMessage>, JsonRejection>,
) -> ProtocolResult<TransferSnapshot> {
    let msg = message(TRANSFER_ERROR, payload)?;
    check_path_pid(TRANSFER_ERROR, R::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(TRANSFER_ERROR, pids, node.transfers.handle_start(msg).await)
}

/// POST /transfers/{pid}/suspension
pub async fn suspension<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<TransferSuspensionMessage>, JsonRejection>,
) -> ProtocolResult<TransferSnapshot> {
    let msg = message(TRANSFER_ERROR, payload)?;
    check_path_pid(TRANSFER_ERROR, R::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(TRANSFER_ERROR, pids, node.transfers.handle_suspension(msg).await)
}

/// POST /transfers/{pid}/completion
pub async fn completion<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<TransferCompletionMessage>, JsonRejection>,
) -> ProtocolResult<TransferSnapshot> {
    let msg = message(TRANSFER_ERROR, payload)?;
    check_path_pid(TRANSFER_ERROR, R::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(TRANSFER_ERROR, pids, node.transfers.handle_completion(msg).await)
}

/// POST /transfers/{pid}/termination
pub async fn termination<R: Role>(
    State(node): State<Node<R>>,
    Path(pid): Path<String>,
    payload: Result<Json<TransferTerminationMessage>, JsonRejection>,
) -> ProtocolResult<TransferSnapshot> {
    let msg = message(TRANSFER_ERROR, payload)?;
    check_path_pid(TRANSFER_ERROR, R::SIDE, &pid, &msg.pids)?;
    let pids = msg.pids.clone();
    respond(TRANSFER_ERROR, pids, node.transfers.handle_termination(msg).await)
}
