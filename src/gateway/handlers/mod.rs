//! HTTP handlers
//!
//! - `negotiation` / `transfer`: inbound protocol endpoints
//! - `management`: local controller API under `/api/v1`
//! - `health`: liveness

pub mod health;
pub mod management;
pub mod negotiation;
pub mod transfer;

use axum::Json;

use super::types::{ProtocolRejection, ProtocolResult};
use crate::error::ProtocolError;
use crate::process::{Pids, Side};

/// Map an engine result to an acknowledgment or a protocol error body
fn respond<T>(
    error_type: &'static str,
    pids: Pids,
    result: Result<T, ProtocolError>,
) -> ProtocolResult<T> {
    result
        .map(Json)
        .map_err(|e| ProtocolRejection::new(error_type, pids, e))
}

/// Pids known from the path alone, for error bodies of GET requests
fn path_pids(side: Side, pid: &str) -> Pids {
    let mut pids = Pids::default();
    side.set_local(&mut pids, pid.to_string());
    pids
}

/// First-contact endpoints must not name a local pid yet
fn check_fresh(error_type: &'static str, side: Side, pids: &Pids) -> Result<(), ProtocolRejection> {
    if !side.local(pids).is_empty() {
        return Err(ProtocolRejection::new(
            error_type,
            pids.clone(),
            ProtocolError::InvalidRequest(format!(
                "{} must be empty on first contact",
                side.local_field()
            )),
        ));
    }
    Ok(())
}
