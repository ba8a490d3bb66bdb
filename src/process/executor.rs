//! Process Executor
//!
//! The single implementation of the send/validate/persist sequence used by
//! both engines and both roles. Role specifics come in through the [`Side`]
//! (which pid is ours) and the per-operation closures (how to prepare the
//! record and build the message).
//!
//! # Safety Invariants
//!
//! 1. **Validate-Before-Persist**: outbound transitions are stored only after
//!    the counterpart's acknowledgment has been checked
//! 2. **All-Or-Nothing**: any failure leaves the stored record untouched; all
//!    edits happen on a working copy
//! 3. **Serialized Per Pid**: every operation runs under the pid's lock,
//!    including the outbound round trip
//! 4. **Stable Pids**: a pid, once stored, is never rewritten

use std::future::{self, Future};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::lock::PidLocks;
use super::store::RecordStore;
use super::{Pids, Process, Side, Snapshot, Transition};
use crate::error::ProtocolError;
use crate::ids::IdGenerator;
use crate::transport::{Transport, endpoint_url};

/// A built outbound message, addressed relative to the counterpart's callback address
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub path: String,
    pub body: serde_json::Value,
}

impl Outgoing {
    pub fn new<M: Serialize>(path: impl Into<String>, message: &M) -> Result<Self, ProtocolError> {
        let body = serde_json::to_value(message)
            .map_err(|e| ProtocolError::Internal(format!("Failed to encode message: {}", e)))?;
        Ok(Self {
            path: path.into(),
            body,
        })
    }
}

pub struct Executor<P: Process> {
    side: Side,
    store: Arc<dyn RecordStore<P>>,
    locks: PidLocks,
    transport: Arc<dyn Transport>,
    ids: Arc<dyn IdGenerator>,
}

impl<P: Process> Executor<P> {
    pub fn new(
        side: Side,
        store: Arc<dyn RecordStore<P>>,
        transport: Arc<dyn Transport>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            side,
            store,
            locks: PidLocks::new(),
            transport,
            ids,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn mint_id(&self) -> String {
        self.ids.next_id()
    }

    /// Load a record by local pid, `InvalidKey` if absent
    pub async fn get(&self, pid: &str) -> Result<P, ProtocolError> {
        self.store
            .get(pid)
            .await?
            .ok_or_else(|| ProtocolError::not_found(P::KIND, pid))
    }

    // ========================================================================
    // Outbound (controller)
    // ========================================================================

    /// Originate a new exchange.
    ///
    /// `record` carries the counterpart's callback address; its local pid is
    /// minted here and its counterpart pid is adopted from the acknowledgment.
    pub async fn send_new<F>(
        &self,
        transition: &Transition<P::State>,
        mut record: P,
        build: F,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<Outgoing, ProtocolError> + Send,
    {
        let address = resolve_address(&record)?;
        let pid = self.ids.next_id();
        self.side.set_local(record.pids_mut(), pid.clone());

        let _guard = self.locks.acquire(&pid).await;
        let outgoing = build(&mut record)?;
        self.deliver(transition, record, &address, outgoing, no_hook)
            .await
    }

    /// Advance an existing exchange identified by our local pid.
    ///
    /// A `callback_override` replaces the stored counterpart address and is
    /// persisted together with the transition.
    pub async fn send<F>(
        &self,
        transition: &Transition<P::State>,
        pid: &str,
        callback_override: Option<String>,
        build: F,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<Outgoing, ProtocolError> + Send,
    {
        self.send_guarded(transition, pid, callback_override, build, no_hook)
            .await
    }

    /// [`send`](Self::send) with a hook run after the acknowledgment is
    /// validated and before the record is written, still under the pid lock.
    ///
    /// A hook failure aborts the transition like a rejected acknowledgment.
    pub async fn send_guarded<F, H, Fut>(
        &self,
        transition: &Transition<P::State>,
        pid: &str,
        callback_override: Option<String>,
        build: F,
        before_commit: H,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<Outgoing, ProtocolError> + Send,
        H: FnOnce(&P) -> Fut + Send,
        Fut: Future<Output = Result<(), ProtocolError>> + Send,
    {
        let _guard = self.locks.acquire(pid).await;
        let mut working = self.get(pid).await?;
        self.check_state(transition, pid, &working)?;

        if let Some(address) = callback_override.filter(|a| !a.is_empty()) {
            working.set_callback_address(address);
        }
        let address = resolve_address(&working)?;
        let outgoing = build(&mut working)?;
        self.deliver(transition, working, &address, outgoing, before_commit)
            .await
    }

    async fn deliver<H, Fut>(
        &self,
        transition: &Transition<P::State>,
        mut working: P,
        address: &str,
        outgoing: Outgoing,
        before_commit: H,
    ) -> Result<P, ProtocolError>
    where
        H: FnOnce(&P) -> Fut + Send,
        Fut: Future<Output = Result<(), ProtocolError>> + Send,
    {
        let url = endpoint_url(address, &outgoing.path);
        debug!(
            operation = transition.operation,
            side = %self.side,
            url = %url,
            "Sending"
        );

        let reply = self
            .transport
            .send(&url, outgoing.body)
            .await
            .inspect_err(|e| {
                warn!(
                    operation = transition.operation,
                    side = %self.side,
                    error = %e,
                    "Send failed, local state not advanced"
                );
            })?;

        self.validate_ack(transition, &mut working, reply)
            .inspect_err(|e| {
                warn!(
                    operation = transition.operation,
                    side = %self.side,
                    error = %e,
                    "Rejected acknowledgment, local state not advanced"
                );
            })?;

        working.set_state(transition.to);
        self.finish(transition, working, before_commit).await
    }

    /// Check the counterpart's acknowledgment against what was sent.
    ///
    /// A counterpart pid not known yet is adopted from the acknowledgment.
    fn validate_ack(
        &self,
        transition: &Transition<P::State>,
        working: &mut P,
        reply: serde_json::Value,
    ) -> Result<(), ProtocolError> {
        let ack: Snapshot<P::State> = serde_json::from_value(reply).map_err(|e| {
            ProtocolError::InvalidAcknowledgment(format!("malformed {}: {}", P::ACK_TYPE, e))
        })?;

        if ack.kind != P::ACK_TYPE {
            return Err(ProtocolError::InvalidAcknowledgment(format!(
                "expected @type {}, got {}",
                P::ACK_TYPE,
                ack.kind
            )));
        }

        let local = self.side.local(working.pids());
        let acked_local = self.side.local(&ack.pids);
        if acked_local != local {
            return Err(ProtocolError::InvalidAcknowledgment(format!(
                "{} expected {}, got {}",
                self.side.local_field(),
                local,
                acked_local
            )));
        }

        let counterpart = self.side.counterpart(working.pids());
        let acked_counterpart = self.side.counterpart(&ack.pids);
        if counterpart.is_empty() {
            if acked_counterpart.is_empty() {
                return Err(ProtocolError::InvalidAcknowledgment(format!(
                    "counterpart did not assign {}",
                    self.side.counterpart_field()
                )));
            }
            let adopted = acked_counterpart.to_string();
            self.side.set_counterpart(working.pids_mut(), adopted);
        } else if acked_counterpart != counterpart {
            return Err(ProtocolError::InvalidAcknowledgment(format!(
                "{} expected {}, got {}",
                self.side.counterpart_field(),
                counterpart,
                acked_counterpart
            )));
        }

        if ack.state != transition.to {
            return Err(ProtocolError::InvalidAcknowledgment(format!(
                "state expected {}, got {}",
                transition.to, ack.state
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Inbound (handler)
    // ========================================================================

    /// First contact: create the record and mint our own pid.
    pub async fn receive_new<F>(
        &self,
        transition: &Transition<P::State>,
        mut record: P,
        apply: F,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<(), ProtocolError> + Send,
    {
        if self.side.counterpart(record.pids()).is_empty() {
            return Err(ProtocolError::MissingAttribute(
                self.side.counterpart_field(),
            ));
        }
        resolve_address(&record)?;

        let pid = self.ids.next_id();
        self.side.set_local(record.pids_mut(), pid.clone());

        let _guard = self.locks.acquire(&pid).await;
        apply(&mut record)?;
        record.set_state(transition.to);
        self.commit(transition, record).await
    }

    /// Continuation: the message must name our pid and the stored counterpart pid.
    pub async fn receive<F>(
        &self,
        transition: &Transition<P::State>,
        pids: &Pids,
        callback_address: Option<String>,
        apply: F,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<(), ProtocolError> + Send,
    {
        self.receive_guarded(transition, pids, callback_address, apply, no_hook)
            .await
    }

    /// [`receive`](Self::receive) with a hook run before the record is
    /// written, under the pid lock
    pub async fn receive_guarded<F, H, Fut>(
        &self,
        transition: &Transition<P::State>,
        pids: &Pids,
        callback_address: Option<String>,
        apply: F,
        before_commit: H,
    ) -> Result<P, ProtocolError>
    where
        F: FnOnce(&mut P) -> Result<(), ProtocolError> + Send,
        H: FnOnce(&P) -> Fut + Send,
        Fut: Future<Output = Result<(), ProtocolError>> + Send,
    {
        let pid = self.side.local(pids);
        if pid.is_empty() {
            return Err(ProtocolError::MissingAttribute(self.side.local_field()));
        }

        let _guard = self.locks.acquire(pid).await;
        let mut working = self.get(pid).await?;

        let expected = self.side.counterpart(working.pids());
        let received = self.side.counterpart(pids);
        if expected != received {
            return Err(ProtocolError::mismatch(
                self.side.counterpart_field(),
                expected,
                received,
            ));
        }
        self.check_state(transition, pid, &working)?;

        if let Some(address) = callback_address.filter(|a| !a.is_empty()) {
            working.set_callback_address(address);
        }
        apply(&mut working)?;
        working.set_state(transition.to);
        self.finish(transition, working, before_commit).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check_state(
        &self,
        transition: &Transition<P::State>,
        pid: &str,
        record: &P,
    ) -> Result<(), ProtocolError> {
        let state = record.state();
        if transition.allows(state) {
            return Ok(());
        }
        debug!(
            operation = transition.operation,
            pid = %pid,
            state = %state,
            "Illegal transition"
        );
        Err(ProtocolError::StateConflict {
            operation: transition.operation,
            pid: pid.to_string(),
            expected: transition.expected(),
            actual: state.to_string(),
        })
    }

    async fn finish<H, Fut>(
        &self,
        transition: &Transition<P::State>,
        record: P,
        before_commit: H,
    ) -> Result<P, ProtocolError>
    where
        H: FnOnce(&P) -> Fut + Send,
        Fut: Future<Output = Result<(), ProtocolError>> + Send,
    {
        before_commit(&record).await.inspect_err(|e| {
            warn!(
                operation = transition.operation,
                side = %self.side,
                error = %e,
                "Pre-commit step failed, local state not advanced"
            );
        })?;
        self.commit(transition, record).await
    }

    async fn commit(
        &self,
        transition: &Transition<P::State>,
        record: P,
    ) -> Result<P, ProtocolError> {
        let pid = self.side.local(record.pids()).to_string();
        self.store.put(&pid, record.clone()).await?;
        info!(
            operation = transition.operation,
            side = %self.side,
            provider_pid = %record.pids().provider_pid,
            consumer_pid = %record.pids().consumer_pid,
            state = %record.state(),
            "Transition committed"
        );
        Ok(record)
    }
}

fn no_hook<P>(_: &P) -> future::Ready<Result<(), ProtocolError>> {
    future::ready(Ok(()))
}

fn resolve_address<P: Process>(record: &P) -> Result<String, ProtocolError> {
    record
        .callback_address()
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or(ProtocolError::MissingAttribute("callbackAddress"))
}
