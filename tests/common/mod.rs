//! In-process wiring of a provider node and a consumer node
//!
//! Each node's transport hands outbound messages straight to the peer
//! engine's handler, dispatching on `@type` the way the gateway dispatches
//! on path.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use dataspace_connector::ids::SequentialIds;
use dataspace_connector::negotiation::messages as neg;
use dataspace_connector::policy::{Offer, Rule};
use dataspace_connector::process::{Consumer, Participant, Provider, Role};
use dataspace_connector::transfer::messages as tp;
use dataspace_connector::transport::Transport;
use dataspace_connector::{Node, ProtocolError};

pub const PROVIDER_ADDR: &str = "http://provider";
pub const CONSUMER_ADDR: &str = "http://consumer";

/// Delivers to the `R` node
pub struct Loopback<R: Role> {
    peer: OnceLock<Node<R>>,
    fail_next: AtomicBool,
    sent: Mutex<Vec<(String, Value)>>,
}

impl<R: Role> Loopback<R> {
    fn new() -> Self {
        Self {
            peer: OnceLock::new(),
            fail_next: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Drop the next message as if the connection failed
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    fn peer(&self) -> Result<&Node<R>, ProtocolError> {
        self.peer
            .get()
            .ok_or_else(|| ProtocolError::Transport("peer not wired".into()))
    }

    fn record(&self, url: &str, body: &Value) -> Result<String, ProtocolError> {
        self.sent.lock().unwrap().push((url.to_string(), body.clone()));
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProtocolError::Transport("connection reset".into()));
        }
        Ok(body["@type"].as_str().unwrap_or_default().to_string())
    }
}

fn decode<M: DeserializeOwned>(body: Value) -> Result<M, ProtocolError> {
    serde_json::from_value(body).map_err(|e| ProtocolError::InvalidRequest(e.to_string()))
}

fn reply<T: Serialize>(result: Result<T, ProtocolError>) -> Result<Value, ProtocolError> {
    match result {
        Ok(snapshot) => Ok(serde_json::to_value(snapshot).unwrap()),
        // What HttpTransport reports for a non-2xx protocol error body
        Err(e) => Err(ProtocolError::Transport(format!(
            "counterpart returned {}: {}",
            e.code(),
            e
        ))),
    }
}

#[async_trait]
impl Transport for Loopback<Provider> {
    async fn send(&self, url: &str, body: Value) -> Result<Value, ProtocolError> {
        let kind = self.record(url, &body)?;
        let node = self.peer()?;
        match kind.as_str() {
            neg::CONTRACT_REQUEST => reply(node.negotiations.handle_request(decode(body)?).await),
            neg::NEGOTIATION_EVENT => reply(node.negotiations.handle_event(decode(body)?).await),
            neg::AGREEMENT_VERIFICATION => {
                reply(node.negotiations.handle_verification(decode(body)?).await)
            }
            neg::NEGOTIATION_TERMINATION => {
                reply(node.negotiations.handle_termination(decode(body)?).await)
            }
            tp::TRANSFER_REQUEST => reply(node.transfers.handle_request(decode(body)?).await),
            other => transfer_action(node, other, body).await,
        }
    }
}

#[async_trait]
impl Transport for Loopback<Consumer> {
    async fn send(&self, url: &str, body: Value) -> Result<Value, ProtocolError> {
        let kind = self.record(url, &body)?;
        let node = self.peer()?;
        match kind.as_str() {
            neg::CONTRACT_OFFER => reply(node.negotiations.handle_offer(decode(body)?).await),
            neg::CONTRACT_AGREEMENT => {
                reply(node.negotiations.handle_agreement(decode(body)?).await)
            }
            neg::NEGOTIATION_EVENT => reply(node.negotiations.handle_event(decode(body)?).await),
            neg::NEGOTIATION_TERMINATION => {
                reply(node.negotiations.handle_termination(decode(body)?).await)
            }
            other => transfer_action(node, other, body).await,
        }
    }
}

async fn transfer_action<R: Role>(
    node: &Node<R>,
    kind: &str,
    body: Value,
) -> Result<Value, ProtocolError> {
    match kind {
        tp::TRANSFER_START => reply(node.transfers.handle_start(decode(body)?).await),
        tp::TRANSFER_SUSPENSION => reply(node.transfers.handle_suspension(decode(body)?).await),
        tp::TRANSFER_COMPLETION => reply(node.transfers.handle_completion(decode(body)?).await),
        tp::TRANSFER_TERMINATION => reply(node.transfers.handle_termination(decode(body)?).await),
        other => reply::<Value>(Err(ProtocolError::InvalidRequest(format!(
            "no endpoint for {}",
            other
        )))),
    }
}

pub struct Pair {
    pub provider: Node<Provider>,
    pub consumer: Node<Consumer>,
    /// Provider → consumer link
    pub to_consumer: Arc<Loopback<Consumer>>,
    /// Consumer → provider link
    pub to_provider: Arc<Loopback<Provider>>,
}

/// Catalog offer used across the flows
pub fn catalog_offer() -> Offer {
    Offer::new("ofr-1", "ds-1", "prov-A")
        .with_permission(Rule::new("use").with_constraint("purpose", "eq", ""))
}

/// Provider `prov-A` and consumer `cons-B`, both knowing `ofr-1`
pub async fn pair() -> Pair {
    let to_consumer = Arc::new(Loopback::<Consumer>::new());
    let to_provider = Arc::new(Loopback::<Provider>::new());

    let provider = Node::<Provider>::new(
        Participant::new("prov-A", PROVIDER_ADDR),
        to_consumer.clone(),
        Arc::new(SequentialIds::new("prov")),
    );
    let consumer = Node::<Consumer>::new(
        Participant::new("cons-B", CONSUMER_ADDR),
        to_provider.clone(),
        Arc::new(SequentialIds::new("cons")),
    );

    assert!(to_consumer.peer.set(consumer.clone()).is_ok());
    assert!(to_provider.peer.set(provider.clone()).is_ok());

    provider.publish_offer(catalog_offer()).await.unwrap();
    consumer.publish_offer(catalog_offer()).await.unwrap();

    Pair {
        provider,
        consumer,
        to_consumer,
        to_provider,
    }
}
