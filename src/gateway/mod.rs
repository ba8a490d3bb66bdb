//! HTTP Gateway
//!
//! Hosts a [`Node`] behind axum: the protocol endpoints a counterpart calls,
//! and the `/api/v1` management API the local operator calls. The gateway
//! only decodes, checks path/body pid agreement and maps errors; every
//! protocol rule lives in the engines.

pub mod handlers;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::node::Node;
use crate::process::{Consumer, Provider, Role};
use handlers::{health, management, negotiation, transfer};

/// Routes served by both roles
fn shared_routes<R: Role>() -> Router<Node<R>> {
    Router::new()
        .route("/health", get(health::health_check::<R>))
        // Protocol
        .route("/negotiations/{pid}", get(negotiation::get_negotiation::<R>))
        .route(
            "/negotiations/{pid}/termination",
            post(negotiation::termination::<R>),
        )
        .route("/transfers/{pid}", get(transfer::get_transfer::<R>))
        .route("/transfers/{pid}/start", post(transfer::start::<R>))
        .route("/transfers/{pid}/suspension", post(transfer::suspension::<R>))
        .route("/transfers/{pid}/completion", post(transfer::completion::<R>))
        .route(
            "/transfers/{pid}/termination",
            post(transfer::termination::<R>),
        )
        // Management
        .route(
            "/api/v1/negotiations/{pid}",
            get(management::get_negotiation::<R>),
        )
        .route(
            "/api/v1/negotiations/{pid}/terminate",
            post(management::terminate_negotiation::<R>),
        )
        .route("/api/v1/agreements/{id}", get(management::get_agreement::<R>))
        .route("/api/v1/transfers/{pid}", get(management::get_transfer::<R>))
        .route(
            "/api/v1/transfers/{pid}/start",
            post(management::start_transfer::<R>),
        )
        .route(
            "/api/v1/transfers/{pid}/suspend",
            post(management::suspend_transfer::<R>),
        )
        .route(
            "/api/v1/transfers/{pid}/complete",
            post(management::complete_transfer::<R>),
        )
        .route(
            "/api/v1/transfers/{pid}/terminate",
            post(management::terminate_transfer::<R>),
        )
}

pub fn provider_router(node: Node<Provider>) -> Router {
    shared_routes::<Provider>()
        .route("/negotiations/request", post(negotiation::initial_request))
        .route("/negotiations/{pid}/request", post(negotiation::counter_request))
        .route("/negotiations/{pid}/events", post(negotiation::provider_event))
        .route(
            "/negotiations/{pid}/agreement/verification",
            post(negotiation::verification),
        )
        .route("/transfers/request", post(transfer::request))
        .route("/api/v1/negotiations/offer", post(management::offer))
        .route("/api/v1/negotiations/{pid}/agree", post(management::agree))
        .route("/api/v1/negotiations/{pid}/finalize", post(management::finalize))
        .with_state(node)
}

pub fn consumer_router(node: Node<Consumer>) -> Router {
    shared_routes::<Consumer>()
        .route("/negotiations/offers", post(negotiation::initial_offer))
        .route("/negotiations/{pid}/offers", post(negotiation::counter_offer))
        .route("/negotiations/{pid}/agreement", post(negotiation::agreement))
        .route("/negotiations/{pid}/events", post(negotiation::consumer_event))
        .route("/api/v1/negotiations/request", post(management::request))
        .route("/api/v1/negotiations/{pid}/accept", post(management::accept))
        .route("/api/v1/negotiations/{pid}/verify", post(management::verify))
        .route("/api/v1/transfers/request", post(management::request_transfer))
        .with_state(node)
}

/// Serve `app` on an already bound listener until the process exits
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Gateway listening");
    }
    axum::serve(listener, app).await
}
