//! Dataspace connector node
//!
//! Runs one participant in one role (provider or consumer):
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌────────────────────┐    ┌─────────────┐
//! │  Config  │───▶│     Node     │───▶│      Gateway       │◀──▶│ Counterpart │
//! │  (YAML)  │    │ engines +    │    │ protocol + /api/v1 │    │    node     │
//! └──────────┘    │ stores       │    └────────────────────┘    └─────────────┘
//!                 └──────────────┘
//! ```
//!
//! Usage: `dataspace_connector --env provider [--port 8080]`

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use dataspace_connector::config::AppConfig;
use dataspace_connector::gateway;
use dataspace_connector::ids::UlidGenerator;
use dataspace_connector::logging::init_logging;
use dataspace_connector::node::Node;
use dataspace_connector::process::{Participant, Role, Side};
use dataspace_connector::transport::HttpTransport;

/// Value following the first of `flags` on the command line
fn arg_value(flags: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|pair| flags.contains(&pair[0].as_str()))
        .map(|pair| pair[1].clone())
}

fn get_env() -> String {
    arg_value(&["--env", "-e"]).unwrap_or_else(|| "provider".to_string())
}

fn get_port_override() -> Option<u16> {
    arg_value(&["--port"]).and_then(|port| port.parse().ok())
}

async fn build_node<R: Role>(config: &AppConfig) -> anyhow::Result<Node<R>> {
    let participant = Participant::new(
        config.node.participant_id.clone(),
        config.node.callback_address(),
    );
    let transport = HttpTransport::new(config.node.request_timeout())
        .context("Failed to build HTTP transport")?;
    let node = Node::<R>::new(participant, Arc::new(transport), Arc::new(UlidGenerator));

    for offer in &config.offers {
        if !node.publish_offer(offer.clone()).await? {
            warn!(offer_id = %offer.id, "Duplicate offer in config, keeping the first");
        }
    }
    Ok(node)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.node.port = port;
    }

    let _guard = init_logging(&config);
    info!(
        env = %env,
        role = %config.node.role,
        participant_id = %config.node.participant_id,
        "Starting dataspace connector"
    );

    let app = match config.node.role {
        Side::Provider => gateway::provider_router(build_node(&config).await?),
        Side::Consumer => gateway::consumer_router(build_node(&config).await?),
    };

    let addr = config.node.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port may already be in use)", addr))?;

    gateway::serve(listener, app).await?;
    Ok(())
}
