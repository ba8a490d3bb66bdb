//! Transfer processes over a finalized agreement

mod common;

use common::{CONSUMER_ADDR, PROVIDER_ADDR, Pair, pair};
use dataspace_connector::negotiation::OfferParams;
use dataspace_connector::transfer::{DataAddress, TransferFormat, TransferParams};
use dataspace_connector::{NegotiationState, ProtocolError, StatusReason, TransferState};

/// Run a provider-initiated negotiation to FINALIZED, returning the agreement id
async fn finalized_agreement(p: &Pair) -> String {
    let offered = p
        .provider
        .negotiations
        .offer(OfferParams {
            offer_id: "ofr-1".into(),
            callback_address: Some(CONSUMER_ADDR.into()),
            assignee: Some("cons-B".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let provider_pid = offered.pids.provider_pid.clone();
    let consumer_pid = offered.pids.consumer_pid.clone();

    p.consumer.negotiations.accept(&consumer_pid).await.unwrap();
    let (_, agreement) = p.provider.negotiations.agree(&provider_pid).await.unwrap();
    p.consumer.negotiations.verify(&consumer_pid).await.unwrap();
    let done = p.provider.negotiations.finalize(&provider_pid).await.unwrap();
    assert_eq!(done.state, NegotiationState::Finalized);
    agreement.id
}

fn sink() -> DataAddress {
    DataAddress::new("HTTP", "https://consumer.example/sink")
        .with_property("authorization", "Bearer abc")
}

fn source() -> DataAddress {
    DataAddress::new("HTTP", "https://provider.example/ds-1")
}

async fn transfer_states(
    p: &Pair,
    provider_pid: &str,
    consumer_pid: &str,
) -> (TransferState, TransferState) {
    (
        p.provider.transfers.get(provider_pid).await.unwrap().state,
        p.consumer.transfers.get(consumer_pid).await.unwrap().state,
    )
}

#[tokio::test]
async fn test_pull_transfer_started_then_terminated() {
    let p = pair().await;
    let agreement_id = finalized_agreement(&p).await;

    let requested = p
        .consumer
        .transfers
        .request(TransferParams {
            agreement_id: agreement_id.clone(),
            format: TransferFormat::Pull,
            data_address: None,
            callback_address: PROVIDER_ADDR.into(),
        })
        .await
        .unwrap();
    let pids = requested.pids.clone();
    assert!(!pids.provider_pid.is_empty());
    assert!(!pids.consumer_pid.is_empty());
    assert_eq!(
        transfer_states(&p, &pids.provider_pid, &pids.consumer_pid).await,
        (TransferState::Requested, TransferState::Requested)
    );
    let provider_view = p.provider.transfers.get(&pids.provider_pid).await.unwrap();
    assert_eq!(provider_view.agreement_id, agreement_id);
    assert_eq!(provider_view.callback_address.as_deref(), Some(CONSUMER_ADDR));

    // Provider starts a PULL with its source address; the consumer learns where to pull from
    p.provider
        .transfers
        .start(&pids.provider_pid, Some(source()))
        .await
        .unwrap();
    assert_eq!(
        transfer_states(&p, &pids.provider_pid, &pids.consumer_pid).await,
        (TransferState::Started, TransferState::Started)
    );
    let consumer_view = p.consumer.transfers.get(&pids.consumer_pid).await.unwrap();
    assert_eq!(consumer_view.data_address, Some(source()));

    p.consumer
        .transfers
        .terminate(&pids.consumer_pid, StatusReason::new("ABORTED", vec![]))
        .await
        .unwrap();
    let snap = p.provider.transfers.snapshot(&pids.provider_pid).await.unwrap();
    assert_eq!(snap.state, TransferState::Terminated);
    assert_eq!(snap.pids, pids);

    let err = p.provider.transfers.complete(&pids.provider_pid).await.unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
}

#[tokio::test]
async fn test_push_transfer_suspend_resume_complete() {
    let p = pair().await;
    let agreement_id = finalized_agreement(&p).await;

    let requested = p
        .consumer
        .transfers
        .request(TransferParams {
            agreement_id,
            format: TransferFormat::Push,
            data_address: Some(sink()),
            callback_address: PROVIDER_ADDR.into(),
        })
        .await
        .unwrap();
    let (ppid, cpid) = (
        requested.pids.provider_pid.clone(),
        requested.pids.consumer_pid.clone(),
    );
    // The provider holds the sink it will push to
    assert_eq!(
        p.provider.transfers.get(&ppid).await.unwrap().data_address,
        Some(sink())
    );

    p.provider.transfers.start(&ppid, None).await.unwrap();
    p.consumer
        .transfers
        .suspend(&cpid, StatusReason::new("PAUSED", vec!["disk full".into()]))
        .await
        .unwrap();
    assert_eq!(
        transfer_states(&p, &ppid, &cpid).await,
        (TransferState::Suspended, TransferState::Suspended)
    );
    assert_eq!(
        p.provider.transfers.get(&ppid).await.unwrap().reason.unwrap().code,
        "PAUSED"
    );

    // Completing needs STARTED
    let err = p.provider.transfers.complete(&ppid).await.unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));

    p.provider.transfers.start(&ppid, None).await.unwrap();
    p.provider.transfers.complete(&ppid).await.unwrap();
    assert_eq!(
        transfer_states(&p, &ppid, &cpid).await,
        (TransferState::Completed, TransferState::Completed)
    );

    let err = p
        .consumer
        .transfers
        .terminate(&cpid, StatusReason::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
}

#[tokio::test]
async fn test_transfer_needs_known_agreement() {
    let p = pair().await;

    let err = p
        .consumer
        .transfers
        .request(TransferParams {
            agreement_id: "agr-unknown".into(),
            format: TransferFormat::Pull,
            data_address: None,
            callback_address: PROVIDER_ADDR.into(),
        })
        .await
        .unwrap_err();
    // The provider's INVALID_KEY comes back through the transport
    assert!(matches!(err, ProtocolError::Transport(ref m) if m.contains("INVALID_KEY")));
    assert_eq!(p.to_provider.sent_urls(), vec![format!("{}/transfers/request", PROVIDER_ADDR)]);
}

#[tokio::test]
async fn test_pull_start_without_source_stays_requested() {
    let p = pair().await;
    let agreement_id = finalized_agreement(&p).await;

    let requested = p
        .consumer
        .transfers
        .request(TransferParams {
            agreement_id,
            format: TransferFormat::Pull,
            data_address: None,
            callback_address: PROVIDER_ADDR.into(),
        })
        .await
        .unwrap();
    let ppid = requested.pids.provider_pid.clone();
    let sent_before = p.to_consumer.sent_urls().len();

    let err = p.provider.transfers.start(&ppid, None).await.unwrap_err();
    assert_eq!(err, ProtocolError::MissingAttribute("dataAddress"));
    assert_eq!(p.to_consumer.sent_urls().len(), sent_before);
    assert_eq!(
        transfer_states(&p, &ppid, &requested.pids.consumer_pid).await,
        (TransferState::Requested, TransferState::Requested)
    );
}

#[tokio::test]
async fn test_transfer_transport_failure_keeps_state() {
    let p = pair().await;
    let agreement_id = finalized_agreement(&p).await;

    let requested = p
        .consumer
        .transfers
        .request(TransferParams {
            agreement_id,
            format: TransferFormat::Push,
            data_address: Some(sink()),
            callback_address: PROVIDER_ADDR.into(),
        })
        .await
        .unwrap();
    let (ppid, cpid) = (
        requested.pids.provider_pid.clone(),
        requested.pids.consumer_pid.clone(),
    );

    p.to_consumer.fail_next();
    let err = p.provider.transfers.start(&ppid, None).await.unwrap_err();
    assert!(!err.is_caller_correctable());
    assert_eq!(
        transfer_states(&p, &ppid, &cpid).await,
        (TransferState::Requested, TransferState::Requested)
    );

    p.provider.transfers.start(&ppid, None).await.unwrap();
    assert_eq!(
        transfer_states(&p, &ppid, &cpid).await,
        (TransferState::Started, TransferState::Started)
    );
}
