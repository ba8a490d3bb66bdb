//! Contract negotiation between an in-process provider and consumer

mod common;

use std::collections::HashMap;

use common::{CONSUMER_ADDR, PROVIDER_ADDR, catalog_offer, pair};
use dataspace_connector::negotiation::messages::{
    ContractNegotiationTerminationMessage, ContractRequestMessage,
};
use dataspace_connector::negotiation::{OfferParams, RequestParams};
use dataspace_connector::{NegotiationState, Pids, ProtocolError, StatusReason};

fn fresh_request() -> RequestParams {
    RequestParams {
        offer_id: "ofr-1".into(),
        callback_address: Some(PROVIDER_ADDR.into()),
        constraints: HashMap::from([("purpose".to_string(), "research".to_string())]),
        ..Default::default()
    }
}

fn fresh_offer() -> OfferParams {
    OfferParams {
        offer_id: "ofr-1".into(),
        callback_address: Some(CONSUMER_ADDR.into()),
        assignee: Some("cons-B".into()),
        ..Default::default()
    }
}

async fn states(
    p: &common::Pair,
    provider_pid: &str,
    consumer_pid: &str,
) -> (NegotiationState, NegotiationState) {
    (
        p.provider.negotiations.get(provider_pid).await.unwrap().state,
        p.consumer.negotiations.get(consumer_pid).await.unwrap().state,
    )
}

#[tokio::test]
async fn test_consumer_request_round_trip() {
    let p = pair().await;

    let record = p.consumer.negotiations.request(fresh_request()).await.unwrap();
    assert_eq!(record.state, NegotiationState::Requested);
    assert_eq!(record.pids, Pids::new("prov-1", "cons-1"));

    let provider_view = p.provider.negotiations.get("prov-1").await.unwrap();
    assert_eq!(provider_view.state, NegotiationState::Requested);
    assert_eq!(provider_view.pids, record.pids);
    assert_eq!(provider_view.assigner, "prov-A");
    assert_eq!(provider_view.assignee, "cons-B");
    assert_eq!(provider_view.callback_address.as_deref(), Some(CONSUMER_ADDR));
    let bound = provider_view.offer.unwrap();
    assert_eq!(bound.permission[0].constraint[0].right_operand, "research");

    assert_eq!(
        p.to_provider.sent_urls(),
        vec!["http://provider/negotiations/request".to_string()]
    );
}

#[tokio::test]
async fn test_provider_handler_mints_pid_for_fresh_request() {
    let p = pair().await;

    let msg = ContractRequestMessage::new(
        Pids::new("", "cons-77"),
        catalog_offer(),
        Some(CONSUMER_ADDR.into()),
    );
    let snap = p.provider.negotiations.handle_request(msg).await.unwrap();
    assert_eq!(snap.state, NegotiationState::Requested);
    assert_eq!(snap.pids.consumer_pid, "cons-77");
    assert!(!snap.pids.provider_pid.is_empty());
}

#[tokio::test]
async fn test_provider_initiated_negotiation_end_to_end() {
    let p = pair().await;

    let offered = p.provider.negotiations.offer(fresh_offer()).await.unwrap();
    let pids = offered.pids.clone();
    assert_eq!(pids, Pids::new("prov-1", "cons-1"));
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Offered, NegotiationState::Offered)
    );

    p.consumer.negotiations.accept("cons-1").await.unwrap();
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Accepted, NegotiationState::Accepted)
    );

    let (agreed, agreement) = p.provider.negotiations.agree("prov-1").await.unwrap();
    assert_eq!(agreed.state, NegotiationState::Agreed);
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Agreed, NegotiationState::Agreed)
    );
    // Both sides hold the same agreement
    assert_eq!(p.provider.negotiations.agreement(&agreement.id).await.unwrap(), agreement);
    assert_eq!(p.consumer.negotiations.agreement(&agreement.id).await.unwrap(), agreement);
    assert_eq!(agreement.assigner, "prov-A");
    assert_eq!(agreement.assignee, "cons-B");

    p.consumer.negotiations.verify("cons-1").await.unwrap();
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Verified, NegotiationState::Verified)
    );

    p.provider.negotiations.finalize("prov-1").await.unwrap();
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Finalized, NegotiationState::Finalized)
    );

    // Pids never moved
    assert_eq!(p.provider.negotiations.get("prov-1").await.unwrap().pids, pids);
    assert_eq!(p.consumer.negotiations.get("cons-1").await.unwrap().pids, pids);

    // Nothing leaves a terminal state
    let err = p
        .consumer
        .negotiations
        .terminate("cons-1", StatusReason::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
}

#[tokio::test]
async fn test_provider_offer_without_assignee_is_refused() {
    let p = pair().await;

    let params = OfferParams {
        offer_id: "ofr-1".into(),
        callback_address: Some(CONSUMER_ADDR.into()),
        ..Default::default()
    };
    let err = p.provider.negotiations.offer(params).await.unwrap_err();
    assert_eq!(err, ProtocolError::MissingAttribute("assignee"));

    assert!(p.to_consumer.sent_urls().is_empty());
    assert!(matches!(
        p.provider.negotiations.get("prov-1").await,
        Err(ProtocolError::InvalidKey { .. })
    ));
    assert!(matches!(
        p.consumer.negotiations.get("cons-1").await,
        Err(ProtocolError::InvalidKey { .. })
    ));
}

#[tokio::test]
async fn test_counter_request_with_foreign_consumer_pid() {
    let p = pair().await;
    p.provider.negotiations.offer(fresh_offer()).await.unwrap();

    let forged = ContractRequestMessage::new(
        Pids::new("prov-1", "cons-X"),
        catalog_offer(),
        None,
    );
    let err = p.provider.negotiations.handle_request(forged).await.unwrap_err();
    assert_eq!(err, ProtocolError::mismatch("consumerPid", "cons-1", "cons-X"));
    assert_eq!(
        p.provider.negotiations.get("prov-1").await.unwrap().state,
        NegotiationState::Offered
    );
}

#[tokio::test]
async fn test_consumer_counter_request_with_wrong_provider_pid() {
    let p = pair().await;
    p.provider.negotiations.offer(fresh_offer()).await.unwrap();

    let err = p
        .consumer
        .negotiations
        .request(RequestParams {
            offer_id: "ofr-1".into(),
            consumer_pid: Some("cons-1".into()),
            provider_pid: Some("prov-X".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "IDENTITY_MISMATCH");
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Offered, NegotiationState::Offered)
    );
}

#[tokio::test]
async fn test_counter_request_then_counter_offer() {
    let p = pair().await;
    p.provider.negotiations.offer(fresh_offer()).await.unwrap();

    let record = p
        .consumer
        .negotiations
        .request(RequestParams {
            offer_id: "ofr-1".into(),
            consumer_pid: Some("cons-1".into()),
            provider_pid: Some("prov-1".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(record.state, NegotiationState::Requested);
    assert_eq!(
        p.to_provider.sent_urls().last().unwrap(),
        "http://provider/negotiations/prov-1/request"
    );

    p.provider
        .negotiations
        .offer(OfferParams {
            offer_id: "ofr-1".into(),
            provider_pid: Some("prov-1".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Offered, NegotiationState::Offered)
    );
}

#[tokio::test]
async fn test_agree_twice_yields_one_agreement() {
    let p = pair().await;
    p.consumer.negotiations.request(fresh_request()).await.unwrap();

    let (record, agreement) = p.provider.negotiations.agree("prov-1").await.unwrap();
    assert_eq!(record.state, NegotiationState::Agreed);
    assert_eq!(record.agreement_id.as_deref(), Some(agreement.id.as_str()));
    assert_eq!(
        p.consumer.negotiations.get("cons-1").await.unwrap().agreement_id,
        record.agreement_id
    );

    let err = p.provider.negotiations.agree("prov-1").await.unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
    assert_eq!(p.to_consumer.sent_urls().len(), 1);
}

#[tokio::test]
async fn test_failed_send_leaves_both_sides_unchanged() {
    let p = pair().await;
    p.consumer.negotiations.request(fresh_request()).await.unwrap();

    p.to_consumer.fail_next();
    let err = p.provider.negotiations.agree("prov-1").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Transport(_)));
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Requested, NegotiationState::Requested)
    );

    // A corrected retry goes through
    p.provider.negotiations.agree("prov-1").await.unwrap();
}

#[tokio::test]
async fn test_counterpart_rejection_is_not_persisted() {
    let p = pair().await;
    p.consumer.negotiations.request(fresh_request()).await.unwrap();

    // Provider closes its side without telling the consumer
    p.provider
        .negotiations
        .handle_termination(ContractNegotiationTerminationMessage::new(
            Pids::new("prov-1", "cons-1"),
            StatusReason::new("DECLINED", vec![]),
        ))
        .await
        .unwrap();

    let err = p.consumer.negotiations.accept("cons-1").await.unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
    assert_eq!(p.to_provider.sent_urls().len(), 1);

    let err = p
        .consumer
        .negotiations
        .terminate("cons-1", StatusReason::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Transport(ref m) if m.contains("STATE_CONFLICT")));
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Terminated, NegotiationState::Requested)
    );
}

#[tokio::test]
async fn test_termination_reaches_both_sides() {
    let p = pair().await;
    p.consumer.negotiations.request(fresh_request()).await.unwrap();

    p.provider
        .negotiations
        .terminate("prov-1", StatusReason::new("DECLINED", vec!["no budget".into()]))
        .await
        .unwrap();
    assert_eq!(
        states(&p, "prov-1", "cons-1").await,
        (NegotiationState::Terminated, NegotiationState::Terminated)
    );
    let terminated = p.consumer.negotiations.get("cons-1").await.unwrap();
    assert_eq!(terminated.termination.unwrap().code, "DECLINED");

    let err = p.provider.negotiations.agree("prov-1").await.unwrap_err();
    assert!(matches!(err, ProtocolError::StateConflict { .. }));
}
