use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::{keccak256, U256};

use crate::binder::ContractBinder;
use crate::contract::Deployment;
use crate::errors::ClientError;
use crate::reports::{
    fetch_all_reports, fetch_latest_report, fetch_report_count, fetch_report_details,
    report_hash, submit_report, ReportSubmission,
};
use crate::session::SessionState;
use crate::testutils::{account, MockChain, MockContractFactory, MockWallet};

async fn bound_session(chain: &Arc<MockChain>, signer: u8) -> (SessionState, Arc<MockWallet>) {
    let wallet = MockWallet::new(vec![account(signer)]);
    let session = SessionState::new();
    ContractBinder::new(
        Some(wallet.clone()),
        MockContractFactory::new(Arc::clone(chain)),
        Deployment::EXPENSE_REPORT,
    )
    .initialize_contract(&session)
    .await
    .unwrap();
    (session, wallet)
}

#[test]
fn report_hash_is_keccak_of_concatenation() {
    let expected = keccak256(b"QmDocumenthotel invoice");
    assert_eq!(report_hash("QmDocument", "hotel invoice"), expected);
    assert_ne!(report_hash("QmA", "b"), report_hash("Qm", "Ab"));
}

#[tokio::test]
async fn submit_without_binding_fails_before_any_call() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 9).await;
    session.unbind();

    let err = submit_report(&session, &ReportSubmission::new("QmCid", 1, "meta"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::ContractUninitialized));
    assert_eq!(chain.call_count(), 0);
}

#[tokio::test]
async fn reads_without_binding_fail() {
    let session = SessionState::new();
    assert!(matches!(
        fetch_report_count(&session).await,
        Err(ClientError::ContractUninitialized)
    ));
    assert!(matches!(
        fetch_all_reports(&session).await,
        Err(ClientError::ContractUninitialized)
    ));
}

#[tokio::test]
async fn submitted_report_reads_back_unchanged() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 1).await;
    let content = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    let metadata = "Travel: Berlin → Lisbon, 3 nights";

    let submission = ReportSubmission::new(content, 42, metadata);
    let receipt = submit_report(&session, &submission).await.unwrap();
    assert!(receipt.block_number > 0);

    assert_eq!(fetch_report_count(&session).await.unwrap(), 1);
    let report = fetch_report_details(&session, 0).await.unwrap();
    assert_eq!(report.content_hash, content);
    assert_eq!(report.metadata, metadata);
    assert_eq!(report.project_id, U256::from(42u8));
    assert_eq!(report.report_hash, report_hash(content, metadata));
    assert_eq!(report.reporter, account(1));
    assert!(!report.audited);
}

#[tokio::test]
async fn fetch_all_returns_every_report_in_id_order() {
    let chain = MockChain::new();
    for i in 0..5u64 {
        chain.seed_report(&format!("QmDoc{i}"), i, &format!("item {i}"), account(2));
    }
    let (session, _wallet) = bound_session(&chain, 2).await;

    let reports = fetch_all_reports(&session).await.unwrap();

    assert_eq!(reports.len(), 5);
    let ids: Vec<u64> = reports.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
    assert_eq!(reports[3].content_hash, "QmDoc3");
}

#[tokio::test]
async fn fetch_all_on_empty_contract_is_empty() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 3).await;
    assert!(fetch_all_reports(&session).await.unwrap().is_empty());
    assert_eq!(fetch_latest_report(&session).await.unwrap(), None);
}

#[tokio::test]
async fn huge_report_count_fails_on_first_missing_id() {
    let chain = MockChain::new();
    chain.seed_report("QmOnly", 1, "a", account(10));
    chain.override_report_count(u64::MAX);
    let (session, _wallet) = bound_session(&chain, 10).await;

    let err = fetch_all_reports(&session).await.unwrap_err();

    assert!(matches!(err, ClientError::Upstream(msg) if msg.contains("does not exist")));
    // reportCount, id 0, id 1
    assert_eq!(chain.call_count(), 3);
}

#[tokio::test]
async fn latest_report_is_highest_id() {
    let chain = MockChain::new();
    chain.seed_report("QmFirst", 1, "a", account(4));
    chain.seed_report("QmSecond", 2, "b", account(4));
    let (session, _wallet) = bound_session(&chain, 4).await;

    let latest = fetch_latest_report(&session).await.unwrap().unwrap();
    assert_eq!(latest.id, 1);
    assert_eq!(latest.content_hash, "QmSecond");
}

#[tokio::test]
async fn out_of_range_id_propagates_contract_error() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 5).await;

    let err = fetch_report_details(&session, 7).await.unwrap_err();
    assert!(matches!(err, ClientError::Upstream(msg) if msg.contains("does not exist")));
}

#[tokio::test]
async fn empty_fields_are_rejected_client_side() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 6).await;
    let calls = chain.call_count();

    let err = submit_report(&session, &ReportSubmission::new("", 1, "meta"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let err = submit_report(&session, &ReportSubmission::new("QmCid", 1, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(chain.call_count(), calls);
}

#[tokio::test]
async fn write_after_account_switch_needs_rebinding() {
    let chain = MockChain::new();
    let (session, _wallet) = bound_session(&chain, 7).await;

    session.set_connected(Some(account(8)));

    let err = submit_report(&session, &ReportSubmission::new("QmCid", 1, "meta"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ContractUninitialized));
    assert_eq!(chain.call_count(), 0);
}
