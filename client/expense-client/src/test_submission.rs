use std::sync::Arc;

use mockito::{Matcher, Server};
use reqwest::Client;

use crate::binder::ContractBinder;
use crate::cache::{MemoryStore, ReportCache};
use crate::contract::Deployment;
use crate::errors::ClientError;
use crate::reports::{fetch_latest_report, report_hash};
use crate::session::SessionState;
use crate::submission::{SubmissionFlow, SubmissionRequest};
use crate::testutils::{account, MockChain, MockContractFactory, MockWallet};
use crate::upload::{UploadClient, UploadFile};

const CID: &str = "QmT5NvUtoM5nWFfrQdVrFtvGfKFmG7AHE8P34isapyhCxX";

async fn bound_session(chain: &Arc<MockChain>) -> Arc<SessionState> {
    let session = Arc::new(SessionState::new());
    ContractBinder::new(
        Some(MockWallet::new(vec![account(1)])),
        MockContractFactory::new(Arc::clone(chain)),
        Deployment::EXPENSE_REPORT,
    )
    .initialize_contract(&session)
    .await
    .unwrap();
    session
}

fn flow(session: Arc<SessionState>, relay: &Server) -> SubmissionFlow {
    SubmissionFlow::new(
        session,
        UploadClient::new(Client::new(), relay.url()),
        Some(ReportCache::new(MemoryStore::new())),
    )
}

fn request() -> SubmissionRequest {
    SubmissionRequest {
        file: Some(UploadFile {
            file_name: "hotel.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4 hotel invoice".to_vec(),
        }),
        project_id: Some(12),
        metadata: "Conference hotel, 2 nights".to_string(),
    }
}

#[tokio::test]
async fn submission_uploads_records_and_caches() {
    let chain = MockChain::new();
    chain.seed_report("QmOlder", 3, "older", account(2));
    let session = bound_session(&chain).await;
    let mut relay = Server::new_async().await;
    let upload = relay
        .mock("POST", "/upload")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="hotel.pdf""#.to_string()),
            Matcher::Regex("Conference hotel, 2 nights".to_string()),
        ]))
        .with_status(200)
        .with_body(format!(r#"{{"IpfsHash":"{CID}","PinSize":22}}"#))
        .create_async()
        .await;
    let flow = flow(Arc::clone(&session), &relay);

    let receipt = flow.submit(request()).await.unwrap();

    upload.assert_async().await;
    assert_eq!(receipt.content_hash, CID);
    assert_eq!(
        receipt.report_hash,
        report_hash(CID, "Conference hotel, 2 nights")
    );
    assert_eq!(receipt.report_count, 2);

    let latest = fetch_latest_report(&session).await.unwrap().unwrap();
    assert_eq!(latest.content_hash, CID);
    assert_eq!(latest.project_id, 12);
    assert_eq!(latest.report_hash, receipt.report_hash);

    let cache = flow.cache().unwrap();
    let cached = cache
        .load_report(Deployment::EXPENSE_REPORT.address)
        .unwrap();
    assert_eq!(cached.content_hash, CID);
    assert_eq!(cached.project_id, 12);
    assert_eq!(cache.load_count(), Some(2));
}

#[tokio::test]
async fn relay_rejection_stops_before_the_contract() {
    let chain = MockChain::new();
    let session = bound_session(&chain).await;
    let mut relay = Server::new_async().await;
    relay
        .mock("POST", "/upload")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"No files were uploaded."}"#)
        .create_async()
        .await;
    let flow = flow(session, &relay);

    let err = flow.submit(request()).await.unwrap_err();

    assert_eq!(err.user_message(), "No files were uploaded.");
    assert_eq!(chain.call_count(), 0);
    let cache = flow.cache().unwrap();
    assert!(cache.load_report(Deployment::EXPENSE_REPORT.address).is_none());
    assert_eq!(cache.load_count(), None);
}

#[tokio::test]
async fn incomplete_form_is_rejected_locally() {
    let chain = MockChain::new();
    let session = bound_session(&chain).await;
    let mut relay = Server::new_async().await;
    let upload = relay
        .mock("POST", "/upload")
        .expect(0)
        .create_async()
        .await;
    let flow = flow(session, &relay);

    let cases = [
        SubmissionRequest {
            file: None,
            ..request()
        },
        SubmissionRequest {
            project_id: None,
            ..request()
        },
        SubmissionRequest {
            metadata: " ".to_string(),
            ..request()
        },
    ];
    for case in cases {
        let err = flow.submit(case).await.unwrap_err();
        assert!(matches!(&err, ClientError::Validation(_)));
        assert_eq!(err.user_message(), "Please fill in all fields");
    }

    upload.assert_async().await;
    assert_eq!(chain.call_count(), 0);
}

#[tokio::test]
async fn unbound_session_uploads_nothing() {
    let mut relay = Server::new_async().await;
    let upload = relay
        .mock("POST", "/upload")
        .expect(0)
        .create_async()
        .await;
    let flow = flow(Arc::new(SessionState::new()), &relay);

    let err = flow.submit(request()).await.unwrap_err();

    assert!(matches!(err, ClientError::ContractUninitialized));
    upload.assert_async().await;
}

#[tokio::test]
async fn missing_content_id_from_relay_is_an_error() {
    let chain = MockChain::new();
    let session = bound_session(&chain).await;
    let mut relay = Server::new_async().await;
    relay
        .mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"{"PinSize":22}"#)
        .create_async()
        .await;
    let flow = flow(session, &relay);

    let err = flow.submit(request()).await.unwrap_err();

    assert!(matches!(err, ClientError::Upstream(_)));
    assert_eq!(chain.call_count(), 0);
}
