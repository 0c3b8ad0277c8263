use std::sync::Arc;

use crate::binder::ContractBinder;
use crate::contract::Deployment;
use crate::errors::ClientError;
use crate::roles::{grant_role, has_role, list_holders_of_role, revoke_role, roles_of, Role};
use crate::session::SessionState;
use crate::testutils::{account, MockChain, MockContractFactory, MockWallet};

async fn session_for(chain: &Arc<MockChain>, signer: u8) -> SessionState {
    let session = SessionState::new();
    ContractBinder::new(
        Some(MockWallet::new(vec![account(signer)])),
        MockContractFactory::new(Arc::clone(chain)),
        Deployment::EXPENSE_REPORT,
    )
    .initialize_contract(&session)
    .await
    .unwrap();
    session
}

#[tokio::test]
async fn grant_then_revoke_admin_role() {
    let chain = MockChain::with_admin(account(1));
    let session = session_for(&chain, 1).await;
    let target = account(2).to_string();

    assert!(!has_role(&session, Role::Admin, &target).await.unwrap());

    let receipt = grant_role(&session, Role::Admin, &target).await.unwrap();
    assert!(receipt.block_number > 0);
    assert!(has_role(&session, Role::Admin, &target).await.unwrap());

    revoke_role(&session, Role::Admin, &target).await.unwrap();
    assert!(!has_role(&session, Role::Admin, &target).await.unwrap());
}

#[tokio::test]
async fn accepts_lowercase_and_unprefixed_addresses() {
    let chain = MockChain::with_admin(account(1));
    let session = session_for(&chain, 1).await;
    let target = account(0xab);

    grant_role(&session, Role::Auditor, &"ab".repeat(20))
        .await
        .unwrap();

    let lower = format!("0x{}", "ab".repeat(20));
    assert!(has_role(&session, Role::Auditor, &lower).await.unwrap());
    assert!(has_role(&session, Role::Auditor, &target.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn roles_of_reports_every_held_role() {
    let chain = MockChain::with_admin(account(3));
    chain.seed_role(Role::Contractor, account(3));
    let session = session_for(&chain, 3).await;

    let held = roles_of(&session, &account(3).to_string()).await.unwrap();
    assert_eq!(held, vec![Role::Admin, Role::Contractor]);

    let none = roles_of(&session, &account(4).to_string()).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn lists_holders_of_role() {
    let chain = MockChain::with_admin(account(5));
    chain.seed_role(Role::Auditor, account(6));
    chain.seed_role(Role::Auditor, account(7));
    let session = session_for(&chain, 5).await;

    let auditors = list_holders_of_role(&session, Role::Auditor).await.unwrap();
    assert_eq!(auditors, vec![account(6), account(7)]);
    assert!(list_holders_of_role(&session, Role::Contractor)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn invalid_account_is_rejected_before_any_call() {
    let chain = MockChain::with_admin(account(8));
    let session = session_for(&chain, 8).await;

    for input in ["", "   ", "0x1234", "not an address", "0xZZ"] {
        let err = grant_role(&session, Role::Auditor, input).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)), "input {input:?}");
    }
    let err = has_role(&session, Role::Admin, "").await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Please select a role and enter an account address."
    );
    assert_eq!(chain.call_count(), 0);
}

#[tokio::test]
async fn non_admin_grant_surfaces_contract_revert() {
    let chain = MockChain::with_admin(account(9));
    let session = session_for(&chain, 10).await;

    let err = grant_role(&session, Role::Auditor, &account(11).to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Upstream(msg) if msg.contains("not an admin")));
    assert!(!has_role(&session, Role::Auditor, &account(11).to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn role_operations_need_a_binding() {
    let session = SessionState::new();
    let target = account(12).to_string();

    assert!(matches!(
        grant_role(&session, Role::Admin, &target).await,
        Err(ClientError::ContractUninitialized)
    ));
    assert!(matches!(
        list_holders_of_role(&session, Role::Admin).await,
        Err(ClientError::ContractUninitialized)
    ));
}
