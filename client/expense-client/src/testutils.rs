//! In-memory wallet and contract doubles for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{keccak256, U256};
use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

use crate::abi::RoleId;
use crate::address::Address;
use crate::contract::{
    ContractFactory, Deployment, ExpenseReportContract, Signer, TxHash, TxReceipt,
};
use crate::errors::{ClientError, Result};
use crate::reports::{Report, ReportHash};
use crate::roles::Role;
use crate::wallet::{AccountsSubscription, WalletProvider};

/// Deterministic test address `0xnnnn…nn`.
pub fn account(n: u8) -> Address {
    Address::new([n; 20])
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────

#[derive(Default)]
struct ChainState {
    reports: Vec<Report>,
    roles: HashMap<RoleId, Vec<Address>>,
    mined: HashMap<TxHash, u64>,
    count_override: Option<u64>,
}

/// Shared in-memory ledger. Every contract call is counted.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    calls: AtomicUsize,
    next_block: AtomicU64,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A chain where `admin` already holds `ADMIN_ROLE`.
    pub fn with_admin(admin: Address) -> Arc<Self> {
        let chain = Self::new();
        chain.seed_role(Role::Admin, admin);
        chain
    }

    pub fn seed_role(&self, role: Role, account: Address) {
        let mut state = lock(&self.state);
        let holders = state.roles.entry(role.id()).or_default();
        if !holders.contains(&account) {
            holders.push(account);
        }
    }

    /// Append a report directly, bypassing the contract surface.
    pub fn seed_report(&self, content_hash: &str, project_id: u64, metadata: &str, reporter: Address) {
        let mut state = lock(&self.state);
        let id = state.reports.len() as u64;
        state.reports.push(Report {
            id,
            project_id: U256::from(project_id),
            content_hash: content_hash.to_string(),
            report_hash: crate::reports::report_hash(content_hash, metadata),
            metadata: metadata.to_string(),
            reporter,
            audited: false,
        });
    }

    /// Make `reportCount` answer `count` regardless of what is stored.
    pub fn override_report_count(&self, count: u64) {
        lock(&self.state).count_override = Some(count);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn mine(&self, state: &mut ChainState) -> TxHash {
        let block = self.next_block.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = keccak256(block.to_be_bytes());
        state.mined.insert(tx, block);
        tx
    }

    fn is_admin(state: &ChainState, account: Address) -> bool {
        state
            .roles
            .get(&Role::Admin.id())
            .is_some_and(|holders| holders.contains(&account))
    }
}

pub struct MockContract {
    chain: Arc<MockChain>,
    signer: Address,
}

impl MockContract {
    pub fn new(chain: Arc<MockChain>, signer: Address) -> Self {
        Self { chain, signer }
    }

    fn require_admin(&self, state: &ChainState) -> Result<()> {
        if MockChain::is_admin(state, self.signer) {
            Ok(())
        } else {
            Err(ClientError::Upstream(
                "execution reverted: caller is not an admin".to_string(),
            ))
        }
    }
}

#[async_trait]
impl ExpenseReportContract for MockContract {
    async fn report_count(&self) -> Result<u64> {
        self.chain.touch();
        let state = lock(&self.chain.state);
        Ok(state
            .count_override
            .unwrap_or(state.reports.len() as u64))
    }

    async fn get_report_details(&self, id: u64) -> Result<Report> {
        self.chain.touch();
        let state = lock(&self.chain.state);
        usize::try_from(id)
            .ok()
            .and_then(|i| state.reports.get(i))
            .cloned()
            .ok_or_else(|| {
                ClientError::Upstream("execution reverted: report does not exist".to_string())
            })
    }

    async fn has_role(&self, role: RoleId, account: Address) -> Result<bool> {
        self.chain.touch();
        let state = lock(&self.chain.state);
        Ok(state
            .roles
            .get(&role)
            .is_some_and(|holders| holders.contains(&account)))
    }

    async fn get_addresses_with_role(&self, role: RoleId) -> Result<Vec<Address>> {
        self.chain.touch();
        let state = lock(&self.chain.state);
        Ok(state.roles.get(&role).cloned().unwrap_or_default())
    }

    async fn submit_report(
        &self,
        content_hash: &str,
        project_id: U256,
        report_hash: ReportHash,
        metadata: &str,
    ) -> Result<TxHash> {
        self.chain.touch();
        let mut state = lock(&self.chain.state);
        let id = state.reports.len() as u64;
        state.reports.push(Report {
            id,
            project_id,
            content_hash: content_hash.to_string(),
            report_hash,
            metadata: metadata.to_string(),
            reporter: self.signer,
            audited: false,
        });
        Ok(self.chain.mine(&mut state))
    }

    async fn grant_role(&self, role: RoleId, account: Address) -> Result<TxHash> {
        self.chain.touch();
        let mut state = lock(&self.chain.state);
        self.require_admin(&state)?;
        let holders = state.roles.entry(role).or_default();
        if !holders.contains(&account) {
            holders.push(account);
        }
        Ok(self.chain.mine(&mut state))
    }

    async fn revoke_role(&self, role: RoleId, account: Address) -> Result<TxHash> {
        self.chain.touch();
        let mut state = lock(&self.chain.state);
        self.require_admin(&state)?;
        if let Some(holders) = state.roles.get_mut(&role) {
            holders.retain(|a| *a != account);
        }
        Ok(self.chain.mine(&mut state))
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxReceipt> {
        self.chain.touch();
        let state = lock(&self.chain.state);
        let block = state
            .mined
            .get(&tx)
            .copied()
            .ok_or_else(|| ClientError::Upstream(format!("unknown transaction {tx}")))?;
        Ok(TxReceipt {
            tx_hash: tx,
            block_number: block,
        })
    }
}

pub struct MockContractFactory {
    chain: Arc<MockChain>,
    binds: AtomicUsize,
}

impl MockContractFactory {
    pub fn new(chain: Arc<MockChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            binds: AtomicUsize::new(0),
        })
    }

    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

impl ContractFactory for MockContractFactory {
    fn bind(
        &self,
        _deployment: &Deployment,
        signer: &Signer,
    ) -> Result<Arc<dyn ExpenseReportContract>> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockContract::new(Arc::clone(&self.chain), signer.account)))
    }
}

// ─────────────────────────────────────────────────────────
// Wallet
// ─────────────────────────────────────────────────────────

/// Scriptable wallet. Accounts are hidden from `eth_accounts` until the
/// user authorizes them through `request_accounts`.
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    authorized: AtomicBool,
    reject: AtomicBool,
    chain_id: AtomicU64,
    gate: Mutex<Option<Arc<Notify>>>,
    request_calls: AtomicUsize,
    changes: broadcast::Sender<Vec<Address>>,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>) -> Arc<Self> {
        let (changes, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(accounts),
            authorized: AtomicBool::new(false),
            reject: AtomicBool::new(false),
            chain_id: AtomicU64::new(Deployment::EXPENSE_REPORT.chain_id),
            gate: Mutex::new(None),
            request_calls: AtomicUsize::new(0),
            changes,
        })
    }

    /// A wallet whose accounts were authorized in an earlier visit.
    pub fn authorized(accounts: Vec<Address>) -> Arc<Self> {
        let wallet = Self::new(accounts);
        wallet.authorized.store(true, Ordering::SeqCst);
        wallet
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Make `request_accounts` wait until the returned handle is notified,
    /// like a permission prompt the user has not answered yet.
    pub fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    /// Switch accounts and emit `accountsChanged`.
    pub fn switch_accounts(&self, accounts: Vec<Address>) {
        *lock(&self.accounts) = accounts.clone();
        let _ = self.changes.send(accounts);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(lock(&self.accounts).clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ClientError::WalletRejected(
                "User rejected the request.".to_string(),
            ));
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(lock(&self.accounts).clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    fn subscribe_accounts(&self) -> AccountsSubscription {
        AccountsSubscription::new(self.changes.subscribe())
    }
}
