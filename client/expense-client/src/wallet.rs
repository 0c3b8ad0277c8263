//! Wallet provider abstraction (the EIP-1193 surface the client needs) and
//! an implementation backed by a JSON-RPC endpoint.

use std::time::Duration;

use alloy_primitives::U64;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::address::Address;
use crate::errors::Result;
use crate::rpc::RpcClient;

const CHANGE_BUFFER: usize = 16;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Already-authorized accounts, without prompting (`eth_accounts`).
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Ask the user to authorize accounts (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Chain the wallet is currently connected to (`eth_chainId`).
    async fn chain_id(&self) -> Result<u64>;

    /// Stream of `accountsChanged` notifications.
    fn subscribe_accounts(&self) -> AccountsSubscription;
}

/// A live `accountsChanged` subscription. Dropping it unsubscribes.
pub struct AccountsSubscription {
    rx: broadcast::Receiver<Vec<Address>>,
    poller: Option<JoinHandle<()>>,
}

impl AccountsSubscription {
    pub fn new(rx: broadcast::Receiver<Vec<Address>>) -> Self {
        Self { rx, poller: None }
    }

    fn polled(rx: broadcast::Receiver<Vec<Address>>, poller: JoinHandle<()>) -> Self {
        Self {
            rx,
            poller: Some(poller),
        }
    }

    /// Next account list, or `None` once the provider goes away.
    pub async fn recv(&mut self) -> Option<Vec<Address>> {
        loop {
            match self.rx.recv().await {
                Ok(accounts) => return Some(accounts),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Dropped {skipped} stale account notifications");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for AccountsSubscription {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────
// JSON-RPC backed wallet
// ─────────────────────────────────────────────────────────

/// Wallet provider talking to a node or wallet bridge over JSON-RPC.
///
/// Plain JSON-RPC has no push channel, so account changes are detected by
/// polling `eth_accounts` every `poll_interval`.
#[derive(Clone)]
pub struct RpcWallet {
    rpc: RpcClient,
    poll_interval: Duration,
}

impl RpcWallet {
    pub fn new(rpc: RpcClient, poll_interval: Duration) -> Self {
        Self { rpc, poll_interval }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.rpc.call("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.rpc.call("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let chain_id: U64 = self.rpc.call("eth_chainId", json!([])).await?;
        Ok(chain_id.to())
    }

    fn subscribe_accounts(&self) -> AccountsSubscription {
        let (tx, rx) = broadcast::channel(CHANGE_BUFFER);
        let wallet = self.clone();
        let poller = tokio::spawn(async move {
            let mut last: Option<Vec<Address>> = None;
            loop {
                match wallet.accounts().await {
                    Ok(accounts) => {
                        if last.as_ref().is_some_and(|prev| *prev != accounts) {
                            debug!("Wallet accounts changed: {accounts:?}");
                            if tx.send(accounts.clone()).is_err() {
                                break;
                            }
                        }
                        last = Some(accounts);
                    }
                    Err(e) => warn!("Account poll failed: {e}"),
                }
                tokio::time::sleep(wallet.poll_interval).await;
            }
        });
        AccountsSubscription::polled(rx, poller)
    }
}
