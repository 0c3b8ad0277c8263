//! Wallet connection lifecycle: existing-connection check, user-initiated
//! connect and `accountsChanged` tracking.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::address::Address;
use crate::errors::{ClientError, Result};
use crate::session::SessionState;
use crate::wallet::WalletProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The wallet answered; carries the first authorized account, if any.
    Connected(Option<Address>),
    /// Another connect was already in flight; nothing was requested.
    AlreadyConnecting,
}

pub struct WalletConnector {
    wallet: Option<Arc<dyn WalletProvider>>,
    session: Arc<SessionState>,
}

impl WalletConnector {
    /// `wallet` is `None` when no provider is injected.
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>, session: Arc<SessionState>) -> Self {
        Self { wallet, session }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>> {
        self.wallet.as_ref().ok_or(ClientError::WalletUnavailable)
    }

    fn fail<T>(&self, context: &str, err: ClientError) -> Result<T> {
        error!("{context}: {err}");
        self.session.record_error(&err);
        Err(err)
    }

    /// Pick up an account the user already authorized, without prompting.
    pub async fn check_existing_connection(&self) -> Result<Option<Address>> {
        let wallet = match self.wallet() {
            Ok(w) => w,
            Err(e) => return self.fail("Error checking wallet connection", e),
        };
        match wallet.accounts().await {
            Ok(accounts) => {
                let first = accounts.first().copied();
                if first.is_some() {
                    self.session.set_connected(first);
                }
                Ok(first)
            }
            Err(e) => self.fail("Error checking wallet connection", e),
        }
    }

    /// Ask the wallet for account access. Calls made while one is already
    /// pending return [`ConnectOutcome::AlreadyConnecting`] immediately.
    pub async fn connect(&self) -> Result<ConnectOutcome> {
        let Some(_guard) = self.session.begin_connect() else {
            info!("Already processing wallet connection");
            return Ok(ConnectOutcome::AlreadyConnecting);
        };

        let result = async {
            let wallet = self.wallet()?;
            wallet.request_accounts().await?;
            wallet.accounts().await
        }
        .await;

        match result {
            Ok(accounts) => {
                let first = accounts.first().copied();
                self.session.set_connected(first);
                match first {
                    Some(account) => info!("Wallet connected: {account}"),
                    None => warn!("Wallet returned no accounts"),
                }
                Ok(ConnectOutcome::Connected(first))
            }
            Err(e) => self.fail("Error connecting wallet", e),
        }
    }

    /// Apply an `accountsChanged` notification.
    pub fn apply_accounts_changed(&self, accounts: &[Address]) {
        let first = accounts.first().copied();
        info!("Wallet accounts changed, active account: {first:?}");
        self.session.apply_account_change(first);
    }

    /// Track `accountsChanged` until the returned watcher is dropped.
    pub fn watch_accounts(&self) -> Result<AccountWatcher> {
        let mut subscription = self.wallet()?.subscribe_accounts();
        let connector = WalletConnector {
            wallet: self.wallet.clone(),
            session: Arc::clone(&self.session),
        };
        let task = tokio::spawn(async move {
            while let Some(accounts) = subscription.recv().await {
                connector.apply_accounts_changed(&accounts);
            }
        });
        Ok(AccountWatcher { task })
    }
}

/// Background `accountsChanged` listener. Dropping it unsubscribes.
pub struct AccountWatcher {
    task: JoinHandle<()>,
}

impl AccountWatcher {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AccountWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
