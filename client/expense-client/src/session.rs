//! Wallet session state.
//!
//! One [`SessionState`] per running client, passed explicitly to every
//! operation. It holds the connected account, the connect-in-flight flag, the
//! last user-visible error and the current contract binding, and publishes
//! every change on a `watch` channel so views can re-render.
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──► Connected(account, handle?)
//!      ▲                                            │
//!      └────────── accountsChanged([]) ─────────────┘
//! ```
//!
//! A binding is only handed out while its signer is still the connected
//! account; an account switch drops it.

use tokio::sync::watch;
use tracing::debug;

use crate::address::Address;
use crate::binder::ContractHandle;
use crate::errors::{ClientError, Result};

#[derive(Clone, Debug, Default)]
pub struct WalletSession {
    pub connected_account: Option<Address>,
    pub is_connecting: bool,
    pub last_error: Option<String>,
    pub binding: Option<ContractHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected(Address),
}

pub struct SessionState {
    tx: watch::Sender<WalletSession>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WalletSession::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> WalletSession {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.tx.subscribe()
    }

    pub fn connected_account(&self) -> Option<Address> {
        self.tx.borrow().connected_account
    }

    pub fn is_connecting(&self) -> bool {
        self.tx.borrow().is_connecting
    }

    pub fn last_error(&self) -> Option<String> {
        self.tx.borrow().last_error.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        let s = self.tx.borrow();
        match (s.is_connecting, s.connected_account) {
            (true, _) => SessionPhase::Connecting,
            (false, Some(account)) => SessionPhase::Connected(account),
            (false, None) => SessionPhase::Disconnected,
        }
    }

    /// Record the active account. A binding for any other signer is dropped.
    pub fn set_connected(&self, account: Option<Address>) {
        self.tx.send_modify(|s| switch_account(s, account));
    }

    /// Switch the active account and clear any error in one update, so
    /// observers never see the new account next to a stale error.
    pub fn apply_account_change(&self, account: Option<Address>) {
        self.tx.send_modify(|s| {
            switch_account(s, account);
            s.last_error = None;
        });
    }

    pub fn set_connecting(&self, connecting: bool) {
        self.tx.send_modify(|s| s.is_connecting = connecting);
    }

    pub fn set_error(&self, message: Option<String>) {
        self.tx.send_modify(|s| s.last_error = message);
    }

    pub(crate) fn record_error(&self, err: &ClientError) {
        self.set_error(Some(err.user_message()));
    }

    /// Install a fresh binding; its signer becomes the connected account.
    pub fn bind(&self, handle: ContractHandle) {
        self.tx.send_modify(|s| {
            s.connected_account = Some(handle.signer().account);
            s.binding = Some(handle);
        });
    }

    pub fn unbind(&self) {
        self.tx.send_modify(|s| s.binding = None);
    }

    /// The binding for the current signer, if there is one.
    pub fn current_handle(&self) -> Result<ContractHandle> {
        let s = self.tx.borrow();
        match (&s.binding, s.connected_account) {
            (Some(handle), Some(account)) if handle.signer().account == account => {
                Ok(handle.clone())
            }
            _ => Err(ClientError::ContractUninitialized),
        }
    }

    /// Claim the connect slot. Returns `None` while another connect is in
    /// flight; the returned guard releases the slot when dropped.
    pub fn begin_connect(&self) -> Option<ConnectingGuard<'_>> {
        let claimed = self.tx.send_if_modified(|s| {
            if s.is_connecting {
                return false;
            }
            s.is_connecting = true;
            s.last_error = None;
            true
        });
        claimed.then_some(ConnectingGuard { state: self })
    }
}

fn switch_account(s: &mut WalletSession, account: Option<Address>) {
    s.connected_account = account;
    let stale = s
        .binding
        .as_ref()
        .is_some_and(|h| Some(h.signer().account) != account);
    if stale {
        debug!("Dropping contract binding for previous signer");
        s.binding = None;
    }
}

/// Holds `is_connecting` for the duration of a connect attempt.
pub struct ConnectingGuard<'a> {
    state: &'a SessionState,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.state.set_connecting(false);
    }
}
