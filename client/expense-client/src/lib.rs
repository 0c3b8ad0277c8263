//! # Expense Report Client
//!
//! Client-side core of the expense-reporting dApp: connects a wallet, binds
//! the deployed expense-report contract to the active signer, submits and
//! reads reports, manages roles, and sends supporting documents to the
//! upload relay.
//!
//! | Concern          | Module(s)                                   |
//! |------------------|---------------------------------------------|
//! | Session state    | [`session`]                                 |
//! | Wallet lifecycle | [`connector`], [`wallet`]                   |
//! | Contract binding | [`binder`], [`contract`], [`abi`], [`rpc`]  |
//! | Reports          | [`reports`], [`submission`], [`cache`]      |
//! | Roles            | [`roles`]                                   |
//! | Document upload  | [`upload`]                                  |
//!
//! Every operation takes the [`SessionState`] explicitly; there is no
//! process-wide contract instance. Writes read the session's current binding
//! at call time, so a handle left over from a previous account is never used.

use std::sync::Arc;

use reqwest::Client;

pub mod abi;
pub mod address;
pub mod binder;
pub mod cache;
pub mod config;
pub mod connector;
pub mod contract;
pub mod errors;
pub mod reports;
pub mod roles;
pub mod rpc;
pub mod session;
pub mod submission;
pub mod upload;
pub mod wallet;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

#[cfg(test)]
mod test_reports;
#[cfg(test)]
mod test_roles;
#[cfg(test)]
mod test_submission;

pub use address::Address;
pub use binder::{ContractBinder, ContractHandle};
pub use cache::{JsonFileStore, MemoryStore, ReportCache};
pub use config::ClientConfig;
pub use connector::{AccountWatcher, ConnectOutcome, WalletConnector};
pub use contract::{Deployment, ExpenseReportContract, TxReceipt};
pub use errors::{ClientError, Result};
pub use reports::{Report, ReportHash, ReportSubmission};
pub use roles::Role;
pub use session::{SessionPhase, SessionState};
pub use submission::{SubmissionFlow, SubmissionReceipt, SubmissionRequest};
pub use upload::{UploadClient, UploadFile};
pub use wallet::WalletProvider;

/// Everything a front end needs, wired from [`ClientConfig`].
pub struct ExpenseClient {
    pub session: Arc<SessionState>,
    pub connector: WalletConnector,
    pub binder: ContractBinder,
    pub submissions: SubmissionFlow,
}

impl ExpenseClient {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        // No request timeout; wallet prompts wait on the user.
        let http = Client::builder().build()?;
        let rpc = rpc::RpcClient::new(http.clone(), config.rpc_url.clone());

        let wallet: Arc<dyn WalletProvider> = Arc::new(wallet::RpcWallet::new(
            rpc.clone(),
            config.account_poll_interval,
        ));
        let factory = Arc::new(contract::RpcContractFactory::new(
            rpc,
            config.receipt_poll_interval,
        )?);

        let cache = match &config.report_cache_path {
            Some(path) => ReportCache::new(JsonFileStore::open(path)?),
            None => ReportCache::new(MemoryStore::new()),
        };

        let session = Arc::new(SessionState::new());
        Ok(Self {
            connector: WalletConnector::new(Some(Arc::clone(&wallet)), Arc::clone(&session)),
            binder: ContractBinder::new(Some(wallet), factory, Deployment::EXPENSE_REPORT),
            submissions: SubmissionFlow::new(
                Arc::clone(&session),
                UploadClient::new(http, config.backend_url.clone()),
                Some(cache),
            ),
            session,
        })
    }
}
