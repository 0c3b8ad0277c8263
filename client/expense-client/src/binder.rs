//! Binds the deployed contract to the active wallet signer.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::contract::{ContractFactory, Deployment, ExpenseReportContract, Signer};
use crate::errors::{ClientError, Result};
use crate::session::SessionState;
use crate::wallet::WalletProvider;

/// A callable contract instance for one signer. Only valid while that signer
/// is the session's connected account.
#[derive(Clone)]
pub struct ContractHandle {
    deployment: Deployment,
    signer: Signer,
    contract: Arc<dyn ExpenseReportContract>,
}

impl ContractHandle {
    pub fn new(
        deployment: Deployment,
        signer: Signer,
        contract: Arc<dyn ExpenseReportContract>,
    ) -> Self {
        Self {
            deployment,
            signer,
            contract,
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn contract(&self) -> &Arc<dyn ExpenseReportContract> {
        &self.contract
    }
}

impl fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("deployment", &self.deployment)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

pub struct ContractBinder {
    wallet: Option<Arc<dyn WalletProvider>>,
    factory: Arc<dyn ContractFactory>,
    deployment: Deployment,
}

impl ContractBinder {
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        factory: Arc<dyn ContractFactory>,
        deployment: Deployment,
    ) -> Self {
        Self {
            wallet,
            factory,
            deployment,
        }
    }

    /// Authorize, check the network and bind a fresh handle for the active
    /// account. Must be re-run after every account change.
    pub async fn initialize_contract(&self, session: &SessionState) -> Result<ContractHandle> {
        match self.bind_active_signer().await {
            Ok(handle) => {
                info!(
                    "Contract {} initialized for {}",
                    handle.deployment.address, handle.signer.account
                );
                session.bind(handle.clone());
                session.set_error(None);
                Ok(handle)
            }
            Err(e) => {
                error!("Failed to initialize contract: {e}");
                session.unbind();
                session.record_error(&e);
                Err(e)
            }
        }
    }

    async fn bind_active_signer(&self) -> Result<ContractHandle> {
        let wallet = self.wallet.as_ref().ok_or(ClientError::WalletUnavailable)?;

        let accounts = wallet.request_accounts().await?;
        let account = *accounts.first().ok_or_else(|| {
            ClientError::WalletRejected("no account was authorized".to_string())
        })?;

        let chain_id = wallet.chain_id().await?;
        if chain_id != self.deployment.chain_id {
            return Err(ClientError::NetworkMismatch {
                expected: self.deployment.chain_id,
                actual: chain_id,
            });
        }

        let signer = Signer { account, chain_id };
        let contract = self.factory.bind(&self.deployment, &signer)?;
        Ok(ContractHandle::new(self.deployment, signer, contract))
    }
}
