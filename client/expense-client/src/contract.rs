//! The expense-report contract as seen from the client.
//!
//! [`ExpenseReportContract`] is the seam between the typed operations and
//! whatever actually reaches the chain. [`RpcContract`] implements it over
//! JSON-RPC using the compiled-in interface description.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Bytes, U256, U64};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::abi::{
    expense_report_interface, require_functions, IExpenseReport, RoleId, REQUIRED_FUNCTIONS,
};
use crate::address::Address;
use crate::errors::{ClientError, Result};
use crate::reports::{Report, ReportHash};
use crate::rpc::RpcClient;

pub use alloy_primitives::TxHash;

/// Where the contract lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub chain_id: u64,
}

impl Deployment {
    /// The deployed expense-report contract (Sepolia).
    pub const EXPENSE_REPORT: Deployment = Deployment {
        address: Address::new([
            0x2a, 0xcc, 0x14, 0xf0, 0x86, 0x80, 0x36, 0x97, 0xf5, 0x41, 0xe2, 0x52, 0x5e, 0x56,
            0xfd, 0x71, 0x1a, 0xac, 0x1f, 0x48,
        ]),
        chain_id: 11_155_111,
    };
}

/// The wallet account that authorizes writes, pinned to a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signer {
    pub account: Address,
    pub chain_id: u64,
}

/// A confirmed (included and successful) transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

#[async_trait]
pub trait ExpenseReportContract: Send + Sync {
    async fn report_count(&self) -> Result<u64>;

    async fn get_report_details(&self, id: u64) -> Result<Report>;

    async fn has_role(&self, role: RoleId, account: Address) -> Result<bool>;

    async fn get_addresses_with_role(&self, role: RoleId) -> Result<Vec<Address>>;

    async fn submit_report(
        &self,
        content_hash: &str,
        project_id: U256,
        report_hash: ReportHash,
        metadata: &str,
    ) -> Result<TxHash>;

    async fn grant_role(&self, role: RoleId, account: Address) -> Result<TxHash>;

    async fn revoke_role(&self, role: RoleId, account: Address) -> Result<TxHash>;

    /// Block until the transaction is included. A reverted transaction is
    /// an error.
    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxReceipt>;
}

/// Builds contract instances bound to a signer.
pub trait ContractFactory: Send + Sync {
    fn bind(
        &self,
        deployment: &Deployment,
        signer: &Signer,
    ) -> Result<Arc<dyn ExpenseReportContract>>;
}

// ─────────────────────────────────────────────────────────
// JSON-RPC implementation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawReceipt {
    #[serde(rename = "blockNumber")]
    block_number: Option<U64>,
    status: Option<U64>,
}

pub struct RpcContractFactory {
    rpc: RpcClient,
    receipt_poll: Duration,
}

impl RpcContractFactory {
    /// Fails if the compiled-in interface does not match the call bindings.
    pub fn new(rpc: RpcClient, receipt_poll: Duration) -> Result<Self> {
        let interface = expense_report_interface()?;
        require_functions(&interface, REQUIRED_FUNCTIONS)?;
        Ok(Self { rpc, receipt_poll })
    }
}

impl ContractFactory for RpcContractFactory {
    fn bind(
        &self,
        deployment: &Deployment,
        signer: &Signer,
    ) -> Result<Arc<dyn ExpenseReportContract>> {
        info!(
            "Binding contract {} for signer {}",
            deployment.address, signer.account
        );
        Ok(Arc::new(RpcContract {
            rpc: self.rpc.clone(),
            address: deployment.address,
            from: signer.account,
            receipt_poll: self.receipt_poll,
        }))
    }
}

pub struct RpcContract {
    rpc: RpcClient,
    address: Address,
    from: Address,
    receipt_poll: Duration,
}

impl RpcContract {
    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let out: Bytes = self
            .rpc
            .call(
                "eth_call",
                json!([{ "from": self.from, "to": self.address, "data": data }, "latest"]),
            )
            .await?;
        Ok(C::abi_decode_returns(&out)?)
    }

    async fn send<C: SolCall>(&self, call: C) -> Result<TxHash> {
        let data = Bytes::from(call.abi_encode());
        let tx: TxHash = self
            .rpc
            .call(
                "eth_sendTransaction",
                json!([{ "from": self.from, "to": self.address, "data": data }]),
            )
            .await?;
        debug!("{} sent as {tx}", C::SIGNATURE);
        Ok(tx)
    }
}

#[async_trait]
impl ExpenseReportContract for RpcContract {
    async fn report_count(&self) -> Result<u64> {
        let count = self.call(IExpenseReport::reportCountCall {}).await?;
        u64::try_from(count)
            .map_err(|_| ClientError::Upstream(format!("report count out of range: {count}")))
    }

    async fn get_report_details(&self, id: u64) -> Result<Report> {
        let ret = self
            .call(IExpenseReport::getReportDetailsCall {
                reportId: U256::from(id),
            })
            .await?;
        Ok(Report {
            id,
            content_hash: ret.ipfsHash,
            project_id: ret.projectId,
            report_hash: ret.reportHash,
            metadata: ret.metadata,
            reporter: ret.reporter,
            audited: ret.audited,
        })
    }

    async fn has_role(&self, role: RoleId, account: Address) -> Result<bool> {
        self.call(IExpenseReport::hasRoleCall { role, account }).await
    }

    async fn get_addresses_with_role(&self, role: RoleId) -> Result<Vec<Address>> {
        self.call(IExpenseReport::getAddressesWithRoleCall { role })
            .await
    }

    async fn submit_report(
        &self,
        content_hash: &str,
        project_id: U256,
        report_hash: ReportHash,
        metadata: &str,
    ) -> Result<TxHash> {
        self.send(IExpenseReport::submitReportCall {
            ipfsHash: content_hash.to_string(),
            projectId: project_id,
            reportHash: report_hash,
            metadata: metadata.to_string(),
        })
        .await
    }

    async fn grant_role(&self, role: RoleId, account: Address) -> Result<TxHash> {
        self.send(IExpenseReport::grantRoleCall { role, account })
            .await
    }

    async fn revoke_role(&self, role: RoleId, account: Address) -> Result<TxHash> {
        self.send(IExpenseReport::revokeRoleCall { role, account })
            .await
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxReceipt> {
        loop {
            let receipt: Option<RawReceipt> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([tx]))
                .await?;

            if let Some(RawReceipt {
                block_number: Some(block),
                status,
            }) = receipt
            {
                if status == Some(U64::ZERO) {
                    return Err(ClientError::Upstream(format!("transaction {tx} reverted")));
                }
                return Ok(TxReceipt {
                    tx_hash: tx,
                    block_number: block.to(),
                });
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }
}
