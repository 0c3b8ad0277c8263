//! Report operations on the bound contract.

use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::address::Address;
use crate::contract::TxReceipt;
use crate::errors::{ClientError, Result};
use crate::session::SessionState;

/// Keccak-256 digest binding a document to its metadata.
pub type ReportHash = B256;

/// `keccak256(utf8(content_hash ++ metadata))`
pub fn report_hash(content_hash: &str, metadata: &str) -> ReportHash {
    let mut preimage = String::with_capacity(content_hash.len() + metadata.len());
    preimage.push_str(content_hash);
    preimage.push_str(metadata);
    keccak256(preimage.as_bytes())
}

/// A submitted expense report as recorded on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    /// Full `uint256`; other clients may record ids wider than 64 bits.
    pub project_id: U256,
    /// Content identifier of the supporting document.
    pub content_hash: String,
    pub report_hash: ReportHash,
    pub metadata: String,
    pub reporter: Address,
    pub audited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSubmission {
    pub content_hash: String,
    pub project_id: u64,
    pub report_hash: ReportHash,
    pub metadata: String,
}

impl ReportSubmission {
    /// Build a submission with its digest computed from the other fields.
    pub fn new(content_hash: impl Into<String>, project_id: u64, metadata: impl Into<String>) -> Self {
        let content_hash = content_hash.into();
        let metadata = metadata.into();
        Self {
            report_hash: report_hash(&content_hash, &metadata),
            content_hash,
            project_id,
            metadata,
        }
    }
}

/// Record a report and wait until the transaction is included.
pub async fn submit_report(session: &SessionState, report: &ReportSubmission) -> Result<TxReceipt> {
    let handle = session.current_handle()?;

    if report.content_hash.trim().is_empty() {
        return Err(ClientError::Validation("Content hash is required".to_string()));
    }
    if report.metadata.trim().is_empty() {
        return Err(ClientError::Validation("Metadata is required".to_string()));
    }

    let contract = handle.contract();
    let result = async {
        let tx = contract
            .submit_report(
                &report.content_hash,
                U256::from(report.project_id),
                report.report_hash,
                &report.metadata,
            )
            .await?;
        contract.wait_for_receipt(tx).await
    }
    .await;

    match &result {
        Ok(receipt) => info!(
            "Report for project {} confirmed in block {} ({})",
            report.project_id, receipt.block_number, receipt.tx_hash
        ),
        Err(e) => error!("Error submitting report: {e}"),
    }
    result
}

pub async fn fetch_report_count(session: &SessionState) -> Result<u64> {
    let handle = session.current_handle()?;
    handle.contract().report_count().await
}

pub async fn fetch_report_details(session: &SessionState, id: u64) -> Result<Report> {
    let handle = session.current_handle()?;
    handle.contract().get_report_details(id).await
}

/// Every report, ids `0..count`, fetched one after another.
pub async fn fetch_all_reports(session: &SessionState) -> Result<Vec<Report>> {
    let handle = session.current_handle()?;
    let contract = handle.contract();
    let count = contract.report_count().await?;
    debug!("Fetching {count} reports");

    let mut reports = Vec::new();
    for id in 0..count {
        reports.push(contract.get_report_details(id).await?);
    }
    Ok(reports)
}

/// The most recently submitted report, if any.
pub async fn fetch_latest_report(session: &SessionState) -> Result<Option<Report>> {
    let handle = session.current_handle()?;
    let contract = handle.contract();
    match contract.report_count().await? {
        0 => Ok(None),
        count => contract.get_report_details(count - 1).await.map(Some),
    }
}
