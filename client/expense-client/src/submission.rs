//! End-to-end report submission: upload the document, record it on-chain,
//! refresh the count and remember what was sent.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cache::{CachedReport, ReportCache};
use crate::contract::TxReceipt;
use crate::errors::{ClientError, Result};
use crate::reports::{self, ReportHash, ReportSubmission};
use crate::session::SessionState;
use crate::upload::{UploadClient, UploadFile};

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub file: Option<UploadFile>,
    pub project_id: Option<u64>,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub content_hash: String,
    pub report_hash: ReportHash,
    pub tx: TxReceipt,
    pub report_count: u64,
}

pub struct SubmissionFlow {
    session: Arc<SessionState>,
    uploader: UploadClient,
    cache: Option<ReportCache>,
}

impl SubmissionFlow {
    pub fn new(
        session: Arc<SessionState>,
        uploader: UploadClient,
        cache: Option<ReportCache>,
    ) -> Self {
        Self {
            session,
            uploader,
            cache,
        }
    }

    pub fn cache(&self) -> Option<&ReportCache> {
        self.cache.as_ref()
    }

    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt> {
        let result = self.run(request).await;
        if let Err(e) = &result {
            error!("Error during submission: {e}");
        }
        result
    }

    async fn run(&self, request: SubmissionRequest) -> Result<SubmissionReceipt> {
        let missing = || ClientError::Validation("Please fill in all fields".to_string());
        let file = request
            .file
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(missing)?;
        let project_id = request.project_id.ok_or_else(missing)?;
        if request.metadata.trim().is_empty() {
            return Err(missing());
        }

        // Nothing leaves the client until a contract is bound.
        let handle = self.session.current_handle()?;

        let project = project_id.to_string();
        let content_hash = self
            .uploader
            .upload(
                file,
                &[("projectId", project.as_str()), ("metadata", request.metadata.as_str())],
            )
            .await?;

        let submission = ReportSubmission::new(content_hash, project_id, request.metadata);
        let tx = reports::submit_report(&self.session, &submission).await?;
        let report_count = reports::fetch_report_count(&self.session).await?;
        info!("Report submitted successfully; {report_count} reports on-chain");

        if let Some(cache) = &self.cache {
            let cached = CachedReport {
                content_hash: submission.content_hash.clone(),
                report_hash: submission.report_hash,
                metadata: submission.metadata.clone(),
                project_id,
                contract: handle.deployment().address,
                saved_at: Utc::now(),
            };
            if let Err(e) = cache.save_submission(&cached, report_count) {
                warn!("Could not cache submitted report: {e}");
            }
        }

        Ok(SubmissionReceipt {
            content_hash: submission.content_hash,
            report_hash: submission.report_hash,
            tx,
            report_count,
        })
    }
}
