// ==========================================
// BOQ 自动核价系统 - 处理门面
// ==========================================
// 职责: 上传 → 核价 → 下载 的调用入口
// 部分成功按表上报（不折叠为单一成败信号）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::session_manager::SessionManager;
use crate::config::ProcessingConfig;
use crate::domain::session::{SheetOutcome, SheetStage, SheetStatus};
use crate::domain::types::{Domain, SessionState};
use crate::engine::orchestrator::BoqOrchestrator;
use crate::repository::catalog_repo::CatalogRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ==========================================
// SheetReportEntry - 单表上报条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetReportEntry {
    pub sheet_name: String,
    pub domain: Domain,
    pub status: SheetStatus,
    pub failed_stage: Option<SheetStage>,
    pub message: Option<String>,
    pub item_count: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub invalid: usize,
    pub material_total: f64,
    pub labor_total: f64,
    pub total_cost: f64,
}

impl From<&SheetOutcome> for SheetReportEntry {
    fn from(outcome: &SheetOutcome) -> Self {
        Self {
            sheet_name: outcome.sheet_name.clone(),
            domain: outcome.domain,
            status: outcome.status,
            failed_stage: outcome.failed_stage,
            message: outcome.message.clone(),
            item_count: outcome.items.len(),
            matched: outcome.matched_count(),
            unmatched: outcome.unmatched_count(),
            invalid: outcome.invalid_count(),
            material_total: outcome.material_total,
            labor_total: outcome.labor_total,
            total_cost: outcome.total_cost,
        }
    }
}

// ==========================================
// ProcessingReport - 会话处理报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub session_id: String,
    pub state: SessionState,
    pub failure_reason: Option<String>,
    pub sheets: Vec<SheetReportEntry>,
    pub grand_total: f64,
}

// ==========================================
// ProcessApi - 处理门面
// ==========================================
pub struct ProcessApi {
    manager: Arc<SessionManager>,
    orchestrator: BoqOrchestrator,
}

impl ProcessApi {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        config: ProcessingConfig,
        manager: Arc<SessionManager>,
    ) -> ApiResult<Self> {
        let orchestrator = BoqOrchestrator::new(catalog, config)?;
        Ok(Self {
            manager,
            orchestrator,
        })
    }

    /// 上传工作簿，创建会话
    pub async fn upload(
        &self,
        source_bytes: Vec<u8>,
        file_name: Option<String>,
    ) -> ApiResult<String> {
        if source_bytes.is_empty() {
            return Err(ApiError::InvalidInput("上传字节流为空".to_string()));
        }
        Ok(self.manager.create(source_bytes, file_name).await)
    }

    /// 执行核价（会话锁内推进; 并发调用自然串行化）
    ///
    /// 会话级失败返回错误; 单表失败在返回的报告中逐表呈现
    pub async fn process(
        &self,
        session_id: &str,
        markup_percent: u32,
    ) -> ApiResult<ProcessingReport> {
        let handle = self.manager.get(session_id).await?;
        let mut session = handle.session.lock().await;

        if session.state != SessionState::Uploaded {
            return Err(ApiError::InvalidStateTransition {
                from: session.state.to_string(),
                to: SessionState::Parsed.to_string(),
            });
        }

        let process_result = self
            .orchestrator
            .process_session(&mut session, markup_percent)
            .await;

        let report = Self::build_report(&session);
        match process_result {
            Ok(()) => Ok(report),
            Err(e) => {
                // 报告仍可用（FAILED 状态 + 各表结果），但以错误通知调用方
                info!(session_id, error = %e, "核价失败");
                Err(e.into())
            }
        }
    }

    /// 查询会话状态报告
    pub async fn status(&self, session_id: &str) -> ApiResult<ProcessingReport> {
        let handle = self.manager.get(session_id).await?;
        let session = handle.session.lock().await;
        Ok(Self::build_report(&session))
    }

    /// 下载输出工作簿（仅 FINALIZED 可下载; 下载后进入终态）
    pub async fn download(&self, session_id: &str) -> ApiResult<Vec<u8>> {
        let handle = self.manager.get(session_id).await?;
        let mut session = handle.session.lock().await;

        let bytes = session.output_bytes.clone().ok_or_else(|| {
            ApiError::InvalidStateTransition {
                from: session.state.to_string(),
                to: SessionState::Downloaded.to_string(),
            }
        })?;

        session.advance(SessionState::Downloaded)?;
        Ok(bytes)
    }

    /// 请求取消（工作表边界生效）
    pub async fn cancel(&self, session_id: &str) -> ApiResult<()> {
        self.manager.request_cancel(session_id).await
    }

    fn build_report(session: &crate::domain::session::ProcessingSession) -> ProcessingReport {
        let sheets: Vec<SheetReportEntry> = session
            .per_sheet_results
            .iter()
            .map(SheetReportEntry::from)
            .collect();
        let grand_total = sheets
            .iter()
            .filter(|s| matches!(s.status, SheetStatus::Written | SheetStatus::Costed))
            .map(|s| s.total_cost)
            .sum();

        ProcessingReport {
            session_id: session.session_id.clone(),
            state: session.state,
            failure_reason: session.failure_reason.clone(),
            sheets,
            grand_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_catalog_repo::InMemoryCatalogRepository;

    fn api() -> ProcessApi {
        ProcessApi::new(
            Arc::new(InMemoryCatalogRepository::new()),
            ProcessingConfig::default(),
            Arc::new(SessionManager::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_bytes() {
        let api = api();
        let result = api.upload(Vec::new(), None).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_process_unknown_session() {
        let api = api();
        let result = api.process("missing", 130).await;
        assert!(matches!(result, Err(ApiError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_download_before_finalized_rejected() {
        let api = api();
        let id = api.upload(vec![1, 2, 3], None).await.unwrap();
        let result = api.download(&id).await;
        assert!(matches!(
            result,
            Err(ApiError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_process_garbage_workbook_fails_session() {
        let api = api();
        let id = api.upload(b"not an xlsx".to_vec(), None).await.unwrap();
        let result = api.process(&id, 130).await;
        assert!(result.is_err());

        let report = api.status(&id).await.unwrap();
        assert_eq!(report.state, SessionState::Failed);
        assert!(report.failure_reason.is_some());
    }

    #[tokio::test]
    async fn test_process_rejects_reprocessing() {
        let api = api();
        let id = api.upload(b"whatever".to_vec(), None).await.unwrap();
        let _ = api.process(&id, 130).await; // 进入 FAILED
        let second = api.process(&id, 130).await;
        assert!(matches!(
            second,
            Err(ApiError::InvalidStateTransition { .. })
        ));
    }
}
