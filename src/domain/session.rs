// ==========================================
// BOQ 自动核价系统 - 处理会话
// ==========================================
// 铁律: 会话独占其源工作簿; 状态只能顺序推进
// 取消请求仅在工作表边界被采纳
// ==========================================

use crate::domain::item::{CostedLineItem, ItemCostStatus};
use crate::domain::types::{Domain, SessionState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ==========================================
// 会话错误
// ==========================================
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },
}

// ==========================================
// SheetStage - 工作表处理阶段（失败定位用）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetStage {
    Extract,
    Match,
    Cost,
    Write,
}

impl std::fmt::Display for SheetStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetStage::Extract => write!(f, "EXTRACT"),
            SheetStage::Match => write!(f, "MATCH"),
            SheetStage::Cost => write!(f, "COST"),
            SheetStage::Write => write!(f, "WRITE"),
        }
    }
}

// ==========================================
// SheetStatus - 单表处理结果状态
// ==========================================
// 部分成功是合法终局: 每张表独立上报，不得折叠为单一成败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetStatus {
    Costed,  // 已计价（尚未写回）
    Written, // 成本已写回
    Failed,  // 本表失败（其余表继续）
    Skipped, // 未处理（汇总表/未识别表/取消）
}

// ==========================================
// SheetOutcome - 单表处理结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetOutcome {
    pub sheet_name: String,
    pub domain: Domain,
    pub status: SheetStatus,
    pub failed_stage: Option<SheetStage>,
    pub message: Option<String>,
    pub items: Vec<CostedLineItem>,
    pub material_total: f64,
    pub labor_total: f64,
    pub total_cost: f64,
}

impl SheetOutcome {
    pub fn skipped(sheet_name: impl Into<String>, domain: Domain, reason: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            domain,
            status: SheetStatus::Skipped,
            failed_stage: None,
            message: Some(reason.into()),
            items: Vec::new(),
            material_total: 0.0,
            labor_total: 0.0,
            total_cost: 0.0,
        }
    }

    pub fn failed(
        sheet_name: impl Into<String>,
        domain: Domain,
        stage: SheetStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            domain,
            status: SheetStatus::Failed,
            failed_stage: Some(stage),
            message: Some(message.into()),
            items: Vec::new(),
            material_total: 0.0,
            labor_total: 0.0,
            total_cost: 0.0,
        }
    }

    /// 标记失败（保留已有明细便于排查）
    pub fn mark_failed(&mut self, stage: SheetStage, message: impl Into<String>) {
        self.status = SheetStatus::Failed;
        self.failed_stage = Some(stage);
        self.message = Some(message.into());
    }

    /// 由明细行重算汇总字段
    pub fn recompute_totals(&mut self) {
        self.material_total = 0.0;
        self.labor_total = 0.0;
        self.total_cost = 0.0;
        for item in &self.items {
            if item.status == ItemCostStatus::Costed {
                self.material_total += item.material_cost;
                self.labor_total += item.labor_cost;
                self.total_cost += item.total_cost;
            }
        }
    }

    pub fn matched_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemCostStatus::Costed)
            .count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemCostStatus::Unmatched)
            .count()
    }

    pub fn invalid_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemCostStatus::Invalid)
            .count()
    }
}

// ==========================================
// ProcessingSession - 处理会话
// ==========================================
// 源工作簿字节归会话独占; output_bytes 在 FINALIZED 后就绪
#[derive(Debug, Clone)]
pub struct ProcessingSession {
    pub session_id: String,
    pub file_name: Option<String>,
    pub source_bytes: Vec<u8>,
    pub state: SessionState,
    pub per_sheet_results: Vec<SheetOutcome>,
    pub output_bytes: Option<Vec<u8>>,
    pub failure_reason: Option<String>,

    // 取消标志: 独立于会话锁，允许处理过程中外部置位
    pub cancel_requested: Arc<AtomicBool>,

    // 审计字段
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingSession {
    pub fn new(source_bytes: Vec<u8>, file_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            file_name,
            source_bytes,
            state: SessionState::Uploaded,
            per_sheet_results: Vec::new(),
            output_bytes: None,
            failure_reason: None,
            cancel_requested: Arc::new(AtomicBool::new(false)),
            created_at: now,
            updated_at: now,
        }
    }

    /// 顺序推进状态（非法转换报错）
    pub fn advance(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 进入失败终态（幂等; 终态下忽略）
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        if self.state.can_transition_to(SessionState::Failed) {
            self.state = SessionState::Failed;
            self.failure_reason = Some(reason.into());
            self.updated_at = Utc::now();
        }
    }

    /// 是否已请求取消（工作表边界检查点调用）
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Relaxed)
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Relaxed);
    }
}
