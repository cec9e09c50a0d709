// ==========================================
// BOQ 自动核价系统 - 引擎层
// ==========================================
// 职责: 实现核价业务规则,不拼 SQL
// 铁律: 匹配与计价结果必须可解释（记录方式/相似度/失败原因）
// ==========================================

pub mod classifier;
pub mod cost;
pub mod error;
pub mod extractor;
pub mod matcher;
pub mod orchestrator;
pub mod row_addr;
pub mod summary;
pub mod writer;

// 重导出核心引擎
pub use classifier::SheetClassifier;
pub use cost::CostCalculator;
pub use error::{ProcessError, ProcessResult};
pub use extractor::LineItemExtractor;
pub use matcher::MatchingEngine;
pub use orchestrator::BoqOrchestrator;
pub use row_addr::absolute_row;
pub use summary::SummaryAggregator;
pub use writer::{round2, WorkbookWriter};
