// ==========================================
// BOQ 自动核价系统 - 核心库
// ==========================================
// 定位: 工程量清单(BOQ)自动核价引擎
// 流程: 工作表识别 → 清单提取 → 主数据匹配 → 成本计算 → 原位写回 → 汇总
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 主数据目录访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 单次核价运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 会话管理与处理门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Domain, MatchMethod, SessionState};

// 领域实体
pub use domain::{
    CostedLineItem, ItemCostStatus, LineItem, MasterCatalogEntry, MatchInfo, ProcessingSession,
    SchemaDescriptor, SheetGrid, SheetOutcome, SheetStatus,
};

// 引擎
pub use engine::{
    BoqOrchestrator, CostCalculator, LineItemExtractor, MatchingEngine, SheetClassifier,
    SummaryAggregator, WorkbookWriter,
};

// 配置
pub use config::{MarkupTable, MatchingConfig, ProcessingConfig, SummaryLayout};

// API
pub use api::{ProcessApi, ProcessingReport, SessionManager};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BOQ 自动核价系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
