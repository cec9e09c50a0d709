// ==========================================
// BOQ 自动核价系统 - 配置层
// ==========================================
// 职责: 单次核价运行的显式配置对象
// 铁律: 配置随运行显式传入，不做全局可变状态
// ==========================================

pub mod markup;
pub mod matching;
pub mod summary;

pub use markup::MarkupTable;
pub use matching::{MatchingConfig, SimilarityAlgorithm};
pub use summary::{SummaryCell, SummaryLayout};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// ProcessingConfig - 单次运行配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub markup: MarkupTable,
    pub matching: MatchingConfig,
    pub summary: SummaryLayout,

    /// 是否处理仅被 DEFAULT 兜底命中的工作表
    /// 默认 false: 未被任何领域模式识别的表不触碰，仅记录为 Skipped
    pub process_default_sheets: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            markup: MarkupTable::default(),
            matching: MatchingConfig::default(),
            summary: SummaryLayout::default(),
            process_default_sheets: false,
        }
    }
}

impl ProcessingConfig {
    /// 校验配置自洽性
    pub fn validate(&self) -> Result<(), String> {
        self.markup.validate()?;
        self.matching.validate()?;
        Ok(())
    }
}

/// 默认主数据目录数据库路径（平台数据目录下）
pub fn default_catalog_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("boq-costing").join("master_catalog.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ProcessingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_db_path_has_file_name() {
        let path = default_catalog_db_path();
        assert_eq!(path.file_name().unwrap(), "master_catalog.db");
    }
}
