// ==========================================
// BOQ 自动核价系统 - 汇总表布局配置
// ==========================================
// 各领域合计的落点是固定配置坐标，不从模式推导
// ==========================================

use crate::domain::types::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// SummaryCell - 汇总落点（1-based 行列）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCell {
    pub row: u32,
    pub col: u32,
}

// ==========================================
// SummaryLayout - 汇总表布局
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLayout {
    /// 汇总表名模式（大小写不敏感子串，命中即视为汇总表）
    pub sheet_patterns: Vec<String>,
    /// 各领域合计的写入坐标
    pub positions: BTreeMap<Domain, SummaryCell>,
}

impl Default for SummaryLayout {
    fn default() -> Self {
        let mut positions = BTreeMap::new();
        // 默认布局: B5..B8 依次为 室内/电气/空调/消防
        positions.insert(Domain::Interior, SummaryCell { row: 5, col: 2 });
        positions.insert(Domain::Electrical, SummaryCell { row: 6, col: 2 });
        positions.insert(Domain::Ac, SummaryCell { row: 7, col: 2 });
        positions.insert(Domain::FireProtection, SummaryCell { row: 8, col: 2 });

        Self {
            sheet_patterns: ["sum", "summary", "total", "overview", "รวม"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            positions,
        }
    }
}

impl SummaryLayout {
    /// 工作表是否为汇总表
    pub fn matches_sheet(&self, sheet_name: &str) -> bool {
        let lowered = sheet_name.to_lowercase();
        self.sheet_patterns.iter().any(|p| lowered.contains(p))
    }

    /// 指定领域的落点（未配置的领域不写汇总）
    pub fn position_for(&self, domain: Domain) -> Option<SummaryCell> {
        self.positions.get(&domain).copied()
    }
}
