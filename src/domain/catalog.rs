// ==========================================
// BOQ 自动核价系统 - 主数据目录实体
// ==========================================
// 铁律: total_unit_cost 恒等于 material_unit_cost + labor_unit_cost
// 每个领域一套目录，目录之间互不引用
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MasterCatalogEntry - 主数据目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterCatalogEntry {
    pub internal_id: i64,           // 目录内唯一 ID（领域内唯一）
    pub code: Option<String>,       // 项目编码（可缺失）
    pub name: String,               // 项目名称（主匹配键）
    pub unit: Option<String>,       // 计量单位
    pub material_unit_cost: f64,    // 材料单价
    pub labor_unit_cost: f64,       // 人工单价
    pub total_unit_cost: f64,       // 合计单价（= 材料 + 人工）
}

impl MasterCatalogEntry {
    /// 构造条目，合计单价由两项单价求和保证一致
    pub fn new(
        internal_id: i64,
        code: Option<String>,
        name: impl Into<String>,
        unit: Option<String>,
        material_unit_cost: f64,
        labor_unit_cost: f64,
    ) -> Self {
        Self {
            internal_id,
            code,
            name: name.into(),
            unit,
            material_unit_cost,
            labor_unit_cost,
            total_unit_cost: material_unit_cost + labor_unit_cost,
        }
    }
}

// ==========================================
// CatalogEntryDraft - 导入中间结构体
// ==========================================
// 用途: 主数据导入管道产物（尚未分配 internal_id）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntryDraft {
    pub code: Option<String>,
    pub name: String,
    pub unit: Option<String>,
    pub material_unit_cost: f64,
    pub labor_unit_cost: f64,

    // 元信息
    pub source_row: usize, // 源文件行号（报告用）
}

impl CatalogEntryDraft {
    /// 重复条目判定键（同编码 + 同名称视为同一条目）
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}",
            self.code.as_deref().unwrap_or(""),
            crate::domain::normalize::normalize_name(&self.name)
        )
    }

    /// 单价信息量（重复条目保留信息更全的一条）
    pub fn cost_weight(&self) -> f64 {
        self.material_unit_cost + self.labor_unit_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_unit_cost_is_sum() {
        let entry = MasterCatalogEntry::new(1, Some("INT001".to_string()), "Ceiling tile", None, 50.0, 20.0);
        assert_eq!(entry.total_unit_cost, 70.0);
    }

    #[test]
    fn test_dedup_key_normalizes_name() {
        let a = CatalogEntryDraft {
            code: Some("X1".to_string()),
            name: "Ceiling  Tile".to_string(),
            unit: None,
            material_unit_cost: 1.0,
            labor_unit_cost: 0.0,
            source_row: 1,
        };
        let b = CatalogEntryDraft {
            code: Some("X1".to_string()),
            name: "ceiling tile".to_string(),
            unit: None,
            material_unit_cost: 2.0,
            labor_unit_cost: 0.0,
            source_row: 2,
        };
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert!(b.cost_weight() > a.cost_weight());
    }
}
