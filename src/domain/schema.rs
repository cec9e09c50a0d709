// ==========================================
// BOQ 自动核价系统 - 工作表模式注册表
// ==========================================
// 职责: 以单一声明式静态表描述各领域的列布局
// 铁律: 模式顺序即匹配顺序（first-match-wins），DEFAULT 永远兜底
// ==========================================

use crate::domain::types::Domain;
use serde::{Deserialize, Serialize};

// ==========================================
// ColumnMap - 语义字段 → 列号映射
// ==========================================
// 列号为 Excel 的 1-based 列号（B 列 = 2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub code: u32,          // 项目编码列
    pub name: u32,          // 项目名称列
    pub quantity: u32,      // 工程量列
    pub unit: u32,          // 单位列
    pub material_cost: u32, // 材料费写回列
    pub labor_cost: u32,    // 人工费写回列
    pub total_cost: u32,    // 合计写回列
}

impl ColumnMap {
    /// 全部列号（不变量校验用）
    pub fn all_columns(&self) -> [u32; 7] {
        [
            self.code,
            self.name,
            self.quantity,
            self.unit,
            self.material_cost,
            self.labor_cost,
            self.total_cost,
        ]
    }

    /// 校验: 任意两个语义字段不得共用同一列
    pub fn is_injective(&self) -> bool {
        let cols = self.all_columns();
        for i in 0..cols.len() {
            for j in (i + 1)..cols.len() {
                if cols[i] == cols[j] {
                    return false;
                }
            }
        }
        true
    }
}

// ==========================================
// SchemaDescriptor - 领域工作表模式
// ==========================================
// name_pattern 为大小写不敏感的子串模式; None 仅用于 DEFAULT
// 注册表是编译期常量，不参与序列化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub domain: Domain,
    pub name_pattern: Option<&'static str>,
    pub header_row_index: usize, // 表头行下标（0-based）
    pub columns: ColumnMap,
}

impl SchemaDescriptor {
    /// 工作表名是否命中本模式（大小写不敏感子串）
    pub fn matches(&self, sheet_name: &str) -> bool {
        match self.name_pattern {
            Some(pattern) => sheet_name.to_lowercase().contains(pattern),
            None => true, // DEFAULT 兜底
        }
    }
}

// ==========================================
// 模式注册表
// ==========================================
// 顺序敏感: ELECTRICAL 在最前（含 "EE" 的表名必须判为电气），
// DEFAULT 在最后且无模式
//
// 电气/空调/消防共用宽表布局（单位在 F、工程量在 G、成本在 H/J/L），
// 室内装修与 DEFAULT 使用紧凑布局（B..H 连续）
pub static SCHEMA_REGISTRY: [SchemaDescriptor; 5] = [
    SchemaDescriptor {
        domain: Domain::Electrical,
        name_pattern: Some("ee"),
        header_row_index: 7, // Excel 第 8 行
        columns: ColumnMap {
            code: 2,
            name: 3,
            unit: 6,
            quantity: 7,
            material_cost: 8,
            labor_cost: 10,
            total_cost: 12,
        },
    },
    SchemaDescriptor {
        domain: Domain::Interior,
        name_pattern: Some("int"),
        header_row_index: 9, // Excel 第 10 行
        columns: ColumnMap {
            code: 2,
            name: 3,
            quantity: 4,
            unit: 5,
            material_cost: 6,
            labor_cost: 7,
            total_cost: 8,
        },
    },
    SchemaDescriptor {
        domain: Domain::Ac,
        name_pattern: Some("ac"),
        header_row_index: 5, // Excel 第 6 行
        columns: ColumnMap {
            code: 2,
            name: 3,
            unit: 6,
            quantity: 7,
            material_cost: 8,
            labor_cost: 10,
            total_cost: 12,
        },
    },
    SchemaDescriptor {
        domain: Domain::FireProtection,
        name_pattern: Some("fp"),
        header_row_index: 7, // Excel 第 8 行
        columns: ColumnMap {
            code: 2,
            name: 3,
            unit: 6,
            quantity: 7,
            material_cost: 8,
            labor_cost: 10,
            total_cost: 12,
        },
    },
    SchemaDescriptor {
        domain: Domain::Default,
        name_pattern: None,
        header_row_index: 9,
        columns: ColumnMap {
            code: 2,
            name: 3,
            quantity: 4,
            unit: 5,
            material_cost: 6,
            labor_cost: 7,
            total_cost: 8,
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_column_maps_injective() {
        for schema in SCHEMA_REGISTRY.iter() {
            assert!(
                schema.columns.is_injective(),
                "领域 {} 的列映射存在重复列",
                schema.domain
            );
        }
    }

    #[test]
    fn test_registry_default_last_and_patternless() {
        let last = SCHEMA_REGISTRY.last().unwrap();
        assert_eq!(last.domain, Domain::Default);
        assert!(last.name_pattern.is_none());
        // DEFAULT 之外的模式必须有 pattern
        for schema in &SCHEMA_REGISTRY[..SCHEMA_REGISTRY.len() - 1] {
            assert!(schema.name_pattern.is_some());
        }
    }

    #[test]
    fn test_pattern_match_case_insensitive() {
        let electrical = &SCHEMA_REGISTRY[0];
        assert!(electrical.matches("EE-1"));
        assert!(electrical.matches("ee-2"));
        assert!(electrical.matches("Sheet-EE"));
        assert!(!electrical.matches("INT-1"));
    }

    #[test]
    fn test_electrical_is_first() {
        // 含 "EE" 的表名必须优先判为电气
        assert_eq!(SCHEMA_REGISTRY[0].domain, Domain::Electrical);
    }
}
