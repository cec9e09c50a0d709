// ==========================================
// BOQ 自动核价系统 - 成本计算器
// ==========================================
// 规则:
//   material = quantity × material_unit_cost
//   labor    = quantity × labor_unit_cost
//   total    = (material + labor) × 加成系数
// 未匹配行三项成本强制为 0; 负工程量直接拒绝（不静默纠正）
// 中途不做任何舍入，舍入只发生在写回时
// ==========================================

use crate::domain::item::{CostedLineItem, ItemCostStatus, LineItem, MatchInfo};
use crate::engine::error::{ProcessError, ProcessResult};

pub struct CostCalculator {
    multiplier: f64,
}

impl CostCalculator {
    /// multiplier 为本次运行选定的唯一加成系数
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// 计算单行成本
    ///
    /// 负工程量返回 Validation 错误，由调用方决定行级跳过
    pub fn cost_item(
        &self,
        sheet: &str,
        item: LineItem,
        matched: Option<MatchInfo>,
    ) -> ProcessResult<CostedLineItem> {
        if item.quantity < 0.0 {
            return Err(ProcessError::Validation {
                sheet: sheet.to_string(),
                row: item.source_row_index,
                message: format!("工程量为负: {}", item.quantity),
            });
        }

        let Some(info) = matched else {
            return Ok(CostedLineItem::unmatched(item));
        };

        let material_cost = item.quantity * info.material_unit_cost;
        let labor_cost = item.quantity * info.labor_unit_cost;
        let total_cost = (material_cost + labor_cost) * self.multiplier;

        Ok(CostedLineItem {
            item,
            matched: Some(info),
            status: ItemCostStatus::Costed,
            invalid_reason: None,
            material_cost,
            labor_cost,
            total_cost,
        })
    }
}
