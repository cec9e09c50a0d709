// ==========================================
// BOQ 自动核价系统 - 清单项实体
// ==========================================
// LineItem: 提取阶段产物
// CostedLineItem: 匹配 + 成本计算后的最终行
// ==========================================

use crate::domain::types::MatchMethod;
use serde::{Deserialize, Serialize};

// ==========================================
// LineItem - BOQ 清单行
// ==========================================
// source_row_index 是数据块内的 0-based 下标（表头行之后第一行为 0），
// 不是工作表原始行号；写回时由行号换算函数统一折算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub source_row_index: usize,
    pub code: Option<String>, // 子项无编码
    pub name: String,
    pub quantity: f64, // 非负; 0 合法
    pub unit: Option<String>,
}

impl LineItem {
    /// 是否为依附子项（无编码但有名称，独立计价）
    pub fn is_sub_item(&self) -> bool {
        self.code.is_none()
    }
}

// ==========================================
// MatchInfo - 匹配结果
// ==========================================
// 结果必须可解释: 记录方式与相似度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub entry_id: i64,           // 命中的目录条目 ID
    pub entry_name: String,      // 命中的目录条目名称（报告用）
    pub method: MatchMethod,     // 命中方式
    pub similarity: f64,         // 相似度 [0,1]（精确匹配为 1.0）
    pub material_unit_cost: f64, // 命中条目材料单价
    pub labor_unit_cost: f64,    // 命中条目人工单价
}

// ==========================================
// ItemCostStatus - 行计价状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCostStatus {
    Costed,    // 已匹配并计价
    Unmatched, // 未匹配（成本强制为 0，标记可见）
    Invalid,   // 输入非法（负工程量等），跳过写回
}

// ==========================================
// CostedLineItem - 计价后的清单行
// ==========================================
// 不变量: status == Costed 时 total_cost == material_cost + labor_cost（含加成前）
// 的关系由计算器保证: material/labor 为数量×单价，total 为两者之和×加成系数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedLineItem {
    pub item: LineItem,
    pub matched: Option<MatchInfo>,
    pub status: ItemCostStatus,
    pub invalid_reason: Option<String>,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub total_cost: f64,
}

impl CostedLineItem {
    /// 未匹配行: 三项成本强制为 0
    pub fn unmatched(item: LineItem) -> Self {
        Self {
            item,
            matched: None,
            status: ItemCostStatus::Unmatched,
            invalid_reason: None,
            material_cost: 0.0,
            labor_cost: 0.0,
            total_cost: 0.0,
        }
    }

    /// 非法行: 不参与写回与汇总
    pub fn invalid(item: LineItem, reason: impl Into<String>) -> Self {
        Self {
            item,
            matched: None,
            status: ItemCostStatus::Invalid,
            invalid_reason: Some(reason.into()),
            material_cost: 0.0,
            labor_cost: 0.0,
            total_cost: 0.0,
        }
    }

    /// 是否参与写回（仅成功计价的行写回成本列）
    pub fn is_writable(&self) -> bool {
        self.status == ItemCostStatus::Costed
    }
}
