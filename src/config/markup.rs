// ==========================================
// BOQ 自动核价系统 - 加成系数表
// ==========================================
// 键为百分比整数（如 130），系数 = 百分比 / 100
// 单次运行只选用一个系数，统一作用于所有匹配行的合计
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 出厂默认加成档位
pub const DEFAULT_MARKUP_PERCENTAGES: [u32; 5] = [100, 130, 150, 50, 30];

// ==========================================
// MarkupTable - 加成系数表
// ==========================================
// BTreeMap 保证遍历顺序稳定（报表输出确定性）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupTable {
    rates: BTreeMap<u32, f64>,
}

impl Default for MarkupTable {
    fn default() -> Self {
        Self::from_percentages(&DEFAULT_MARKUP_PERCENTAGES)
    }
}

impl MarkupTable {
    /// 由百分比档位构造，系数 = 百分比 / 100
    pub fn from_percentages(percentages: &[u32]) -> Self {
        let mut rates = BTreeMap::new();
        for &p in percentages {
            rates.insert(p, f64::from(p) / 100.0);
        }
        Self { rates }
    }

    /// 取指定档位的系数; 未配置返回 None
    pub fn multiplier_for(&self, percentage: u32) -> Option<f64> {
        self.rates.get(&percentage).copied()
    }

    /// 已配置的档位（升序）
    pub fn percentages(&self) -> Vec<u32> {
        self.rates.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// 校验: 表非空且系数均为正
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("加成系数表为空".to_string());
        }
        for (p, rate) in &self.rates {
            if *rate <= 0.0 {
                return Err(format!("加成档位 {} 的系数非正: {}", p, rate));
            }
        }
        Ok(())
    }
}
