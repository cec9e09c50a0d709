// ==========================================
// BOQ 自动核价系统 - 匹配配置
// ==========================================
// 相似度算法与接受阈值是业务可调参数:
// 应对照真实历史匹配记录校准，而非写死
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SimilarityAlgorithm - 相似度算法
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimilarityAlgorithm {
    /// 标准化编辑距离比（与历史系统的 ratio 口径一致）
    NormalizedLevenshtein,
    /// Jaro-Winkler（前缀一致的短名称更友好）
    JaroWinkler,
}

impl SimilarityAlgorithm {
    /// 计算两个（已标准化）名称的相似度 [0,1]
    pub fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        match self {
            SimilarityAlgorithm::NormalizedLevenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityAlgorithm::JaroWinkler => strsim::jaro_winkler(a, b),
        }
    }
}

// ==========================================
// MatchingConfig - 匹配配置
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub algorithm: SimilarityAlgorithm,
    /// 模糊匹配最低相似度（低于此值判为 UNMATCHED）
    pub min_similarity: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            algorithm: SimilarityAlgorithm::NormalizedLevenshtein,
            // 历史系统的 80% 接受线
            min_similarity: 0.80,
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(format!(
                "模糊匹配阈值必须在 [0,1] 内: {}",
                self.min_similarity
            ));
        }
        Ok(())
    }
}
