// ==========================================
// BOQ 自动核价系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与外部报表一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 施工领域 (Domain)
// ==========================================
// 每个领域有独立的主数据目录与独立的工作表列布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Interior,       // 室内装修
    Electrical,     // 电气工程
    Ac,             // 空调系统
    FireProtection, // 消防系统
    Default,        // 兜底（无模式匹配时）
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Interior => write!(f, "INTERIOR"),
            Domain::Electrical => write!(f, "ELECTRICAL"),
            Domain::Ac => write!(f, "AC"),
            Domain::FireProtection => write!(f, "FIRE_PROTECTION"),
            Domain::Default => write!(f, "DEFAULT"),
        }
    }
}

impl Domain {
    /// 转换为数据库存储的字符串
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Domain::Interior => "INTERIOR",
            Domain::Electrical => "ELECTRICAL",
            Domain::Ac => "AC",
            Domain::FireProtection => "FIRE_PROTECTION",
            Domain::Default => "DEFAULT",
        }
    }

    /// 从字符串解析领域
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INTERIOR" => Some(Domain::Interior),
            "ELECTRICAL" => Some(Domain::Electrical),
            "AC" => Some(Domain::Ac),
            "FIRE_PROTECTION" => Some(Domain::FireProtection),
            "DEFAULT" => Some(Domain::Default),
            _ => None,
        }
    }
}

// ==========================================
// 匹配方式 (Match Method)
// ==========================================
// 匹配引擎的三级解析顺序，结果需可解释
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    ExactCode,      // 编码精确匹配
    NormalizedName, // 标准化名称精确匹配
    Fuzzy,          // 模糊名称匹配（相似度达阈值）
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::ExactCode => write!(f, "EXACT_CODE"),
            MatchMethod::NormalizedName => write!(f, "NORMALIZED_NAME"),
            MatchMethod::Fuzzy => write!(f, "FUZZY"),
        }
    }
}

// ==========================================
// 会话状态 (Session State)
// ==========================================
// 铁律: 状态严格顺序推进，不可跳跃、不可回退
// DOWNLOADED 与 FAILED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Uploaded,   // 工作簿已上传
    Parsed,     // 全部工作表已解析提取
    Matched,    // 全部清单项已完成匹配
    Costed,     // 全部清单项已完成成本计算
    Finalized,  // 写回与汇总完成，输出就绪
    Downloaded, // 输出已被取走（终态）
    Failed,     // 不可恢复失败（终态）
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uploaded => write!(f, "UPLOADED"),
            SessionState::Parsed => write!(f, "PARSED"),
            SessionState::Matched => write!(f, "MATCHED"),
            SessionState::Costed => write!(f, "COSTED"),
            SessionState::Finalized => write!(f, "FINALIZED"),
            SessionState::Downloaded => write!(f, "DOWNLOADED"),
            SessionState::Failed => write!(f, "FAILED"),
        }
    }
}

impl SessionState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Downloaded | SessionState::Failed)
    }

    /// 顺序推进的下一个状态
    pub fn next(&self) -> Option<SessionState> {
        match self {
            SessionState::Uploaded => Some(SessionState::Parsed),
            SessionState::Parsed => Some(SessionState::Matched),
            SessionState::Matched => Some(SessionState::Costed),
            SessionState::Costed => Some(SessionState::Finalized),
            SessionState::Finalized => Some(SessionState::Downloaded),
            SessionState::Downloaded | SessionState::Failed => None,
        }
    }

    /// 校验状态转换合法性
    ///
    /// 合法转换: 顺序推进一步，或从任意非终态进入 FAILED
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        if next == SessionState::Failed {
            return !self.is_terminal();
        }
        self.next() == Some(next)
    }
}
