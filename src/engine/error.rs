// ==========================================
// BOQ 自动核价系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 错误信息必须带工作表 / 行号上下文
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum ProcessError {
    // ===== 工作表级错误（仅影响本表）=====
    #[error("工作表格式错误 (sheet={sheet}): {message}")]
    SheetFormat { sheet: String, message: String },

    #[error("数据校验失败 (sheet={sheet}, 行 {row}): {message}")]
    Validation {
        sheet: String,
        row: usize,
        message: String,
    },

    #[error("写回行号越界 (sheet={sheet}): 目标行 {row} 超出有效范围 [1, {max_row}]")]
    RowIndex {
        sheet: String,
        row: u32,
        max_row: u32,
    },

    // ===== 领域级错误（该领域全部按未匹配处理）=====
    #[error("主数据目录访问失败 (domain={domain}): {message}")]
    CatalogAccess { domain: String, message: String },

    // ===== 会话级错误 =====
    #[error("工作簿读取失败: {0}")]
    Workbook(String),

    #[error("加成档位未配置: {0}%")]
    MarkupNotConfigured(u32),

    #[error("会话已请求取消")]
    Cancelled,

    #[error("全部工作表处理失败")]
    AllSheetsFailed,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<ImportError>（工作簿解析失败归入会话级错误）
impl From<ImportError> for ProcessError {
    fn from(err: ImportError) -> Self {
        ProcessError::Workbook(err.to_string())
    }
}

/// Result 类型别名
pub type ProcessResult<T> = Result<T, ProcessError>;
