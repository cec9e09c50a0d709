// ==========================================
// BOQ 自动核价系统 - API 层错误类型
// ==========================================
// 职责: 把引擎/仓储/会话错误转换为调用方友好的错误
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::session::SessionError;
use crate::engine::error::ProcessError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("会话未找到: {0}")]
    SessionNotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("加成档位未配置: {0}%")]
    MarkupNotConfigured(u32),

    // ===== 处理错误 =====
    #[error("核价处理失败: {0}")]
    ProcessingFailed(String),

    // ===== 数据访问错误 =====
    #[error("主数据目录错误: {0}")]
    CatalogError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 从 SessionError 转换
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
        }
    }
}

// 从 ProcessError 转换
impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::MarkupNotConfigured(p) => ApiError::MarkupNotConfigured(p),
            other => ApiError::ProcessingFailed(other.to_string()),
        }
    }
}

// 从 RepositoryError 转换
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::CatalogError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_conversion() {
        let err = SessionError::InvalidStateTransition {
            from: "UPLOADED".to_string(),
            to: "COSTED".to_string(),
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::InvalidStateTransition { from, to } => {
                assert_eq!(from, "UPLOADED");
                assert_eq!(to, "COSTED");
            }
            _ => panic!("期望 InvalidStateTransition"),
        }
    }

    #[test]
    fn test_markup_error_conversion() {
        let api_err: ApiError = ProcessError::MarkupNotConfigured(77).into();
        assert!(matches!(api_err, ApiError::MarkupNotConfigured(77)));
    }
}
