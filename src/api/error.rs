// ==========================================
// 修业计划审核系统 - API 层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 仓储层错误在此统一归类, 不向调用方泄漏 SQL 细节
// ==========================================

use crate::repository::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 输入校验 =====
    #[error("参数校验失败: {0}")]
    ValidationError(String),

    // ===== 资源缺失 =====
    #[error("资源未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 状态/并发冲突 =====
    #[error("操作冲突: {0}")]
    ConflictError(String),

    // ===== 权限 =====
    #[error("无操作权限: {0}")]
    AuthorizationError(String),

    // ===== 数据一致性 (成环/孤儿引用等) =====
    #[error("数据一致性错误: {0}")]
    ConsistencyError(String),

    // ===== 底层透传 =====
    #[error("存储层错误: {0}")]
    StorageError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StateConflict { message } => ApiError::ConflictError(message),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::ConflictError(format!("无效的状态转换: from={} to={}", from, to))
            }
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::ConflictError(msg),
            RepositoryError::BusinessRuleViolation(msg) => ApiError::ValidationError(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("field={}: {}", field, message))
            }
            RepositoryError::ForeignKeyViolation(msg) => ApiError::ConsistencyError(msg),
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::StorageError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// PlanWarning - 操作附带的非阻断性告警
// ==========================================
// 软违规 (先修告警/学分负荷) 随成功结果返回, 不中断操作
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWarning {
    pub warning_type: String,
    pub message: String,
}

impl PlanWarning {
    pub fn new(warning_type: &str, message: String) -> Self {
        Self {
            warning_type: warning_type.to_string(),
            message,
        }
    }
}
