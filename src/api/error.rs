// ==========================================
// 分销商佣金计算系统 - API层错误类型
// ==========================================
// 职责: 将导入/计算/仓储错误转换为调用方可读的错误消息
// 说明: 存储失败保留 calculation_id 与已写块数,调用方据此决定是否重试
// ==========================================

use crate::engine::error::CalculationError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 存储错误
    // ==========================================
    #[error(
        "计算结果存储失败: calculation_id={calculation_id}, stage={stage}, \
         written_chunks={written_chunks}/{total_chunks}: {message}"
    )]
    StorageFailure {
        calculation_id: String,
        stage: String,
        written_chunks: usize,
        total_chunks: usize,
        message: String,
    },

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StorageFailure {
                calculation_id,
                stage,
                written_chunks,
                total_chunks,
                message,
            } => ApiError::StorageFailure {
                calculation_id,
                stage,
                written_chunks,
                total_chunks,
                message,
            },
            RepositoryError::CorruptEntry {
                namespace,
                key,
                message,
            } => ApiError::DatabaseError(format!(
                "存储条目损坏(namespace={}, key={}): {}",
                namespace, key, message
            )),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::SerializationError(msg) => {
                ApiError::InternalError(format!("序列化失败: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::EmptySales => ApiError::InvalidInput(err.to_string()),
            other => ApiError::ValidationError(other.to_string()),
        }
    }
}

// ==========================================
// 从 CalculationError 转换
// ==========================================
impl From<CalculationError> for ApiError {
    fn from(err: CalculationError) -> Self {
        match err {
            CalculationError::Input(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_keeps_progress() {
        let err: ApiError = RepositoryError::StorageFailure {
            calculation_id: "c1".to_string(),
            stage: "chunk".to_string(),
            written_chunks: 2,
            total_chunks: 5,
            message: "disk full".to_string(),
        }
        .into();

        match err {
            ApiError::StorageFailure {
                calculation_id,
                written_chunks,
                ..
            } => {
                assert_eq!(calculation_id, "c1");
                assert_eq!(written_chunks, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_sales_is_invalid_input() {
        let err: ApiError = CalculationError::Input(ImportError::EmptySales).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
