// ==========================================
// 分销商佣金计算系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 写入失败必须带上 calculation_id / 已写块数,供调用方决定是否重试
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 分块存储错误 =====
    #[error(
        "计算结果写入失败: calculation_id={calculation_id}, stage={stage}, \
         written_chunks={written_chunks}/{total_chunks}: {message}"
    )]
    StorageFailure {
        calculation_id: String,
        stage: String,
        written_chunks: usize,
        total_chunks: usize,
        message: String,
    },

    #[error("存储条目损坏 (namespace={namespace}, key={key}): {message}")]
    CorruptEntry {
        namespace: String,
        key: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("序列化失败: {0}")]
    SerializationError(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
