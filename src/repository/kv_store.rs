// ==========================================
// 分销商佣金计算系统 - 键值存储 Trait
// ==========================================
// 职责: 按 owner 命名空间隔离的键值读写接口(值为不透明 JSON)
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde_json::Value;

/// 历史全局命名空间(仅迁移时读取)
pub const GLOBAL_NAMESPACE: &str = "__global__";

// ==========================================
// KeyValueStore Trait
// ==========================================
// 实现者: SqliteKeyValueStore / MemoryKeyValueStore
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取
    ///
    /// # 返回
    /// - Ok(None): 键不存在
    async fn get(&self, namespace: &str, key: &str) -> RepositoryResult<Option<Value>>;

    /// 写入(覆盖)
    async fn set(&self, namespace: &str, key: &str, value: Value) -> RepositoryResult<()>;

    /// 删除
    ///
    /// # 返回
    /// - Ok(true): 键存在并已删除
    /// - Ok(false): 键不存在
    async fn delete(&self, namespace: &str, key: &str) -> RepositoryResult<bool>;

    /// 列出命名空间内以 prefix 开头的键(按键排序)
    async fn list_keys(&self, namespace: &str, prefix: &str) -> RepositoryResult<Vec<String>>;
}
