// ==========================================
// 分销商佣金计算系统 - 内存键值存储
// ==========================================
// 用途: 嵌入式调用 / 测试
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::kv_store::KeyValueStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<(String, String), Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 条目总数(全部命名空间)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, namespace: &str, key: &str) -> RepositoryResult<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> RepositoryResult<()> {
        self.entries
            .write()
            .await
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> RepositoryResult<bool> {
        Ok(self
            .entries
            .write()
            .await
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    async fn list_keys(&self, namespace: &str, prefix: &str) -> RepositoryResult<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|(ns, key)| ns == namespace && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }
}
