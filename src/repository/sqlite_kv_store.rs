// ==========================================
// 分销商佣金计算系统 - SQLite 键值存储
// ==========================================
// 存储: kv_entry 表 (namespace, key) → value_json
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::KeyValueStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// 打开数据库文件并初始化 schema
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建(与 ConfigManager 共享连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, namespace: &str, key: &str) -> RepositoryResult<Option<Value>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value_json FROM kv_entry WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| RepositoryError::CorruptEntry {
                    namespace: namespace.to_string(),
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> RepositoryResult<()> {
        let raw = serde_json::to_string(&value)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO kv_entry (namespace, key, value_json, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(namespace, key) DO UPDATE
              SET value_json = excluded.value_json, updated_at = excluded.updated_at
            "#,
            params![namespace, key, raw],
        )?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM kv_entry WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(affected > 0)
    }

    async fn list_keys(&self, namespace: &str, prefix: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        // substr 比较避免 LIKE 通配符转义问题
        let mut stmt = conn.prepare(
            r#"
            SELECT key FROM kv_entry
            WHERE namespace = ?1 AND substr(key, 1, length(?2)) = ?2
            ORDER BY key
            "#,
        )?;
        let rows = stmt.query_map(params![namespace, prefix], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteKeyValueStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteKeyValueStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_set_get_overwrite_delete() {
        let kv = store();
        assert_eq!(kv.get("owner-1", "k").await.unwrap(), None);

        kv.set("owner-1", "k", json!({"v": 1})).await.unwrap();
        kv.set("owner-1", "k", json!({"v": 2})).await.unwrap();
        assert_eq!(kv.get("owner-1", "k").await.unwrap(), Some(json!({"v": 2})));

        assert!(kv.delete("owner-1", "k").await.unwrap());
        assert!(!kv.delete("owner-1", "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let kv = store();
        kv.set("owner-1", "latest", json!("a")).await.unwrap();
        kv.set("owner-2", "latest", json!("b")).await.unwrap();

        assert_eq!(kv.get("owner-1", "latest").await.unwrap(), Some(json!("a")));
        assert_eq!(kv.get("owner-2", "latest").await.unwrap(), Some(json!("b")));
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let kv = store();
        kv.set("o", "calculation/c1/meta", json!(1)).await.unwrap();
        kv.set("o", "calculation/c1/chunk/0", json!(2)).await.unwrap();
        kv.set("o", "calculation/c2/meta", json!(3)).await.unwrap();
        kv.set("o", "calc_%", json!(4)).await.unwrap();

        let keys = kv.list_keys("o", "calculation/c1/").await.unwrap();
        assert_eq!(keys, vec!["calculation/c1/chunk/0", "calculation/c1/meta"]);
        assert_eq!(kv.list_keys("o", "").await.unwrap().len(), 4);
    }
}
