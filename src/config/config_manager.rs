// ==========================================
// 分销商佣金计算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::calculation_config::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_WRITE_DELAY_MS, DEFAULT_MAX_RECORDS,
    DEFAULT_TIME_BUDGET_MS, DEFAULT_YIELD_EVERY_BATCHES,
};
use crate::config::calculation_config_trait::CalculationConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取 global scope 的全部配置
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取数值配置,缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// CalculationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl CalculationConfigReader for ConfigManager {
    async fn get_max_records(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_RECORDS, DEFAULT_MAX_RECORDS)
    }

    async fn get_batch_size(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::BATCH_SIZE, DEFAULT_BATCH_SIZE)
    }

    async fn get_time_budget_ms(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::TIME_BUDGET_MS, DEFAULT_TIME_BUDGET_MS)
    }

    async fn get_yield_every_batches(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::YIELD_EVERY_BATCHES, DEFAULT_YIELD_EVERY_BATCHES)
    }

    async fn get_chunk_size(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::CHUNK_SIZE, DEFAULT_CHUNK_SIZE)
    }

    async fn get_chunk_write_delay_ms(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::CHUNK_WRITE_DELAY_MS, DEFAULT_CHUNK_WRITE_DELAY_MS)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 聚合
    pub const MAX_RECORDS: &str = "calc_max_records";
    pub const BATCH_SIZE: &str = "calc_batch_size";
    pub const TIME_BUDGET_MS: &str = "calc_time_budget_ms";
    pub const YIELD_EVERY_BATCHES: &str = "calc_yield_every_batches";

    // 分块存储
    pub const CHUNK_SIZE: &str = "store_chunk_size";
    pub const CHUNK_WRITE_DELAY_MS: &str = "store_chunk_write_delay_ms";
}
