// ==========================================
// 分销商佣金计算系统 - 计算/存储参数
// ==========================================
// 职责: 聚合批次、时间预算、分块大小等运行参数
// 来源: 默认值 + config_kv 覆写 (见 ConfigManager)
// ==========================================

use crate::config::calculation_config_trait::CalculationConfigReader;
use std::error::Error;
use std::time::Duration;

// ===== 默认值 =====
pub const DEFAULT_MAX_RECORDS: usize = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 1_000;
pub const DEFAULT_TIME_BUDGET_MS: u64 = 40_000;
pub const DEFAULT_YIELD_EVERY_BATCHES: usize = 10;
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_WRITE_DELAY_MS: u64 = 50;

/// 单个分块记录数上限
pub const MAX_CHUNK_SIZE: usize = 10_000;

// ==========================================
// AggregationConfig - 聚合参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    /// 单次计算处理的最大记录数(超出部分截断)
    pub max_records: usize,
    /// 每批记录数
    pub batch_size: usize,
    /// 墙钟时间预算,仅在批次边界检查
    pub time_budget: Duration,
    /// 每隔多少批主动让出执行权
    pub yield_every_batches: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            batch_size: DEFAULT_BATCH_SIZE,
            time_budget: Duration::from_millis(DEFAULT_TIME_BUDGET_MS),
            yield_every_batches: DEFAULT_YIELD_EVERY_BATCHES,
        }
    }
}

// ==========================================
// StoreConfig - 分块存储参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub chunk_size: usize,
    /// 相邻两次分块写入之间的间隔
    pub chunk_write_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_write_delay: Duration::from_millis(DEFAULT_CHUNK_WRITE_DELAY_MS),
        }
    }
}

// ==========================================
// CalculationConfig - 全量运行参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationConfig {
    pub aggregation: AggregationConfig,
    pub store: StoreConfig,
}

impl CalculationConfig {
    /// 从配置读取器加载(缺失项使用默认值)
    pub async fn load<R>(reader: &R) -> Result<Self, Box<dyn Error + Send + Sync>>
    where
        R: CalculationConfigReader + ?Sized,
    {
        let config = Self {
            aggregation: AggregationConfig {
                max_records: reader.get_max_records().await?,
                batch_size: reader.get_batch_size().await?,
                time_budget: Duration::from_millis(reader.get_time_budget_ms().await?),
                yield_every_batches: reader.get_yield_every_batches().await?,
            },
            store: StoreConfig {
                chunk_size: reader.get_chunk_size().await?,
                chunk_write_delay: Duration::from_millis(reader.get_chunk_write_delay_ms().await?),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// 参数合法性校验
    pub fn validate(&self) -> Result<(), String> {
        if self.aggregation.max_records == 0 {
            return Err("max_records 必须大于 0".to_string());
        }
        if self.aggregation.batch_size == 0 {
            return Err("batch_size 必须大于 0".to_string());
        }
        if self.store.chunk_size == 0 {
            return Err("chunk_size 必须大于 0".to_string());
        }
        if self.store.chunk_size > MAX_CHUNK_SIZE {
            return Err(format!(
                "chunk_size 不能超过 {} (当前 {})",
                MAX_CHUNK_SIZE, self.store.chunk_size
            ));
        }
        Ok(())
    }
}
