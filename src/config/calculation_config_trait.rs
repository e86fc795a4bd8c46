// ==========================================
// 分销商佣金计算系统 - 计算配置读取 Trait
// ==========================================
// 职责: 定义计算/存储所需的配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// CalculationConfigReader Trait
// ==========================================
// 实现者: ConfigManager(从 config_kv 表读取)
#[async_trait]
pub trait CalculationConfigReader: Send + Sync {
    // ===== 聚合 =====

    /// 单次计算最大记录数
    ///
    /// # 默认值
    /// - 10000
    async fn get_max_records(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 每批记录数
    ///
    /// # 默认值
    /// - 1000
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 聚合时间预算(毫秒)
    ///
    /// # 默认值
    /// - 40000
    async fn get_time_budget_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 让出执行权的批次间隔
    ///
    /// # 默认值
    /// - 10
    async fn get_yield_every_batches(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    // ===== 分块存储 =====

    /// 每块记录数
    ///
    /// # 默认值
    /// - 500
    async fn get_chunk_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 分块写入间隔(毫秒)
    ///
    /// # 默认值
    /// - 50
    async fn get_chunk_write_delay_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;
}
