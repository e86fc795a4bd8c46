// ==========================================
// 分销商佣金计算系统 - 配置层
// ==========================================
// 职责: 运行参数管理,默认值 + 覆写
// 存储: config_kv 表
// ==========================================

pub mod calculation_config;
pub mod calculation_config_trait;
pub mod config_manager;

// 重导出核心配置
pub use calculation_config::{AggregationConfig, CalculationConfig, StoreConfig};
pub use calculation_config_trait::CalculationConfigReader;
pub use config_manager::{config_keys, ConfigManager};
