// ==========================================
// 分销商佣金计算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按方案为分销商销售记录计算佣金,分块持久化并按 owner 发布
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 外部数据归一化
pub mod importer;

// 引擎层 - 匹配/聚合/费率/分配
pub mod engine;

// 数据仓储层 - 键值存储与分块结果
pub mod repository;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CommissionType, RateSource, SchemeType, SlabType};

// 领域实体
pub use domain::{
    CalculationMetadata, CalculationResult, CalculationSummary, CategoryInfo, DistributorInfo,
    SalesRecord, Scheme, SchemeRule, Slab,
};

// 引擎
pub use engine::{
    CommissionAllocator, CommissionCalculator, CommissionResolver, CriteriaMatcher,
    SalesAggregator,
};

// 仓储
pub use repository::{
    ChunkedResultStore, KeyValueStore, MemoryKeyValueStore, NamespaceMigration,
    SqliteKeyValueStore,
};

// API
pub use api::{ApiError, CommissionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "分销商佣金计算系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
