// ==========================================
// 分销商佣金计算系统 - 引擎层
// ==========================================
// 职责: 准入匹配、聚合、费率解析、佣金分配
// 红线: Engine 不拼 SQL, 不直接访问存储
// ==========================================

pub mod aggregator;
pub mod allocator;
pub mod calculator;
pub mod commission_core;
pub mod criteria;
pub mod error;
pub mod resolver;

// 重导出核心引擎
pub use aggregator::{AggregationOutcome, SalesAggregator};
pub use allocator::{AllocationMode, CommissionAllocator};
pub use calculator::{CalculationOutcome, CommissionCalculator, ProcessingReport};
pub use commission_core::CommissionCore;
pub use criteria::{CriteriaMatcher, RejectReason};
pub use error::{CalcResult, CalculationError};
pub use resolver::{CommissionResolver, ResolvedCommission};
