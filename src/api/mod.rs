// ==========================================
// 分销商佣金计算系统 - API 层
// ==========================================
// 职责: 对外业务接口,供命令行 / 嵌入调用方使用
// ==========================================

pub mod commission_api;
pub mod error;

// 重导出核心类型
pub use commission_api::{
    CalculationResponse, CalculationView, CommissionApi, RawCalculationInput,
};
pub use error::{ApiError, ApiResult};
