// ==========================================
// 分销商佣金计算系统 - 计算引擎错误类型
// ==========================================
// 说明:
// - 输入错误 → 立即返回,不做部分计算
// - 超时 → 不是错误,体现在 ProcessingReport 中
// - 查询未命中 → 记录级吸收(归零/不匹配 + 日志),不会出现在这里
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("输入错误: {0}")]
    Input(#[from] ImportError),
}

/// Result 类型别名
pub type CalcResult<T> = Result<T, CalculationError>;
