// ==========================================
// 分销商佣金计算系统 - 导入归一化错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 所有输入错误在计算开始前立即暴露,不做部分尝试
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 结构错误 =====
    #[error("记录不是 JSON 对象 ({context})")]
    NotAnObject { context: String },

    #[error("必填字段缺失 ({context}): {field}")]
    MissingField { context: String, field: String },

    #[error("类型转换失败 ({context}, 字段 {field}): {message}")]
    TypeConversionError {
        context: String,
        field: String,
        message: String,
    },

    #[error("未知的枚举取值 (字段 {field}): {value}")]
    UnknownVariant { field: String, value: String },

    // ===== 业务输入错误 =====
    #[error("销售数据为空")]
    EmptySales,

    #[error("方案配置无效 (scheme_id={scheme_id}): {message}")]
    InvalidScheme { scheme_id: String, message: String },
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
