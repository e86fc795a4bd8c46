// ==========================================
// 分销商佣金计算系统 - 导入归一化层
// ==========================================
// 职责: 外部松散数据 → 严格领域类型
// 红线: 别名解析只在本层出现,不渗透到计算引擎
// 说明: 文件解析(CSV/Excel)由外部系统负责,本层只接收已解析的 JSON 记录
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod sales_normalizer;
pub mod scheme_normalizer;

// 重导出
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldReader;
pub use sales_normalizer::{
    normalize_categories, normalize_distributors, normalize_sale, normalize_sales,
};
pub use scheme_normalizer::normalize_scheme;
