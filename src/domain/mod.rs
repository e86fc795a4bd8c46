// ==========================================
// 分销商佣金计算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod calculation;
pub mod sales;
pub mod scheme;
pub mod types;

// 重导出核心类型
pub use calculation::{
    CalculationMetadata, CalculationResult, CalculationSummary, DistributorArticleGroup,
    GroupKey, LatestPointer, ResultChunk, RetrievedCalculation,
};
pub use sales::{
    index_categories, index_distributors, CategoryInfo, CategoryLookup, DistributorInfo,
    DistributorLookup, SalesRecord,
};
pub use scheme::{
    ArticleHierarchyFilter, ArticleSelection, DistributorCriteria, DistributorSelection, Scheme,
    SchemeRule, Slab,
};
pub use types::{CommissionType, RateSource, SchemeType, SlabType};
