// ==========================================
// 分销商佣金计算系统 - 佣金计算 API
// ==========================================
// 职责: 计算 → 持久化 → 发布;按 owner 读取最新/指定计算
// 流程:
//   calculate_from_raw: JSON 归一化 → calculate
//   calculate: 计算流水线 → ChunkedResultStore::store
// 红线: owner_key 必填,计算结果按 owner 隔离
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{CalculationConfig, CalculationConfigReader};
use crate::domain::calculation::{CalculationResult, CalculationSummary, RetrievedCalculation};
use crate::domain::sales::{
    index_categories, index_distributors, CategoryInfo, DistributorInfo, SalesRecord,
};
use crate::domain::scheme::Scheme;
use crate::engine::calculator::{CommissionCalculator, ProcessingReport};
use crate::importer::{normalize_categories, normalize_distributors, normalize_sales, normalize_scheme};
use crate::repository::calculation_store::ChunkedResultStore;
use crate::repository::kv_store::{KeyValueStore, GLOBAL_NAMESPACE};
use crate::repository::migration::{MigrationReport, NamespaceMigration};

// ==========================================
// 请求/响应 DTO
// ==========================================

/// 未归一化的计算输入(字段名可使用别名)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCalculationInput {
    pub scheme: Value,
    pub sales: Vec<Value>,
    #[serde(default)]
    pub distributors: Vec<Value>,
    #[serde(default)]
    pub categories: Vec<Value>,
}

/// 计算并发布后的回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub calculation_id: String,
    pub scheme_id: String,
    pub scheme_name: String,
    pub total_records: usize,
    pub total_chunks: usize,
    pub summary: CalculationSummary,
    pub report: ProcessingReport,
    /// 超时或截断导致只有部分销售记录参与计算
    pub partial: bool,
}

/// 读取到的计算结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationView {
    pub calculation_id: String,
    pub scheme_id: String,
    pub scheme_name: String,
    pub created_at: DateTime<Utc>,
    pub total_records: usize,
    pub results: Vec<CalculationResult>,
    pub summary: CalculationSummary,
    /// 读取时缺失的分块序号(非空表示结果不完整)
    pub missing_chunks: Vec<usize>,
}

impl From<RetrievedCalculation> for CalculationView {
    fn from(retrieved: RetrievedCalculation) -> Self {
        let meta = retrieved.metadata;
        Self {
            calculation_id: meta.calculation_id,
            scheme_id: meta.scheme_id,
            scheme_name: meta.scheme_name,
            created_at: meta.created_at,
            total_records: meta.total_records,
            results: retrieved.results,
            summary: meta.summary,
            missing_chunks: retrieved.missing_chunks,
        }
    }
}

// ==========================================
// CommissionApi
// ==========================================
pub struct CommissionApi {
    calculator: CommissionCalculator,
    store: ChunkedResultStore<dyn KeyValueStore>,
    kv: Arc<dyn KeyValueStore>,
}

impl CommissionApi {
    /// 创建 CommissionApi
    ///
    /// # 参数
    /// - kv: 键值存储(SQLite / 内存)
    /// - config: 运行参数
    pub fn new(kv: Arc<dyn KeyValueStore>, config: CalculationConfig) -> Self {
        Self {
            calculator: CommissionCalculator::new(config.aggregation),
            store: ChunkedResultStore::new(kv.clone(), config.store),
            kv,
        }
    }

    /// 从配置读取器加载运行参数后创建
    pub async fn from_config_reader<R>(kv: Arc<dyn KeyValueStore>, reader: &R) -> ApiResult<Self>
    where
        R: CalculationConfigReader + ?Sized,
    {
        let config = CalculationConfig::load(reader)
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(Self::new(kv, config))
    }

    // ==========================================
    // 计算接口
    // ==========================================

    /// 计算佣金并发布为 owner 的最新计算
    ///
    /// # 参数
    /// - owner_key: 结果归属(必填)
    /// - scheme: 已归一化的方案
    /// - sales: 销售记录
    /// - distributors / categories: 主数据(可为空)
    ///
    /// # 返回
    /// - Ok(CalculationResponse): 已发布;partial=true 表示部分结果
    /// - Err(InvalidInput): owner_key 为空或销售数据为空
    /// - Err(StorageFailure): 写入失败,未发布
    #[instrument(skip_all, fields(owner_key = %owner_key, scheme_id = %scheme.scheme_id))]
    pub async fn calculate(
        &self,
        owner_key: &str,
        scheme: &Scheme,
        sales: &[SalesRecord],
        distributors: Vec<DistributorInfo>,
        categories: Vec<CategoryInfo>,
    ) -> ApiResult<CalculationResponse> {
        let owner_key = validate_owner_key(owner_key)?;

        let distributors: HashMap<String, DistributorInfo> = index_distributors(distributors);
        let categories: HashMap<String, CategoryInfo> = index_categories(categories);

        let outcome = self
            .calculator
            .calculate(scheme, sales, &categories, &distributors)
            .await?;

        let receipt = self
            .store
            .store(owner_key, &outcome.scheme_id, &outcome.scheme_name, &outcome.results)
            .await?;

        let partial = !outcome.report.is_complete();
        if partial {
            tracing::warn!(
                calculation_id = %receipt.calculation_id,
                processed = outcome.report.processed_count,
                original = outcome.report.original_count,
                timed_out = outcome.report.timed_out,
                "发布的是部分计算结果"
            );
        }

        Ok(CalculationResponse {
            calculation_id: receipt.calculation_id,
            scheme_id: outcome.scheme_id,
            scheme_name: outcome.scheme_name,
            total_records: receipt.total_records,
            total_chunks: receipt.total_chunks,
            summary: outcome.summary,
            report: outcome.report,
            partial,
        })
    }

    /// 从未归一化 JSON 计算
    pub async fn calculate_from_raw(
        &self,
        owner_key: &str,
        input: &RawCalculationInput,
    ) -> ApiResult<CalculationResponse> {
        let scheme = normalize_scheme(&input.scheme)?;
        let sales = normalize_sales(&input.sales)?;
        let distributors = normalize_distributors(&input.distributors)?;
        let categories = normalize_categories(&input.categories)?;

        self.calculate(owner_key, &scheme, &sales, distributors, categories)
            .await
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 读取 owner 最新发布的计算
    ///
    /// # 返回
    /// - Ok(None): 尚无发布的计算
    pub async fn get_latest_calculation(&self, owner_key: &str) -> ApiResult<Option<CalculationView>> {
        let owner_key = validate_owner_key(owner_key)?;
        Ok(self
            .store
            .retrieve_latest(owner_key)
            .await?
            .map(CalculationView::from))
    }

    /// 按 calculation_id 读取
    pub async fn get_calculation(
        &self,
        owner_key: &str,
        calculation_id: &str,
    ) -> ApiResult<CalculationView> {
        let owner_key = validate_owner_key(owner_key)?;
        self.store
            .retrieve(owner_key, calculation_id)
            .await?
            .map(CalculationView::from)
            .ok_or_else(|| ApiError::NotFound(format!("计算(id={})不存在", calculation_id)))
    }

    // ==========================================
    // 维护接口
    // ==========================================

    /// 删除一次计算
    pub async fn delete_calculation(&self, owner_key: &str, calculation_id: &str) -> ApiResult<usize> {
        let owner_key = validate_owner_key(owner_key)?;
        Ok(self.store.delete_calculation(owner_key, calculation_id).await?)
    }

    /// 迁移历史全局命名空间到 owner
    pub async fn migrate_global_to_owner(
        &self,
        owner_key: &str,
        dry_run: bool,
    ) -> ApiResult<MigrationReport> {
        let owner_key = validate_owner_key(owner_key)?;
        Ok(NamespaceMigration::new(self.kv.clone())
            .migrate_global_to_owner(owner_key, dry_run)
            .await?)
    }
}

fn validate_owner_key(owner_key: &str) -> ApiResult<&str> {
    let trimmed = owner_key.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("owner_key 不能为空".to_string()));
    }
    // 历史全局命名空间只允许迁移读取
    if trimmed == GLOBAL_NAMESPACE {
        return Err(ApiError::InvalidInput(format!(
            "owner_key 不能使用保留命名空间 {}",
            GLOBAL_NAMESPACE
        )));
    }
    Ok(trimmed)
}
