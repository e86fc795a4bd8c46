// ==========================================
// 分销商佣金计算系统 - 计算过程与结果实体
// ==========================================
// 职责: 分组(一次计算内临时存在)、逐条计算结果、元数据、分块、最新指针
// ==========================================

use crate::domain::sales::SalesRecord;
use crate::domain::types::RateSource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// 分组键 (distributor_id, article_id)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub distributor_id: String,
    pub article_id: String,
}

impl GroupKey {
    pub fn new(distributor_id: &str, article_id: &str) -> Self {
        Self {
            distributor_id: distributor_id.to_string(),
            article_id: article_id.to_string(),
        }
    }
}

// ==========================================
// DistributorArticleGroup - 分销商×物料 聚合分组
// ==========================================
// 不变量: total_quantity / total_value 恒等于成员字段之和
// 成员顺序 = 输入顺序(分配环节依赖)
#[derive(Debug, Clone, PartialEq)]
pub struct DistributorArticleGroup {
    pub distributor_id: String,
    pub article_id: String,
    pub total_quantity: f64,
    pub total_value: f64,
    sales: Vec<SalesRecord>,
}

impl DistributorArticleGroup {
    pub fn new(distributor_id: &str, article_id: &str) -> Self {
        Self {
            distributor_id: distributor_id.to_string(),
            article_id: article_id.to_string(),
            total_quantity: 0.0,
            total_value: 0.0,
            sales: Vec::new(),
        }
    }

    /// 追加成员并同步累计值
    pub fn push(&mut self, sale: SalesRecord) {
        self.total_quantity += sale.billing_quantity;
        self.total_value += sale.net_sales;
        self.sales.push(sale);
    }

    pub fn sales(&self) -> &[SalesRecord] {
        &self.sales
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }
}

// ==========================================
// CalculationResult - 单条销售记录的佣金结果
// ==========================================
// 同时携带所属分组的汇总值,便于下游审计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub distributor_id: String,
    pub article_id: String,
    pub billing_document: String,
    pub billing_date: Option<NaiveDate>,
    pub billing_quantity: f64,
    pub net_sales: f64,
    pub commission: f64,

    // 分组审计字段
    pub group_total_quantity: f64,
    pub group_total_value: f64,
    pub rate: f64,
    pub rate_source: RateSource,
    pub group_commission: f64,
}

// ==========================================
// CalculationSummary - 计算汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_commission: f64,
    pub total_quantity: f64,
    pub total_value: f64,
    pub unique_distributors: usize,
    pub unique_articles: usize,
    pub total_groups: usize,
    pub total_records: usize,
}

impl CalculationSummary {
    pub fn from_results(results: &[CalculationResult]) -> Self {
        let mut distributors = HashSet::new();
        let mut articles = HashSet::new();
        let mut groups = HashSet::new();
        let mut summary = CalculationSummary {
            total_records: results.len(),
            ..Default::default()
        };

        for r in results {
            summary.total_commission += r.commission;
            summary.total_quantity += r.billing_quantity;
            summary.total_value += r.net_sales;
            distributors.insert(r.distributor_id.as_str());
            articles.insert(r.article_id.as_str());
            groups.insert((r.distributor_id.as_str(), r.article_id.as_str()));
        }

        summary.unique_distributors = distributors.len();
        summary.unique_articles = articles.len();
        summary.total_groups = groups.len();
        summary
    }
}

// ==========================================
// CalculationMetadata - 分块存储的元数据(先于分块写入)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationMetadata {
    pub calculation_id: String,
    pub scheme_id: String,
    pub scheme_name: String,
    pub owner_key: String,
    pub total_records: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub summary: CalculationSummary,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ResultChunk - 结果分块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultChunk {
    pub calculation_id: String,
    pub chunk_index: usize,
    pub records: Vec<CalculationResult>,
}

// ==========================================
// LatestPointer - 每个 owner 一条,指向最近一次发布的计算
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub owner_key: String,
    pub calculation_id: String,
    pub published_at: DateTime<Utc>,
}

// ==========================================
// RetrievedCalculation - 读取结果(可能缺块)
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedCalculation {
    pub metadata: CalculationMetadata,
    pub results: Vec<CalculationResult>,
    /// 读取时缺失的分块序号(已跳过)
    pub missing_chunks: Vec<usize>,
}

impl RetrievedCalculation {
    pub fn is_complete(&self) -> bool {
        self.missing_chunks.is_empty() && self.results.len() == self.metadata.total_records
    }
}
