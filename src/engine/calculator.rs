// ==========================================
// 分销商佣金计算系统 - 佣金计算流水线
// ==========================================
// 流程: 输入校验 → 聚合 → 逐组解析费率 → 分配到销售记录 → 汇总
// 红线: 不直接写库,持久化由 ChunkedResultStore 负责
// ==========================================

use crate::config::AggregationConfig;
use crate::domain::calculation::{CalculationResult, CalculationSummary};
use crate::domain::sales::{CategoryLookup, DistributorLookup, SalesRecord};
use crate::domain::scheme::Scheme;
use crate::engine::aggregator::{AggregationOutcome, SalesAggregator};
use crate::engine::allocator::CommissionAllocator;
use crate::engine::error::{CalculationError, CalcResult};
use crate::engine::resolver::CommissionResolver;
use crate::importer::error::ImportError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// ProcessingReport - 处理进度(供调用方判断是否重试)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub original_count: usize,
    pub capped_count: usize,
    pub processed_count: usize,
    pub eligible_count: usize,
    pub group_count: usize,
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

impl ProcessingReport {
    fn from_outcome(outcome: &AggregationOutcome) -> Self {
        Self {
            original_count: outcome.original_count,
            capped_count: outcome.capped_count,
            processed_count: outcome.processed_count,
            eligible_count: outcome.eligible_count,
            group_count: outcome.groups.len(),
            timed_out: outcome.timed_out,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }

    pub fn processed_ratio(&self) -> f64 {
        if self.original_count == 0 {
            1.0
        } else {
            self.processed_count as f64 / self.original_count as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.processed_count == self.original_count
    }
}

// ==========================================
// CalculationOutcome - 一次计算的完整输出
// ==========================================
#[derive(Debug, Clone)]
pub struct CalculationOutcome {
    pub scheme_id: String,
    pub scheme_name: String,
    pub results: Vec<CalculationResult>,
    pub summary: CalculationSummary,
    pub report: ProcessingReport,
}

// ==========================================
// CommissionCalculator
// ==========================================
pub struct CommissionCalculator {
    aggregator: SalesAggregator,
}

impl CommissionCalculator {
    pub fn new(config: AggregationConfig) -> Self {
        Self {
            aggregator: SalesAggregator::new(config),
        }
    }

    /// 执行一次佣金计算
    ///
    /// # 返回
    /// - Ok(CalculationOutcome): 每条合格销售记录一条结果(超时则为部分结果)
    /// - Err(Input): 销售数据为空等输入错误
    #[instrument(skip_all, fields(scheme_id = %scheme.scheme_id))]
    pub async fn calculate(
        &self,
        scheme: &Scheme,
        sales: &[SalesRecord],
        categories: &dyn CategoryLookup,
        distributors: &dyn DistributorLookup,
    ) -> CalcResult<CalculationOutcome> {
        if sales.is_empty() {
            return Err(CalculationError::Input(ImportError::EmptySales));
        }

        let outcome = self
            .aggregator
            .aggregate(sales, scheme, categories, distributors)
            .await;
        let report = ProcessingReport::from_outcome(&outcome);

        let mut results = Vec::with_capacity(outcome.eligible_count);
        for group in outcome.groups.values() {
            let resolved = CommissionResolver::resolve(group, scheme);
            results.extend(CommissionAllocator::allocate(group, &resolved, scheme));
        }

        let summary = CalculationSummary::from_results(&results);
        tracing::info!(
            records = results.len(),
            total_commission = summary.total_commission,
            complete = report.is_complete(),
            "佣金计算完成"
        );

        Ok(CalculationOutcome {
            scheme_id: scheme.scheme_id.clone(),
            scheme_name: scheme.scheme_name.clone(),
            results,
            summary,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::{CategoryInfo, DistributorInfo};
    use crate::domain::scheme::{ArticleSelection, DistributorSelection, SchemeRule, Slab};
    use crate::domain::types::{CommissionType, RateSource, SlabType};
    use std::collections::HashMap;

    fn no_categories() -> HashMap<String, CategoryInfo> {
        HashMap::new()
    }

    fn no_distributors() -> HashMap<String, DistributorInfo> {
        HashMap::new()
    }

    fn sale(d: &str, a: &str, qty: f64, value: f64) -> SalesRecord {
        SalesRecord {
            distributor_id: d.to_string(),
            article_id: a.to_string(),
            billing_quantity: qty,
            net_sales: value,
            billing_document: format!("INV-{}-{}", a, qty),
            billing_date: None,
        }
    }

    fn scheme(commission_type: CommissionType, rule: SchemeRule) -> Scheme {
        Scheme {
            scheme_id: "S1".to_string(),
            scheme_name: "Scheme One".to_string(),
            commission_type,
            distributors: DistributorSelection::default(),
            articles: ArticleSelection::All,
            rule,
        }
    }

    #[tokio::test]
    async fn test_empty_sales_is_input_error() {
        let calc = CommissionCalculator::new(AggregationConfig::default());
        let s = scheme(
            CommissionType::Fixed,
            SchemeRule::ArticleTable {
                article_commissions: HashMap::new(),
            },
        );
        let err = calc
            .calculate(&s, &[], &no_categories(), &no_distributors())
            .await
            .unwrap_err();
        assert!(matches!(err, CalculationError::Input(ImportError::EmptySales)));
    }

    #[tokio::test]
    async fn test_fixed_article_table_scenario() {
        let calc = CommissionCalculator::new(AggregationConfig::default());
        let s = scheme(
            CommissionType::Fixed,
            SchemeRule::ArticleTable {
                article_commissions: HashMap::from([("A1".to_string(), 100.0)]),
            },
        );
        let sales = vec![sale("D1", "A1", 5.0, 50.0), sale("D1", "A1", 3.0, 30.0)];

        let outcome = calc
            .calculate(&s, &sales, &no_categories(), &no_distributors())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].group_total_quantity, 8.0);
        assert_eq!(outcome.results[0].commission, 100.0);
        assert_eq!(outcome.results[1].commission, 0.0);
        assert_eq!(outcome.summary.total_commission, 100.0);
        assert!(outcome.report.is_complete());
    }

    #[tokio::test]
    async fn test_mixed_groups_and_missing_article_rate() {
        let calc = CommissionCalculator::new(AggregationConfig::default());
        let s = scheme(
            CommissionType::AbsolutePerUnit,
            SchemeRule::ArticleTable {
                article_commissions: HashMap::from([("A1".to_string(), 2.0)]),
            },
        );
        let sales = vec![
            sale("D1", "A1", 4.0, 40.0),
            sale("D1", "A9", 4.0, 40.0),
            sale("D2", "A1", 1.0, 10.0),
        ];

        let outcome = calc
            .calculate(&s, &sales, &no_categories(), &no_distributors())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 3);
        let missing = outcome.results.iter().find(|r| r.article_id == "A9").unwrap();
        assert_eq!(missing.commission, 0.0);
        assert_eq!(missing.rate_source, RateSource::ArticleRateMissing);
        assert!((outcome.summary.total_commission - 10.0).abs() < 1e-9);
        assert_eq!(outcome.summary.unique_distributors, 2);
    }

    #[tokio::test]
    async fn test_booster_allocation_sums_to_group_commission() {
        let calc = CommissionCalculator::new(AggregationConfig::default());
        let s = scheme(
            CommissionType::Percentage,
            SchemeRule::Booster {
                slab_type: SlabType::Value,
                slabs: vec![
                    Slab { min: 0.0, max: Some(999.99), rate: 1.0 },
                    Slab { min: 1000.0, max: None, rate: 3.0 },
                ],
            },
        );
        let sales = vec![
            sale("D1", "A1", 7.0, 700.0),
            sale("D1", "A1", 2.0, 200.0),
            sale("D1", "A1", 4.0, 400.0),
        ];

        let outcome = calc
            .calculate(&s, &sales, &no_categories(), &no_distributors())
            .await
            .unwrap();

        let group_commission = outcome.results[0].group_commission;
        assert!((group_commission - 39.0).abs() < 1e-9);
        let allocated: f64 = outcome.results.iter().map(|r| r.commission).sum();
        assert!((allocated - group_commission).abs() < 1e-9);
    }
}
