// ==========================================
// 分销商佣金计算系统 - 销售聚合引擎
// ==========================================
// 职责: 准入过滤 + 按 (distributor_id, article_id) 分组累计
// 约束:
// - 输入先截断到 max_records
// - 按固定批次顺序处理,批次边界检查时间预算(批次内不中断)
// - 每 yield_every_batches 批让出一次执行权
// - 时间预算耗尽 → 返回已聚合部分(不是错误)
// ==========================================

use crate::config::AggregationConfig;
use crate::domain::calculation::{DistributorArticleGroup, GroupKey};
use crate::domain::sales::{CategoryLookup, DistributorLookup, SalesRecord};
use crate::domain::scheme::Scheme;
use crate::engine::criteria::CriteriaMatcher;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

// ==========================================
// AggregationOutcome - 聚合结果 + 处理进度
// ==========================================
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    /// 按键排序的分组
    pub groups: BTreeMap<GroupKey, DistributorArticleGroup>,
    /// 调用方传入的记录数
    pub original_count: usize,
    /// 截断后参与处理的记录数
    pub capped_count: usize,
    /// 实际处理的记录数(超时时小于 capped_count)
    pub processed_count: usize,
    pub eligible_count: usize,
    pub rejected_count: usize,
    pub batches_processed: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl AggregationOutcome {
    /// 已处理 / 原始输入
    pub fn processed_ratio(&self) -> f64 {
        if self.original_count == 0 {
            1.0
        } else {
            self.processed_count as f64 / self.original_count as f64
        }
    }

    /// 输入是否被截断
    pub fn truncated(&self) -> bool {
        self.capped_count < self.original_count
    }

    /// 全部输入均已处理(未截断、未超时)
    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.processed_count == self.original_count
    }
}

// ==========================================
// SalesAggregator
// ==========================================
pub struct SalesAggregator {
    config: AggregationConfig,
}

impl SalesAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// 聚合销售记录
    ///
    /// # 参数
    /// - sales: 销售记录(保持输入顺序)
    /// - scheme: 方案
    /// - categories: 物料类目查询
    /// - distributors: 分销商查询(按 id 直接查找,无模糊匹配)
    #[instrument(skip_all, fields(scheme_id = %scheme.scheme_id, input = sales.len()))]
    pub async fn aggregate(
        &self,
        sales: &[SalesRecord],
        scheme: &Scheme,
        categories: &dyn CategoryLookup,
        distributors: &dyn DistributorLookup,
    ) -> AggregationOutcome {
        let started = Instant::now();
        let original_count = sales.len();
        let capped = &sales[..original_count.min(self.config.max_records)];
        if capped.len() < original_count {
            tracing::warn!(
                original_count,
                max_records = self.config.max_records,
                "销售记录超过单次上限,已截断"
            );
        }

        let mut outcome = AggregationOutcome {
            groups: BTreeMap::new(),
            original_count,
            capped_count: capped.len(),
            processed_count: 0,
            eligible_count: 0,
            rejected_count: 0,
            batches_processed: 0,
            timed_out: false,
            elapsed: Duration::ZERO,
        };

        for (batch_index, batch) in capped.chunks(self.config.batch_size.max(1)).enumerate() {
            if started.elapsed() >= self.config.time_budget {
                outcome.timed_out = true;
                tracing::warn!(
                    processed = outcome.processed_count,
                    total = outcome.capped_count,
                    budget_ms = self.config.time_budget.as_millis() as u64,
                    "聚合时间预算耗尽,返回部分结果"
                );
                break;
            }

            for sale in batch {
                self.accumulate(&mut outcome, sale, scheme, categories, distributors);
            }
            outcome.processed_count += batch.len();
            outcome.batches_processed += 1;

            tracing::debug!(
                batch = batch_index,
                processed = outcome.processed_count,
                groups = outcome.groups.len(),
                "批次完成"
            );

            if self.config.yield_every_batches > 0
                && (batch_index + 1) % self.config.yield_every_batches == 0
            {
                tokio::task::yield_now().await;
            }
        }

        outcome.elapsed = started.elapsed();
        tracing::info!(
            processed = outcome.processed_count,
            eligible = outcome.eligible_count,
            rejected = outcome.rejected_count,
            groups = outcome.groups.len(),
            ratio = outcome.processed_ratio(),
            "聚合完成"
        );
        outcome
    }

    fn accumulate(
        &self,
        outcome: &mut AggregationOutcome,
        sale: &SalesRecord,
        scheme: &Scheme,
        categories: &dyn CategoryLookup,
        distributors: &dyn DistributorLookup,
    ) {
        let distributor = distributors.find_distributor(&sale.distributor_id);

        if let Err(reason) = CriteriaMatcher::evaluate(sale, scheme, categories, distributor) {
            outcome.rejected_count += 1;
            tracing::trace!(
                distributor_id = %sale.distributor_id,
                article_id = %sale.article_id,
                %reason,
                "记录未通过准入"
            );
            return;
        }

        outcome.eligible_count += 1;
        outcome
            .groups
            .entry(GroupKey::new(&sale.distributor_id, &sale.article_id))
            .or_insert_with(|| DistributorArticleGroup::new(&sale.distributor_id, &sale.article_id))
            .push(sale.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::{CategoryInfo, DistributorInfo};
    use crate::domain::scheme::{
        ArticleSelection, DistributorCriteria, DistributorSelection, SchemeRule, Slab,
    };
    use crate::domain::types::{CommissionType, SlabType};
    use std::collections::HashMap;

    fn sale(d: &str, a: &str, qty: f64) -> SalesRecord {
        SalesRecord {
            distributor_id: d.to_string(),
            article_id: a.to_string(),
            billing_quantity: qty,
            net_sales: qty * 10.0,
            billing_document: format!("DOC-{}-{}-{}", d, a, qty),
            billing_date: None,
        }
    }

    fn scheme(distributors: DistributorSelection) -> Scheme {
        Scheme {
            scheme_id: "S1".to_string(),
            scheme_name: "booster".to_string(),
            commission_type: CommissionType::AbsolutePerUnit,
            distributors,
            articles: ArticleSelection::All,
            rule: SchemeRule::Booster {
                slab_type: SlabType::Quantity,
                slabs: vec![Slab { min: 0.0, max: None, rate: 1.0 }],
            },
        }
    }

    fn lookups() -> (HashMap<String, CategoryInfo>, HashMap<String, DistributorInfo>) {
        let mut distributors = HashMap::new();
        distributors.insert(
            "D1".to_string(),
            DistributorInfo {
                distributor_id: "D1".to_string(),
                zone: Some("NORTH".to_string()),
                ..Default::default()
            },
        );
        distributors.insert(
            "D2".to_string(),
            DistributorInfo {
                distributor_id: "D2".to_string(),
                zone: Some("SOUTH".to_string()),
                ..Default::default()
            },
        );
        (HashMap::new(), distributors)
    }

    #[tokio::test]
    async fn test_groups_by_distributor_and_article_preserving_order() {
        let (cats, dists) = lookups();
        let sales = vec![
            sale("D1", "A1", 5.0),
            sale("D1", "A2", 1.0),
            sale("D1", "A1", 3.0),
            sale("D2", "A1", 2.0),
        ];

        let outcome = SalesAggregator::new(AggregationConfig::default())
            .aggregate(&sales, &scheme(DistributorSelection::default()), &cats, &dists)
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.groups.len(), 3);
        let g = &outcome.groups[&GroupKey::new("D1", "A1")];
        assert_eq!(g.total_quantity, 8.0);
        assert_eq!(g.total_value, 80.0);
        assert_eq!(g.sales()[0].billing_quantity, 5.0);
        assert_eq!(g.sales()[1].billing_quantity, 3.0);
    }

    #[tokio::test]
    async fn test_ineligible_records_are_counted_not_grouped() {
        let (cats, dists) = lookups();
        let s = scheme(DistributorSelection::MatchingCriteria(DistributorCriteria {
            zone: Some("NORTH".to_string()),
            ..Default::default()
        }));
        let sales = vec![sale("D1", "A1", 1.0), sale("D2", "A1", 1.0), sale("D9", "A1", 1.0)];

        let outcome = SalesAggregator::new(AggregationConfig::default())
            .aggregate(&sales, &s, &cats, &dists)
            .await;

        assert_eq!(outcome.eligible_count, 1);
        assert_eq!(outcome.rejected_count, 2);
        assert_eq!(outcome.processed_count, 3);
        assert_eq!(outcome.groups.len(), 1);
    }

    #[tokio::test]
    async fn test_input_capped_to_max_records() {
        let (cats, dists) = lookups();
        let sales: Vec<_> = (0..25).map(|i| sale("D1", "A1", i as f64)).collect();
        let config = AggregationConfig {
            max_records: 10,
            batch_size: 3,
            ..Default::default()
        };

        let outcome = SalesAggregator::new(config)
            .aggregate(&sales, &scheme(DistributorSelection::default()), &cats, &dists)
            .await;

        assert_eq!(outcome.original_count, 25);
        assert_eq!(outcome.capped_count, 10);
        assert_eq!(outcome.processed_count, 10);
        assert_eq!(outcome.batches_processed, 4);
        assert!(outcome.truncated());
        assert!(!outcome.timed_out);
        assert!(!outcome.is_complete());
        assert!((outcome.processed_ratio() - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_partial_result() {
        let (cats, dists) = lookups();
        let sales: Vec<_> = (0..50).map(|i| sale("D1", "A1", i as f64)).collect();
        let config = AggregationConfig {
            batch_size: 10,
            time_budget: Duration::ZERO,
            ..Default::default()
        };

        let outcome = SalesAggregator::new(config)
            .aggregate(&sales, &scheme(DistributorSelection::default()), &cats, &dists)
            .await;

        assert!(outcome.timed_out);
        assert!(outcome.processed_count <= outcome.original_count);
        assert!(outcome.processed_ratio() < 1.0);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_empty_input_is_complete() {
        let (cats, dists) = lookups();
        let outcome = SalesAggregator::new(AggregationConfig::default())
            .aggregate(&[], &scheme(DistributorSelection::default()), &cats, &dists)
            .await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.processed_ratio(), 1.0);
    }
}
