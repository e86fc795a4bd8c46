// ==========================================
// 分销商佣金计算系统 - 佣金解析引擎
// ==========================================
// 职责: 分组 → 费率 + 分组佣金
// 输入: DistributorArticleGroup + Scheme
// 输出: ResolvedCommission (含费率来源,供审计)
// 红线: 累计数量为负的分组佣金恒为 0(任何方案类型)
// ==========================================

use crate::domain::calculation::DistributorArticleGroup;
use crate::domain::scheme::{Scheme, SchemeRule};
use crate::domain::types::RateSource;
use crate::engine::commission_core::CommissionCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCommission {
    pub rate: f64,
    pub group_commission: f64,
    pub rate_source: RateSource,
}

impl ResolvedCommission {
    pub fn zero(rate_source: RateSource) -> Self {
        Self {
            rate: 0.0,
            group_commission: 0.0,
            rate_source,
        }
    }
}

// ==========================================
// CommissionResolver
// ==========================================
pub struct CommissionResolver;

impl CommissionResolver {
    /// 解析分组费率与佣金
    ///
    /// # 规则
    /// 1. total_quantity < 0 → (0, 0)
    /// 2. 物料费率表: 按 article_id 取费率,缺失记 0 并告警
    /// 3. 阶梯方案: 比较值取 |数量| 或 |金额|,首个命中阶梯,否则最高已达到阶梯
    /// 4. 按 commission_type 套用公式
    pub fn resolve(group: &DistributorArticleGroup, scheme: &Scheme) -> ResolvedCommission {
        if group.total_quantity < 0.0 {
            tracing::debug!(
                distributor_id = %group.distributor_id,
                article_id = %group.article_id,
                total_quantity = group.total_quantity,
                "累计数量为负,佣金归零"
            );
            return ResolvedCommission::zero(RateSource::NegativeQuantity);
        }

        let (rate, rate_source) = match &scheme.rule {
            SchemeRule::ArticleTable {
                article_commissions,
            } => match article_commissions.get(&group.article_id) {
                Some(rate) => (*rate, RateSource::ArticleTable),
                None => {
                    tracing::warn!(
                        scheme_id = %scheme.scheme_id,
                        article_id = %group.article_id,
                        "物料费率表未配置该物料,费率按 0 处理"
                    );
                    (0.0, RateSource::ArticleRateMissing)
                }
            },
            SchemeRule::Booster { slab_type, slabs } => {
                let value = CommissionCore::comparison_value(
                    *slab_type,
                    group.total_quantity,
                    group.total_value,
                );
                CommissionCore::resolve_slab_rate(slabs, value)
            }
        };

        let group_commission = CommissionCore::apply_commission_type(
            scheme.commission_type,
            rate,
            group.total_quantity,
            group.total_value,
        );

        ResolvedCommission {
            rate,
            group_commission,
            rate_source,
        }
    }
}
