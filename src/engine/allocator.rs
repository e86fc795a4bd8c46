// ==========================================
// 分销商佣金计算系统 - 佣金分配引擎
// ==========================================
// 职责: 分组佣金 → 分组内每条销售记录
// 规则:
// - 默认按数量比例分配: sale_commission = group_commission × qty / total_qty
// - 物料费率表 + 固定佣金: 全额分配给分组内第一条记录,其余为 0(避免重复计佣)
// ==========================================

use crate::domain::calculation::{CalculationResult, DistributorArticleGroup};
use crate::domain::sales::SalesRecord;
use crate::domain::scheme::Scheme;
use crate::domain::types::{CommissionType, SchemeType};
use crate::engine::resolver::ResolvedCommission;

/// 分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    /// 全额落在首条记录
    FirstMemberOnly,
    /// 按数量比例
    Proportional,
}

impl AllocationMode {
    pub fn for_scheme(scheme_type: SchemeType, commission_type: CommissionType) -> Self {
        match (scheme_type, commission_type) {
            (SchemeType::ArticleTable, CommissionType::Fixed) => AllocationMode::FirstMemberOnly,
            (SchemeType::ArticleTable, CommissionType::AbsolutePerUnit)
            | (SchemeType::ArticleTable, CommissionType::Percentage)
            | (SchemeType::Booster, _) => AllocationMode::Proportional,
        }
    }
}

pub struct CommissionAllocator;

impl CommissionAllocator {
    /// 分配分组佣金,输出顺序与分组成员顺序一致
    pub fn allocate(
        group: &DistributorArticleGroup,
        resolved: &ResolvedCommission,
        scheme: &Scheme,
    ) -> Vec<CalculationResult> {
        let mode = AllocationMode::for_scheme(scheme.scheme_type(), scheme.commission_type);
        let shares = Self::shares(group, resolved.group_commission, mode);

        group
            .sales()
            .iter()
            .zip(shares)
            .map(|(sale, commission)| Self::to_result(sale, commission, group, resolved))
            .collect()
    }

    /// 计算每条记录的佣金份额
    pub fn shares(
        group: &DistributorArticleGroup,
        group_commission: f64,
        mode: AllocationMode,
    ) -> Vec<f64> {
        let count = group.len();
        match mode {
            AllocationMode::FirstMemberOnly => (0..count)
                .map(|i| if i == 0 { group_commission } else { 0.0 })
                .collect(),
            AllocationMode::Proportional => {
                if group.total_quantity == 0.0 {
                    // 累计数量为 0 时无法按比例,改为均分
                    if count == 0 {
                        return Vec::new();
                    }
                    let even = group_commission / count as f64;
                    return vec![even; count];
                }
                group
                    .sales()
                    .iter()
                    .map(|sale| group_commission * (sale.billing_quantity / group.total_quantity))
                    .collect()
            }
        }
    }

    fn to_result(
        sale: &SalesRecord,
        commission: f64,
        group: &DistributorArticleGroup,
        resolved: &ResolvedCommission,
    ) -> CalculationResult {
        CalculationResult {
            distributor_id: sale.distributor_id.clone(),
            article_id: sale.article_id.clone(),
            billing_document: sale.billing_document.clone(),
            billing_date: sale.billing_date,
            billing_quantity: sale.billing_quantity,
            net_sales: sale.net_sales,
            commission,
            group_total_quantity: group.total_quantity,
            group_total_value: group.total_value,
            rate: resolved.rate,
            rate_source: resolved.rate_source,
            group_commission: resolved.group_commission,
        }
    }
}
