// ==========================================
// 分销商佣金计算系统 - 准入条件匹配
// ==========================================
// 职责: 判定单条销售记录是否满足方案的分销商/物料准入条件
// 红线: 无状态、无副作用、无 I/O
// 说明: 物料费率表方案不做物料过滤,费率表命中在 Resolver 中判定
// ==========================================

use crate::domain::sales::{CategoryLookup, DistributorInfo, SalesRecord};
use crate::domain::scheme::{
    ArticleHierarchyFilter, ArticleSelection, DistributorCriteria, DistributorSelection, Scheme,
    SchemeRule,
};
use std::collections::HashSet;
use std::fmt;

// ==========================================
// 拒绝原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DistributorNotListed,
    DistributorUnknown,
    ZoneMismatch,
    StateMismatch,
    DistributorTypeMismatch,
    ArticleNotListed,
    ArticleUnmapped,
    FamilyMismatch,
    ClassMismatch,
    BrandMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::DistributorNotListed => "DISTRIBUTOR_NOT_LISTED",
            RejectReason::DistributorUnknown => "DISTRIBUTOR_UNKNOWN",
            RejectReason::ZoneMismatch => "ZONE_MISMATCH",
            RejectReason::StateMismatch => "STATE_MISMATCH",
            RejectReason::DistributorTypeMismatch => "DISTRIBUTOR_TYPE_MISMATCH",
            RejectReason::ArticleNotListed => "ARTICLE_NOT_LISTED",
            RejectReason::ArticleUnmapped => "ARTICLE_UNMAPPED",
            RejectReason::FamilyMismatch => "FAMILY_MISMATCH",
            RejectReason::ClassMismatch => "CLASS_MISMATCH",
            RejectReason::BrandMismatch => "BRAND_MISMATCH",
        };
        write!(f, "{}", label)
    }
}

// ==========================================
// CriteriaMatcher - 纯函数工具类
// ==========================================
pub struct CriteriaMatcher;

impl CriteriaMatcher {
    /// 判定销售记录是否符合方案准入条件
    ///
    /// # 参数
    /// - sale: 销售记录
    /// - scheme: 方案
    /// - categories: 物料类目查询
    /// - distributor: 分销商属性(调用方按 id 直接查询,未找到为 None)
    pub fn matches(
        sale: &SalesRecord,
        scheme: &Scheme,
        categories: &dyn CategoryLookup,
        distributor: Option<&DistributorInfo>,
    ) -> bool {
        Self::evaluate(sale, scheme, categories, distributor).is_ok()
    }

    /// 同 matches,但返回拒绝原因
    pub fn evaluate(
        sale: &SalesRecord,
        scheme: &Scheme,
        categories: &dyn CategoryLookup,
        distributor: Option<&DistributorInfo>,
    ) -> Result<(), RejectReason> {
        Self::check_distributor(sale, &scheme.distributors, distributor)?;

        match &scheme.rule {
            SchemeRule::ArticleTable { .. } => Ok(()),
            SchemeRule::Booster { .. } => Self::check_article(sale, &scheme.articles, categories),
        }
    }

    /// 分销商过滤: 清单模式只做成员判断,条件模式比对 zone/state/type
    pub fn check_distributor(
        sale: &SalesRecord,
        selection: &DistributorSelection,
        distributor: Option<&DistributorInfo>,
    ) -> Result<(), RejectReason> {
        match selection {
            DistributorSelection::Explicit { distributor_ids } => {
                if distributor_ids.contains(&sale.distributor_id) {
                    Ok(())
                } else {
                    Err(RejectReason::DistributorNotListed)
                }
            }
            DistributorSelection::MatchingCriteria(criteria) => {
                Self::check_distributor_criteria(criteria, distributor)
            }
        }
    }

    fn check_distributor_criteria(
        criteria: &DistributorCriteria,
        distributor: Option<&DistributorInfo>,
    ) -> Result<(), RejectReason> {
        if !criteria.is_active() {
            return Ok(());
        }
        // 条件生效但分销商未知 → 拒绝
        let Some(info) = distributor else {
            return Err(RejectReason::DistributorUnknown);
        };

        if !field_matches(&criteria.zone, &info.zone) {
            return Err(RejectReason::ZoneMismatch);
        }
        if !field_matches(&criteria.state, &info.state) {
            return Err(RejectReason::StateMismatch);
        }
        if !field_matches(&criteria.distributor_type, &info.distributor_type) {
            return Err(RejectReason::DistributorTypeMismatch);
        }
        Ok(())
    }

    /// 物料过滤(仅阶梯方案)
    pub fn check_article(
        sale: &SalesRecord,
        selection: &ArticleSelection,
        categories: &dyn CategoryLookup,
    ) -> Result<(), RejectReason> {
        match selection {
            ArticleSelection::All => Ok(()),
            ArticleSelection::Explicit { article_ids } | ArticleSelection::Other { article_ids } => {
                if article_ids.contains(&sale.article_id) {
                    Ok(())
                } else {
                    Err(RejectReason::ArticleNotListed)
                }
            }
            ArticleSelection::Hierarchy(filter) => {
                Self::check_hierarchy(&sale.article_id, filter, categories)
            }
        }
    }

    fn check_hierarchy(
        article_id: &str,
        filter: &ArticleHierarchyFilter,
        categories: &dyn CategoryLookup,
    ) -> Result<(), RejectReason> {
        if !filter.is_active() {
            return Ok(());
        }
        // 未映射物料在层级条件生效时一律拒绝
        let Some(category) = categories.find_category(article_id) else {
            return Err(RejectReason::ArticleUnmapped);
        };

        if !set_matches(&filter.families, &category.family) {
            return Err(RejectReason::FamilyMismatch);
        }
        if !set_matches(&filter.classes, &category.class) {
            return Err(RejectReason::ClassMismatch);
        }
        if !set_matches(&filter.brands, &category.brand) {
            return Err(RejectReason::BrandMismatch);
        }
        Ok(())
    }
}

fn field_matches(expected: &Option<String>, actual: &Option<String>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual.as_deref() == Some(expected.as_str()),
    }
}

fn set_matches(allowed: &HashSet<String>, actual: &Option<String>) -> bool {
    allowed.is_empty() || actual.as_ref().map_or(false, |v| allowed.contains(v))
}
