// ==========================================
// 分销商佣金计算系统 - 佣金方案实体
// ==========================================
// 职责: 方案的严格内部表示(准入条件 + 定价规则)
// 说明: 外部松散格式由 importer::scheme_normalizer 统一转换为本结构
// ==========================================

use crate::domain::types::{CommissionType, SchemeType, SlabType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// Scheme - 佣金方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub scheme_id: String,
    pub scheme_name: String,
    pub commission_type: CommissionType,
    pub distributors: DistributorSelection,
    pub articles: ArticleSelection,
    pub rule: SchemeRule,
}

impl Scheme {
    pub fn scheme_type(&self) -> SchemeType {
        self.rule.scheme_type()
    }
}

// ==========================================
// SchemeRule - 定价规则 (按方案类型区分)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemeRule {
    /// articleId → 费率
    ArticleTable {
        article_commissions: HashMap<String, f64>,
    },
    /// 阶梯表(存储时已按 min 升序)
    Booster { slab_type: SlabType, slabs: Vec<Slab> },
}

impl SchemeRule {
    pub fn scheme_type(&self) -> SchemeType {
        match self {
            SchemeRule::ArticleTable { .. } => SchemeType::ArticleTable,
            SchemeRule::Booster { .. } => SchemeType::Booster,
        }
    }
}

// ==========================================
// Slab - 阶梯区间 [min, max] (闭区间, max=None 表示无上限)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub min: f64,
    pub max: Option<f64>,
    pub rate: f64,
}

impl Slab {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

// ==========================================
// 分销商准入范围
// ==========================================
// 两种模式互斥: 按属性过滤 / 按 id 清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributorSelection {
    MatchingCriteria(DistributorCriteria),
    Explicit { distributor_ids: HashSet<String> },
}

impl Default for DistributorSelection {
    fn default() -> Self {
        DistributorSelection::MatchingCriteria(DistributorCriteria::default())
    }
}

/// 分销商属性条件,None 表示该条件不生效
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorCriteria {
    pub zone: Option<String>,
    pub state: Option<String>,
    pub distributor_type: Option<String>,
}

impl DistributorCriteria {
    pub fn is_active(&self) -> bool {
        self.zone.is_some() || self.state.is_some() || self.distributor_type.is_some()
    }
}

// ==========================================
// 物料准入范围
// ==========================================
// 优先级(归一化时确定): Explicit > Other > Hierarchy > All
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleSelection {
    All,
    Explicit { article_ids: HashSet<String> },
    /// "其他物料"覆盖清单,存在时完全取代层级过滤
    Other { article_ids: HashSet<String> },
    Hierarchy(ArticleHierarchyFilter),
}

impl Default for ArticleSelection {
    fn default() -> Self {
        ArticleSelection::All
    }
}

/// 物料层级过滤(family / class / brand),空集合表示该层不生效
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleHierarchyFilter {
    pub families: HashSet<String>,
    pub classes: HashSet<String>,
    pub brands: HashSet<String>,
}

impl ArticleHierarchyFilter {
    pub fn is_active(&self) -> bool {
        !self.families.is_empty() || !self.classes.is_empty() || !self.brands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slab_contains_inclusive_bounds() {
        let slab = Slab { min: 0.0, max: Some(100.0), rate: 5.0 };
        assert!(slab.contains(0.0));
        assert!(slab.contains(100.0));
        assert!(!slab.contains(100.5));

        let open = Slab { min: 101.0, max: None, rate: 10.0 };
        assert!(open.contains(1_000_000.0));
        assert!(!open.contains(100.0));
    }

    #[test]
    fn test_scheme_type_follows_rule() {
        let mut scheme = Scheme {
            scheme_id: "S1".to_string(),
            scheme_name: "test".to_string(),
            commission_type: CommissionType::Fixed,
            distributors: DistributorSelection::default(),
            articles: ArticleSelection::All,
            rule: SchemeRule::ArticleTable {
                article_commissions: HashMap::new(),
            },
        };
        assert_eq!(scheme.scheme_type(), SchemeType::ArticleTable);

        scheme.rule = SchemeRule::Booster {
            slab_type: SlabType::Quantity,
            slabs: vec![],
        };
        assert_eq!(scheme.scheme_type(), SchemeType::Booster);
    }
}
