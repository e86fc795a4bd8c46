// ==========================================
// 分销商佣金计算系统 - 领域类型定义
// ==========================================
// 职责: 方案类型/佣金类型/阶梯类型等封闭枚举
// 红线: 所有分支必须穷举匹配,不允许字符串比较
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 方案类型 (Scheme Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与存储一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemeType {
    ArticleTable, // 按物料单独定价
    Booster,      // 阶梯激励
}

impl fmt::Display for SchemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeType::ArticleTable => write!(f, "ARTICLE_TABLE"),
            SchemeType::Booster => write!(f, "BOOSTER"),
        }
    }
}

// ==========================================
// 佣金类型 (Commission Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    Fixed,           // 固定金额(与数量无关)
    AbsolutePerUnit, // 每单位金额
    Percentage,      // 销售额百分比
}

impl fmt::Display for CommissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommissionType::Fixed => write!(f, "FIXED"),
            CommissionType::AbsolutePerUnit => write!(f, "ABSOLUTE_PER_UNIT"),
            CommissionType::Percentage => write!(f, "PERCENTAGE"),
        }
    }
}

// ==========================================
// 阶梯比较口径 (Slab Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlabType {
    Quantity, // 按累计数量
    Value,    // 按累计销售额
}

impl fmt::Display for SlabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlabType::Quantity => write!(f, "QUANTITY"),
            SlabType::Value => write!(f, "VALUE"),
        }
    }
}

// ==========================================
// 费率来源 (Rate Source)
// ==========================================
// 用途: 审计每个分组的费率是如何得出的
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum RateSource {
    /// 累计数量为负,强制归零
    NegativeQuantity,
    /// 物料费率表命中
    ArticleTable,
    /// 物料费率表未命中,按 0 处理
    ArticleRateMissing,
    /// 首个包含比较值的阶梯
    SlabMatch { slab_index: usize },
    /// 无阶梯包含比较值,回退到已达到的最高阶梯
    SlabHighestReached { slab_index: usize },
    /// 比较值低于所有阶梯下限
    NoSlab,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::NegativeQuantity => write!(f, "NEGATIVE_QUANTITY"),
            RateSource::ArticleTable => write!(f, "ARTICLE_TABLE"),
            RateSource::ArticleRateMissing => write!(f, "ARTICLE_RATE_MISSING"),
            RateSource::SlabMatch { slab_index } => write!(f, "SLAB_MATCH[{}]", slab_index),
            RateSource::SlabHighestReached { slab_index } => {
                write!(f, "SLAB_HIGHEST_REACHED[{}]", slab_index)
            }
            RateSource::NoSlab => write!(f, "NO_SLAB"),
        }
    }
}
