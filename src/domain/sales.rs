// ==========================================
// 分销商佣金计算系统 - 销售记录与参考数据
// ==========================================
// 职责: 销售记录(只读输入)、分销商/物料类目参考数据、查询接口
// 红线: 参考数据由外部系统维护,本模块只按 id 查询
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// SalesRecord - 单条销售记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub distributor_id: String,
    pub article_id: String,
    pub billing_quantity: f64, // 退货可为负
    pub net_sales: f64,
    pub billing_document: String,
    pub billing_date: Option<NaiveDate>,
}

// ==========================================
// DistributorInfo - 分销商属性
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorInfo {
    pub distributor_id: String,
    pub zone: Option<String>,
    pub state: Option<String>,
    pub distributor_type: Option<String>,
}

// ==========================================
// CategoryInfo - 物料类目层级
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub article_id: String,
    pub family: Option<String>,
    pub class: Option<String>,
    pub brand: Option<String>,
}

// ==========================================
// 参考数据查询接口
// ==========================================
// 实现者: HashMap(内存快照) 或外部目录服务适配器
pub trait DistributorLookup: Send + Sync {
    fn find_distributor(&self, distributor_id: &str) -> Option<&DistributorInfo>;
}

pub trait CategoryLookup: Send + Sync {
    fn find_category(&self, article_id: &str) -> Option<&CategoryInfo>;
}

impl DistributorLookup for HashMap<String, DistributorInfo> {
    fn find_distributor(&self, distributor_id: &str) -> Option<&DistributorInfo> {
        self.get(distributor_id)
    }
}

impl CategoryLookup for HashMap<String, CategoryInfo> {
    fn find_category(&self, article_id: &str) -> Option<&CategoryInfo> {
        self.get(article_id)
    }
}

/// 按 distributor_id 建立查询表
pub fn index_distributors(items: Vec<DistributorInfo>) -> HashMap<String, DistributorInfo> {
    items
        .into_iter()
        .map(|d| (d.distributor_id.clone(), d))
        .collect()
}

/// 按 article_id 建立查询表
pub fn index_categories(items: Vec<CategoryInfo>) -> HashMap<String, CategoryInfo> {
    items
        .into_iter()
        .map(|c| (c.article_id.clone(), c))
        .collect()
}
