// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、方案/销售数据构建器、可注入故障的键值存储
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use distributor_commission::domain::scheme::{
    ArticleHierarchyFilter, ArticleSelection, DistributorCriteria, DistributorSelection, Scheme,
    SchemeRule, Slab,
};
use distributor_commission::domain::sales::{CategoryInfo, DistributorInfo, SalesRecord};
use distributor_commission::domain::types::{CommissionType, SlabType};
use distributor_commission::repository::{
    KeyValueStore, MemoryKeyValueStore, RepositoryError, RepositoryResult,
};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库文件
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

// ==========================================
// Scheme 构建器
// ==========================================

pub struct SchemeBuilder {
    scheme_id: String,
    commission_type: CommissionType,
    distributors: DistributorSelection,
    articles: ArticleSelection,
    rule: SchemeRule,
}

impl SchemeBuilder {
    /// 默认: 物料表方案、固定佣金、不限分销商/物料
    pub fn new(scheme_id: &str) -> Self {
        Self {
            scheme_id: scheme_id.to_string(),
            commission_type: CommissionType::Fixed,
            distributors: DistributorSelection::default(),
            articles: ArticleSelection::All,
            rule: SchemeRule::ArticleTable {
                article_commissions: Default::default(),
            },
        }
    }

    pub fn commission_type(mut self, commission_type: CommissionType) -> Self {
        self.commission_type = commission_type;
        self
    }

    pub fn article_rate(mut self, article_id: &str, rate: f64) -> Self {
        match &mut self.rule {
            SchemeRule::ArticleTable {
                article_commissions,
            } => {
                article_commissions.insert(article_id.to_string(), rate);
            }
            SchemeRule::Booster { .. } => {
                self.rule = SchemeRule::ArticleTable {
                    article_commissions: [(article_id.to_string(), rate)].into_iter().collect(),
                };
            }
        }
        self
    }

    /// 阶梯: (min, max, rate)
    pub fn booster(mut self, slab_type: SlabType, slabs: &[(f64, Option<f64>, f64)]) -> Self {
        self.rule = SchemeRule::Booster {
            slab_type,
            slabs: slabs
                .iter()
                .map(|&(min, max, rate)| Slab { min, max, rate })
                .collect(),
        };
        self
    }

    pub fn distributor_ids(mut self, ids: &[&str]) -> Self {
        self.distributors = DistributorSelection::Explicit {
            distributor_ids: ids.iter().map(|s| s.to_string()).collect(),
        };
        self
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.distributors = DistributorSelection::MatchingCriteria(DistributorCriteria {
            zone: Some(zone.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn article_ids(mut self, ids: &[&str]) -> Self {
        self.articles = ArticleSelection::Explicit {
            article_ids: ids.iter().map(|s| s.to_string()).collect(),
        };
        self
    }

    pub fn families(mut self, families: &[&str]) -> Self {
        self.articles = ArticleSelection::Hierarchy(ArticleHierarchyFilter {
            families: families.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> Scheme {
        Scheme {
            scheme_name: format!("{} scheme", self.scheme_id),
            scheme_id: self.scheme_id,
            commission_type: self.commission_type,
            distributors: self.distributors,
            articles: self.articles,
            rule: self.rule,
        }
    }
}

// ==========================================
// 销售/主数据
// ==========================================

pub fn sale(distributor_id: &str, article_id: &str, quantity: f64, net_sales: f64) -> SalesRecord {
    SalesRecord {
        distributor_id: distributor_id.to_string(),
        article_id: article_id.to_string(),
        billing_quantity: quantity,
        net_sales,
        billing_document: format!("INV-{}-{}-{}", distributor_id, article_id, quantity),
        billing_date: None,
    }
}

pub fn distributor(distributor_id: &str, zone: &str) -> DistributorInfo {
    DistributorInfo {
        distributor_id: distributor_id.to_string(),
        zone: Some(zone.to_string()),
        ..Default::default()
    }
}

pub fn category(article_id: &str, family: &str) -> CategoryInfo {
    CategoryInfo {
        article_id: article_id.to_string(),
        family: Some(family.to_string()),
        ..Default::default()
    }
}

// ==========================================
// FailingStore - 按键注入写入失败
// ==========================================

/// 包装内存存储;键包含任一故障片段时 set 失败,并记录所有 delete 调用
pub struct FailingStore {
    inner: MemoryKeyValueStore,
    fail_fragments: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            fail_fragments: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(&self, fragment: &str) {
        self.fail_fragments.lock().unwrap().push(fragment.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_fragments.lock().unwrap().clear();
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub async fn key_set(&self, namespace: &str) -> HashSet<String> {
        self.inner
            .list_keys(namespace, "")
            .await
            .unwrap()
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, namespace: &str, key: &str) -> RepositoryResult<Option<Value>> {
        self.inner.get(namespace, key).await
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> RepositoryResult<()> {
        let should_fail = self
            .fail_fragments
            .lock()
            .unwrap()
            .iter()
            .any(|f| key.contains(f.as_str()));
        if should_fail {
            return Err(RepositoryError::DatabaseQueryError(format!(
                "injected failure for {}",
                key
            )));
        }
        self.inner.set(namespace, key, value).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> RepositoryResult<bool> {
        self.deleted.lock().unwrap().push(key.to_string());
        self.inner.delete(namespace, key).await
    }

    async fn list_keys(&self, namespace: &str, prefix: &str) -> RepositoryResult<Vec<String>> {
        self.inner.list_keys(namespace, prefix).await
    }
}
