// ==========================================
// 分销商佣金计算系统 - 命名空间迁移
// ==========================================
// 职责: 将历史全局命名空间下的计算结果迁移到指定 owner
// 规则:
//   - 元数据 / 分块 / 指针中的 owner_key 字段改写为目标 owner
//   - 目标 owner 已有同名键时不覆盖(记为 skipped)
//   - 目标 owner 已有最新指针时不覆盖
//   - 复制后未被最新指针引用的计算列入 unpublished_calculations
//   - 全部复制成功后才删除全局键
// ==========================================

use crate::repository::calculation_store::LATEST_KEY;
use crate::repository::error::RepositoryResult;
use crate::repository::kv_store::{KeyValueStore, GLOBAL_NAMESPACE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub owner_key: String,
    pub dry_run: bool,
    pub copied_keys: Vec<String>,
    pub skipped_keys: Vec<String>,
    pub deleted_keys: Vec<String>,
    pub pointer_migrated: bool,
    /// 已复制但不是 owner 最新计算的 calculation_id(只能按 id 读取)
    #[serde(default)]
    pub unpublished_calculations: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.copied_keys.is_empty() && self.skipped_keys.is_empty()
    }
}

pub struct NamespaceMigration<S: KeyValueStore + ?Sized> {
    kv: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> NamespaceMigration<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv }
    }

    /// 全局命名空间 → owner 命名空间
    ///
    /// # 参数
    /// - owner_key: 目标 owner
    /// - dry_run: true 时只生成报告,不写不删
    #[instrument(skip(self))]
    pub async fn migrate_global_to_owner(
        &self,
        owner_key: &str,
        dry_run: bool,
    ) -> RepositoryResult<MigrationReport> {
        let mut report = MigrationReport {
            owner_key: owner_key.to_string(),
            dry_run,
            ..Default::default()
        };

        let keys = self.kv.list_keys(GLOBAL_NAMESPACE, "").await?;
        if keys.is_empty() {
            tracing::info!(owner_key, "全局命名空间为空,无需迁移");
            return Ok(report);
        }

        let mut published_id: Option<String> = None;
        for key in &keys {
            if self.kv.get(owner_key, key).await?.is_some() {
                tracing::warn!(owner_key, key = %key, "目标 owner 已存在同名键,跳过");
                report.skipped_keys.push(key.clone());
                continue;
            }

            let Some(mut value) = self.kv.get(GLOBAL_NAMESPACE, key).await? else {
                continue;
            };
            rewrite_owner(&mut value, owner_key);
            if key == LATEST_KEY {
                report.pointer_migrated = true;
                published_id = pointer_calculation_id(&value);
            }

            if !dry_run {
                self.kv.set(owner_key, key, value).await?;
            }
            report.copied_keys.push(key.clone());
        }

        if !report.pointer_migrated {
            published_id = self
                .kv
                .get(owner_key, LATEST_KEY)
                .await?
                .as_ref()
                .and_then(pointer_calculation_id);
        }
        report.unpublished_calculations = report
            .copied_keys
            .iter()
            .filter_map(|key| calculation_id_of(key))
            .filter(|id| published_id.as_deref() != Some(*id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        if !report.unpublished_calculations.is_empty() {
            tracing::warn!(
                owner_key,
                calculations = ?report.unpublished_calculations,
                "迁移的计算未被最新指针引用"
            );
        }

        // 复制全部成功后再清理全局键(跳过的键同样删除,owner 侧已有数据)
        if !dry_run {
            for key in &keys {
                if self.kv.delete(GLOBAL_NAMESPACE, key).await? {
                    report.deleted_keys.push(key.clone());
                }
            }
        }

        tracing::info!(
            owner_key,
            dry_run,
            copied = report.copied_keys.len(),
            skipped = report.skipped_keys.len(),
            deleted = report.deleted_keys.len(),
            pointer_migrated = report.pointer_migrated,
            unpublished = report.unpublished_calculations.len(),
            "全局命名空间迁移完成"
        );
        Ok(report)
    }
}

fn rewrite_owner(value: &mut Value, owner_key: &str) {
    if let Some(obj) = value.as_object_mut() {
        if obj.contains_key("owner_key") {
            obj.insert("owner_key".to_string(), Value::String(owner_key.to_string()));
        }
    }
}

fn pointer_calculation_id(pointer: &Value) -> Option<String> {
    pointer
        .get("calculation_id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// calculation/{id}/... → id
fn calculation_id_of(key: &str) -> Option<&str> {
    key.strip_prefix("calculation/")
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
}
