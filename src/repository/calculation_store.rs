// ==========================================
// 分销商佣金计算系统 - 分块结果存储
// ==========================================
// 职责: 大结果集拆块持久化 + 按序重建
// 写入顺序(两阶段追加):
//   1. 元数据
//   2. 分块 0..N-1(顺序写入,块间留间隔)
//   3. 最新指针(发布屏障,写入成功才算发布)
// 失败补偿: 尽力删除本次已写入的元数据/分块,然后返回 StorageFailure
// 读取: 缺失分块记录日志并跳过,通过 missing_chunks 告知调用方
// 并发: 每次计算 id 唯一,分块键无竞争;最新指针后写覆盖先写
// ==========================================

use crate::config::StoreConfig;
use crate::domain::calculation::{
    CalculationMetadata, CalculationResult, CalculationSummary, LatestPointer, ResultChunk,
    RetrievedCalculation,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::KeyValueStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// 最新指针键
pub const LATEST_KEY: &str = "latest_calculation";

pub fn calculation_prefix(calculation_id: &str) -> String {
    format!("calculation/{}/", calculation_id)
}

pub fn metadata_key(calculation_id: &str) -> String {
    format!("calculation/{}/meta", calculation_id)
}

pub fn chunk_key(calculation_id: &str, chunk_index: usize) -> String {
    format!("calculation/{}/chunk/{}", calculation_id, chunk_index)
}

// ==========================================
// StoreReceipt - 发布回执
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReceipt {
    pub calculation_id: String,
    pub total_records: usize,
    pub total_chunks: usize,
}

// ==========================================
// ChunkedResultStore
// ==========================================
pub struct ChunkedResultStore<S: KeyValueStore + ?Sized> {
    kv: Arc<S>,
    config: StoreConfig,
}

impl<S: KeyValueStore + ?Sized> ChunkedResultStore<S> {
    pub fn new(kv: Arc<S>, config: StoreConfig) -> Self {
        Self { kv, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// 持久化一次计算结果并发布为 owner 的最新计算
    ///
    /// # 返回
    /// - Ok(StoreReceipt): 指针已写入,计算已发布
    /// - Err(StorageFailure): 任一步写入失败(已尽力补偿删除)
    #[instrument(skip(self, results), fields(records = results.len()))]
    pub async fn store(
        &self,
        owner_key: &str,
        scheme_id: &str,
        scheme_name: &str,
        results: &[CalculationResult],
    ) -> RepositoryResult<StoreReceipt> {
        let chunk_size = self.config.chunk_size.max(1);
        let calculation_id = Uuid::new_v4().to_string();
        let total_chunks = results.len().div_ceil(chunk_size);

        let metadata = CalculationMetadata {
            calculation_id: calculation_id.clone(),
            scheme_id: scheme_id.to_string(),
            scheme_name: scheme_name.to_string(),
            owner_key: owner_key.to_string(),
            total_records: results.len(),
            total_chunks,
            chunk_size,
            summary: CalculationSummary::from_results(results),
            created_at: Utc::now(),
        };

        // === 阶段 1: 元数据 ===
        if let Err(e) = self
            .put(owner_key, &metadata_key(&calculation_id), &metadata)
            .await
        {
            return Err(self
                .fail(owner_key, &calculation_id, "metadata", 0, total_chunks, e)
                .await);
        }

        // === 阶段 2: 分块(顺序写入) ===
        for (chunk_index, records) in results.chunks(chunk_size).enumerate() {
            if chunk_index > 0 && !self.config.chunk_write_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_write_delay).await;
            }

            let chunk = ResultChunk {
                calculation_id: calculation_id.clone(),
                chunk_index,
                records: records.to_vec(),
            };
            if let Err(e) = self
                .put(owner_key, &chunk_key(&calculation_id, chunk_index), &chunk)
                .await
            {
                return Err(self
                    .fail(owner_key, &calculation_id, "chunk", chunk_index, total_chunks, e)
                    .await);
            }
            tracing::debug!(chunk_index, total_chunks, "分块写入完成");
        }

        // === 阶段 3: 发布最新指针 ===
        let pointer = LatestPointer {
            owner_key: owner_key.to_string(),
            calculation_id: calculation_id.clone(),
            published_at: Utc::now(),
        };
        if let Err(e) = self.put(owner_key, LATEST_KEY, &pointer).await {
            return Err(self
                .fail(owner_key, &calculation_id, "pointer", total_chunks, total_chunks, e)
                .await);
        }

        tracing::info!(
            owner_key,
            calculation_id = %calculation_id,
            total_chunks,
            "计算结果已发布"
        );

        Ok(StoreReceipt {
            calculation_id,
            total_records: results.len(),
            total_chunks,
        })
    }

    async fn put<T: Serialize>(&self, owner_key: &str, key: &str, value: &T) -> RepositoryResult<()> {
        let value = serde_json::to_value(value)?;
        self.kv.set(owner_key, key, value).await
    }

    /// 写入失败: 补偿删除后构造 StorageFailure
    async fn fail(
        &self,
        owner_key: &str,
        calculation_id: &str,
        stage: &str,
        written_chunks: usize,
        total_chunks: usize,
        cause: RepositoryError,
    ) -> RepositoryError {
        tracing::error!(
            owner_key,
            calculation_id,
            stage,
            written_chunks,
            total_chunks,
            error = %cause,
            "计算结果写入失败,开始补偿删除"
        );
        self.compensate(owner_key, calculation_id, written_chunks).await;

        RepositoryError::StorageFailure {
            calculation_id: calculation_id.to_string(),
            stage: stage.to_string(),
            written_chunks,
            total_chunks,
            message: cause.to_string(),
        }
    }

    /// 尽力删除元数据与前 written_chunks 个分块,删除失败只记日志
    async fn compensate(&self, owner_key: &str, calculation_id: &str, written_chunks: usize) {
        let keys = std::iter::once(metadata_key(calculation_id))
            .chain((0..written_chunks).map(|i| chunk_key(calculation_id, i)));

        for key in keys {
            if let Err(e) = self.kv.delete(owner_key, &key).await {
                tracing::warn!(owner_key, key = %key, error = %e, "补偿删除失败,条目可能残留");
            }
        }
    }

    /// 读取 owner 的最新指针
    pub async fn latest_pointer(&self, owner_key: &str) -> RepositoryResult<Option<LatestPointer>> {
        match self.kv.get(owner_key, LATEST_KEY).await? {
            None => Ok(None),
            Some(value) => Ok(Some(decode(owner_key, LATEST_KEY, value)?)),
        }
    }

    /// 读取 owner 最新发布的计算
    ///
    /// # 返回
    /// - Ok(None): owner 尚无发布的计算
    /// - Err(NotFound): 指针存在但元数据缺失
    pub async fn retrieve_latest(
        &self,
        owner_key: &str,
    ) -> RepositoryResult<Option<RetrievedCalculation>> {
        let Some(pointer) = self.latest_pointer(owner_key).await? else {
            return Ok(None);
        };

        match self.retrieve(owner_key, &pointer.calculation_id).await? {
            Some(calculation) => Ok(Some(calculation)),
            None => Err(RepositoryError::NotFound {
                entity: "CalculationMetadata".to_string(),
                id: pointer.calculation_id,
            }),
        }
    }

    /// 按 calculation_id 读取并重建结果
    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        owner_key: &str,
        calculation_id: &str,
    ) -> RepositoryResult<Option<RetrievedCalculation>> {
        let meta_key = metadata_key(calculation_id);
        let Some(value) = self.kv.get(owner_key, &meta_key).await? else {
            return Ok(None);
        };
        let metadata: CalculationMetadata = decode(owner_key, &meta_key, value)?;

        let mut results = Vec::with_capacity(metadata.total_records);
        let mut missing_chunks = Vec::new();

        for chunk_index in 0..metadata.total_chunks {
            let key = chunk_key(calculation_id, chunk_index);
            let chunk = match self.kv.get(owner_key, &key).await {
                Ok(Some(value)) => decode::<ResultChunk>(owner_key, &key, value).ok(),
                Ok(None) => None,
                // 存储层无法解析的分块同样按缺失处理
                Err(RepositoryError::CorruptEntry { message, .. }) => {
                    tracing::warn!(owner_key, key = %key, error = %message, "分块内容损坏");
                    None
                }
                Err(e) => return Err(e),
            };

            match chunk {
                Some(chunk) if chunk.chunk_index == chunk_index => results.extend(chunk.records),
                _ => {
                    tracing::warn!(
                        owner_key,
                        calculation_id,
                        chunk_index,
                        "分块缺失或无法解析,已跳过"
                    );
                    missing_chunks.push(chunk_index);
                }
            }
        }

        Ok(Some(RetrievedCalculation {
            metadata,
            results,
            missing_chunks,
        }))
    }

    /// 删除一次计算的全部条目;若最新指针指向它,一并删除指针
    ///
    /// # 返回
    /// - 删除的条目数
    pub async fn delete_calculation(
        &self,
        owner_key: &str,
        calculation_id: &str,
    ) -> RepositoryResult<usize> {
        let mut deleted = 0;

        if let Some(pointer) = self.latest_pointer(owner_key).await? {
            if pointer.calculation_id == calculation_id && self.kv.delete(owner_key, LATEST_KEY).await? {
                deleted += 1;
            }
        }

        for key in self
            .kv
            .list_keys(owner_key, &calculation_prefix(calculation_id))
            .await?
        {
            if self.kv.delete(owner_key, &key).await? {
                deleted += 1;
            }
        }

        tracing::info!(owner_key, calculation_id, deleted, "计算结果已删除");
        Ok(deleted)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    namespace: &str,
    key: &str,
    value: serde_json::Value,
) -> RepositoryResult<T> {
    serde_json::from_value(value).map_err(|e| RepositoryError::CorruptEntry {
        namespace: namespace.to_string(),
        key: key.to_string(),
        message: e.to_string(),
    })
}
