// ==========================================
// 分销商佣金计算系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 键值存储抽象 + 分块结果存储 + 命名空间迁移
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod calculation_store;
pub mod error;
pub mod kv_store;
pub mod memory_kv_store;
pub mod migration;
pub mod sqlite_kv_store;

pub use calculation_store::{ChunkedResultStore, StoreReceipt, LATEST_KEY};
pub use error::{RepositoryError, RepositoryResult};
pub use kv_store::{KeyValueStore, GLOBAL_NAMESPACE};
pub use memory_kv_store::MemoryKeyValueStore;
pub use migration::{MigrationReport, NamespaceMigration};
pub use sqlite_kv_store::SqliteKeyValueStore;
