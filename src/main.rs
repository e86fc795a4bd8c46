// ==========================================
// 分销商佣金计算系统 - 命令行入口
// ==========================================
// 用法:
//   commission-calc calculate <db_path> <owner_key> <input.json>
//   commission-calc latest    <db_path> <owner_key>
//   commission-calc migrate   <db_path> <owner_key> [--dry-run]
//
// input.json: {"scheme": {...}, "sales": [...], "distributors": [...], "categories": [...]}
// 输出: 结果 JSON 写 stdout,日志写 stderr
// ==========================================

use anyhow::{bail, Context};
use distributor_commission::api::{CommissionApi, RawCalculationInput};
use distributor_commission::config::ConfigManager;
use distributor_commission::db::open_sqlite_connection;
use distributor_commission::repository::{KeyValueStore, SqliteKeyValueStore};
use distributor_commission::{logging, APP_NAME, VERSION};
use std::sync::{Arc, Mutex};

const USAGE: &str = "用法: commission-calc <calculate|latest|migrate> <db_path> <owner_key> [input.json|--dry-run]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, db_path, owner_key) = match args.as_slice() {
        [command, db_path, owner_key, ..] => (command.as_str(), db_path, owner_key),
        _ => bail!(USAGE),
    };

    tracing::info!(version = VERSION, db_path = %db_path, "{} 启动", APP_NAME);

    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(db_path).with_context(|| format!("无法打开数据库: {}", db_path))?,
    ));
    let config = ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow::anyhow!(e))?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::from_connection(conn)?);
    let api = CommissionApi::from_config_reader(kv, &config).await?;

    match command {
        "calculate" => {
            let input_path = args.get(3).context(USAGE)?;
            let raw = std::fs::read_to_string(input_path)
                .with_context(|| format!("无法读取输入文件: {}", input_path))?;
            let input: RawCalculationInput =
                serde_json::from_str(&raw).context("输入文件不是合法的计算输入 JSON")?;

            let response = api.calculate_from_raw(owner_key, &input).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "latest" => match api.get_latest_calculation(owner_key).await? {
            Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
            None => tracing::info!(owner_key = %owner_key, "尚无已发布的计算"),
        },
        "migrate" => {
            let dry_run = args.iter().skip(3).any(|a| a == "--dry-run");
            let report = api.migrate_global_to_owner(owner_key, dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
