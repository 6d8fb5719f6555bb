use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use sqlx::{SqlitePool, sqlite::*};

pub mod crud;
pub mod model;

pub use model::*;

pub type Database = SqlitePool;

/// 打开图片哈希数据库并执行迁移
///
/// 使用 WAL 模式，排序扫描与写入可以同时进行
pub async fn init_db(filename: impl AsRef<Path>) -> Result<Database, sqlx::Error> {
    let filename = filename.as_ref();
    info!("打开哈希数据库: {}", filename.display());

    let options = SqliteConnectOptions::new()
        .filename(filename)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(num_cpus::get().max(4) as u32)
        .connect_with(options)
        .await?;

    debug!("检查数据库迁移");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
