mod add;
mod search;
pub mod server;

pub use add::*;
pub use search::*;
pub use server::*;

use anyhow::bail;

use crate::config::Opts;
use crate::hash::HashAlgorithm;
use crate::store::SqliteStore;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 确认数据库使用的哈希算法与当前一致
///
/// `record` 为真且数据库尚未记录算法时，写入当前算法
async fn check_hash_algorithm(
    store: &SqliteStore,
    algorithm: HashAlgorithm,
    record: bool,
) -> anyhow::Result<()> {
    match store.hash_algorithm().await? {
        Some(stored) if stored != algorithm => {
            bail!("哈希算法不一致: 数据库使用 {}，当前为 {}", stored.as_str(), algorithm.as_str())
        }
        Some(_) => {}
        None if record => store.set_hash_algorithm(algorithm).await?,
        None => {}
    }
    Ok(())
}
