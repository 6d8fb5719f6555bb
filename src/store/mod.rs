mod memory;
mod sqlite;

use std::future::Future;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::hash::HashVector;
use crate::types::{ImageRecord, Page, QueryResult};

/// 图片哈希存储
///
/// 实现必须支持并发读取；任何错误都要完整返回，不能返回截断的结果
pub trait SimilarityStore: Send + Sync {
    /// 获取图片的哈希，不存在时返回 [`crate::RetrievalError::NotFound`]
    fn get_hash(&self, identifier: &str) -> impl Future<Output = Result<HashVector>> + Send;

    /// 按与 `query` 的汉明距离升序返回，同距离按标识符升序
    fn top_k_by_distance(
        &self,
        query: HashVector,
        page: Page,
    ) -> impl Future<Output = Result<QueryResult>> + Send;

    /// 按标识符升序返回所有图片，不计算距离
    fn list_all(&self, page: Page) -> impl Future<Output = Result<QueryResult>> + Send;

    /// 添加图片，返回是否为新记录
    fn insert(&self, record: ImageRecord) -> impl Future<Output = Result<bool>> + Send;

    /// 图片数量
    fn count(&self) -> impl Future<Output = Result<u64>> + Send;
}
