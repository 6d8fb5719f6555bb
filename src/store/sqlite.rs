use std::path::Path;
use std::time::Instant;

use clap::ValueEnum;
use futures::TryStreamExt;
use log::{debug, info};

use super::SimilarityStore;
use crate::db::{self, Database, crud};
use crate::error::{Result, RetrievalError};
use crate::hamming::TopK;
use crate::hash::{HashAlgorithm, HashVector};
use crate::types::{ImageRecord, InsertMode, Match, Page, QueryResult};

const META_HASH_ALGORITHM: &str = "hash_algorithm";

/// 基于 SQLite 的哈希存储
///
/// SQLite 不支持 BIT_COUNT，因此排序时遍历所有记录，在内存中计算距离
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Database,
    mode: InsertMode,
}

impl SqliteStore {
    /// 打开数据库，不存在时自动创建
    pub async fn open(filename: impl AsRef<Path>, mode: InsertMode) -> Result<Self> {
        let pool = db::init_db(filename).await?;
        Ok(Self { pool, mode })
    }

    pub fn from_pool(pool: Database, mode: InsertMode) -> Self {
        Self { pool, mode }
    }

    pub fn pool(&self) -> &Database {
        &self.pool
    }

    /// 数据库中记录的哈希算法，尚未添加过图片时为空
    pub async fn hash_algorithm(&self) -> Result<Option<HashAlgorithm>> {
        let Some(value) = crud::get_meta(&self.pool, META_HASH_ALGORITHM).await? else {
            return Ok(None);
        };
        HashAlgorithm::from_str(&value, true)
            .map(Some)
            .map_err(|_| RetrievalError::Format(format!("unknown hash algorithm: {value}")))
    }

    pub async fn set_hash_algorithm(&self, algorithm: HashAlgorithm) -> Result<()> {
        crud::set_meta(&self.pool, META_HASH_ALGORITHM, algorithm.as_str()).await?;
        Ok(())
    }

    /// 关闭连接池，之后的所有操作都会失败
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl SimilarityStore for SqliteStore {
    async fn get_hash(&self, identifier: &str) -> Result<HashVector> {
        crud::get_image_hash(&self.pool, identifier)
            .await?
            .map(HashVector::from_sql)
            .ok_or_else(|| RetrievalError::NotFound(identifier.to_string()))
    }

    async fn top_k_by_distance(&self, query: HashVector, page: Page) -> Result<QueryResult> {
        let start = Instant::now();
        let mut topk = TopK::new(query, page);
        let mut total = 0usize;

        let mut rows = crud::stream_images(&self.pool);
        while let Some(row) = rows.try_next().await? {
            topk.push(&row.image_path, HashVector::from_sql(row.hash));
            total += 1;
        }

        debug!("扫描 {} 条记录，耗时 {:.2}ms", total, start.elapsed().as_secs_f32() * 1000.);
        Ok(topk.finish(page.offset))
    }

    async fn list_all(&self, page: Page) -> Result<QueryResult> {
        let paths = crud::get_image_paths(&self.pool, page.k, page.offset).await?;
        Ok(paths.into_iter().map(|identifier| Match { identifier, distance: None }).collect())
    }

    // 每次写入都是单条自动提交的语句，直接申请写锁，并发时由 busy_timeout 等待
    async fn insert(&self, record: ImageRecord) -> Result<bool> {
        let hash = record.hash.to_sql();
        match self.mode {
            InsertMode::Strict => match crud::add_image(&self.pool, &record.identifier, hash).await {
                Ok(()) => Ok(true),
                Err(e) => match RetrievalError::from(e) {
                    RetrievalError::Conflict(_) => Err(RetrievalError::Conflict(record.identifier)),
                    e => Err(e),
                },
            },
            InsertMode::Upsert => {
                if crud::add_image_or_ignore(&self.pool, &record.identifier, hash).await? {
                    return Ok(true);
                }
                info!("更新图片哈希: {}", record.identifier);
                crud::update_image_hash(&self.pool, &record.identifier, hash).await?;
                Ok(false)
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(crud::get_count(&self.pool).await? as u64)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn open(mode: InsertMode) -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db"), mode).await.unwrap();
        (dir, store)
    }

    async fn fill(store: &SqliteStore, records: &[(&str, u64)]) {
        for (id, hash) in records {
            store.insert(ImageRecord::new(*id, *hash)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_scenario() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        fill(&store, &[("C", 0b0011), ("A", 0b0000), ("B", 0b0001)]).await;

        let result = store.top_k_by_distance(HashVector::from(0), Page { k: 2, offset: 0 }).await.unwrap();
        assert_eq!(
            result,
            [
                Match { identifier: "A".into(), distance: Some(0) },
                Match { identifier: "B".into(), distance: Some(1) },
            ]
        );
    }

    #[tokio::test]
    async fn test_full_width_hash() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        fill(&store, &[("max", u64::MAX), ("high", 1 << 63)]).await;

        assert_eq!(store.get_hash("max").await.unwrap(), HashVector::from(u64::MAX));
        assert_eq!(store.get_hash("high").await.unwrap(), HashVector::from(1 << 63));

        let result = store.top_k_by_distance(u64::MAX.into(), Page::default()).await.unwrap();
        assert_eq!(result[0].distance, Some(0));
        assert_eq!(result[1].distance, Some(63));
    }

    #[tokio::test]
    async fn test_get_hash_not_found() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        let err = store.get_hash("missing").await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        assert!(store.insert(ImageRecord::new("a", 1u64)).await.unwrap());
        assert!(!store.insert(ImageRecord::new("a", 2u64)).await.unwrap());
        assert_eq!(store.get_hash("a").await.unwrap(), HashVector::from(2));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_strict_conflict() {
        let (_dir, store) = open(InsertMode::Strict).await;
        assert!(store.insert(ImageRecord::new("a", 1u64)).await.unwrap());
        let err = store.insert(ImageRecord::new("a", 2u64)).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Conflict(_)));
        assert_eq!(store.get_hash("a").await.unwrap(), HashVector::from(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert() {
        let (_dir, store) = open(InsertMode::Upsert).await;

        for round in 0..20u64 {
            let tasks = (0..8u64)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store.insert(ImageRecord::new(format!("img{round}"), round * 8 + i)).await
                    })
                })
                .collect::<Vec<_>>();

            let mut created = 0;
            for task in tasks {
                if task.await.unwrap().unwrap() {
                    created += 1;
                }
            }
            assert_eq!(created, 1, "round {round}");
        }
        assert_eq!(store.count().await.unwrap(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_strict_insert() {
        let (_dir, store) = open(InsertMode::Strict).await;

        let tasks = (0..8u64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(ImageRecord::new("same", i)).await })
            })
            .collect::<Vec<_>>();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(created_new) => {
                    assert!(created_new);
                    created += 1;
                }
                Err(RetrievalError::Conflict(id)) => assert_eq!(id, "same"),
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_list_all() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        fill(&store, &[("c", 0), ("a", 0), ("b", 0), ("d", 0)]).await;

        let ids = |r: QueryResult| r.into_iter().map(|m| m.identifier).collect::<Vec<_>>();
        assert_eq!(ids(store.list_all(Page { k: 3, offset: 0 }).await.unwrap()), ["a", "b", "c"]);
        assert_eq!(ids(store.list_all(Page { k: 3, offset: 2 }).await.unwrap()), ["c", "d"]);
        assert!(store.list_all(Page { k: 3, offset: 10 }).await.unwrap().is_empty());

        let result = store.list_all(Page::default()).await.unwrap();
        assert!(result.iter().all(|m| m.distance.is_none()));
    }

    #[tokio::test]
    async fn test_malformed_hash() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        fill(&store, &[("good", 1)]).await;
        sqlx::query("INSERT INTO images (image_path, hash) VALUES ('bad', 'zz')")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.get_hash("bad").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Format(_)), "{err:?}");
        let err = store.top_k_by_distance(HashVector::from(0), Page::default()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Format(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_closed_pool() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        fill(&store, &[("a", 1)]).await;
        store.close().await;

        let err = store.top_k_by_distance(HashVector::from(0), Page::default()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::StoreUnavailable(_)), "{err:?}");
        let err = store.get_hash("a").await.unwrap_err();
        assert!(matches!(err, RetrievalError::StoreUnavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_hash_algorithm_meta() {
        let (_dir, store) = open(InsertMode::Upsert).await;
        assert_eq!(store.hash_algorithm().await.unwrap(), None);
        store.set_hash_algorithm(HashAlgorithm::Difference).await.unwrap();
        assert_eq!(store.hash_algorithm().await.unwrap(), Some(HashAlgorithm::Difference));
    }

    #[tokio::test]
    async fn test_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let store = SqliteStore::open(&path, InsertMode::Upsert).await.unwrap();
            fill(&store, &[("a", 7)]).await;
            store.close().await;
        }
        let store = SqliteStore::open(&path, InsertMode::Upsert).await.unwrap();
        assert_eq!(store.get_hash("a").await.unwrap(), HashVector::from(7));
    }
}
