use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::task::JoinError;

use crate::config::ConfDir;
use crate::error::{Result, RetrievalError};
use crate::hash::{self, HashAlgorithm, HashVector};
use crate::metrics;
use crate::store::{SimilarityStore, SqliteStore};
use crate::types::{InsertMode, Page, Query, QueryResult};

/// 以 SQLite 为存储的检索引擎构建器
pub struct EngineBuilder {
    conf_dir: ConfDir,
    insert_mode: InsertMode,
    algorithm: HashAlgorithm,
    timeout: Option<Duration>,
}

impl EngineBuilder {
    pub fn new(conf_dir: ConfDir) -> Self {
        Self {
            conf_dir,
            insert_mode: InsertMode::default(),
            algorithm: HashAlgorithm::default(),
            timeout: None,
        }
    }

    /// 插入已存在图片时的行为
    pub fn insert_mode(mut self, insert_mode: InsertMode) -> Self {
        self.insert_mode = insert_mode;
        self
    }

    /// 计算外部图片哈希的方式，必须与入库时一致
    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// 单次存储操作的超时时间
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn open(self) -> Result<RetrievalEngine<SqliteStore>> {
        std::fs::create_dir_all(self.conf_dir.path()).map_err(|e| {
            RetrievalError::StoreUnavailable(format!("{}: {}", self.conf_dir.path().display(), e))
        })?;
        let store = SqliteStore::open(self.conf_dir.database(), self.insert_mode).await?;
        info!("数据库中共有 {} 张图片", store.count().await?);
        Ok(RetrievalEngine::new(store).algorithm(self.algorithm).timeout(self.timeout))
    }
}

/// 检索引擎
///
/// 不保存任何请求相关的状态，可以在多个请求间共享
pub struct RetrievalEngine<S> {
    store: S,
    algorithm: HashAlgorithm,
    timeout: Option<Duration>,
}

impl<S: SimilarityStore> RetrievalEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store, algorithm: HashAlgorithm::default(), timeout: None }
    }

    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// 执行一次检索并记录指标
    pub async fn run(&self, query: Query, page: Page) -> Result<QueryResult> {
        let kind = query.kind();
        let start = Instant::now();
        let result = match query {
            Query::Existing(identifier) => self.select_existing(&identifier, page).await,
            Query::Probe(data) => self.probe_new(data, page).await,
            Query::Unfiltered => self.default_view(page).await,
        };
        let elapsed = start.elapsed();
        metrics::observe_query(kind, result.as_ref().err(), elapsed.as_secs_f64());
        match &result {
            Ok(r) => debug!("{} 检索完成，返回 {} 条结果，耗时 {:?}", kind, r.len(), elapsed),
            Err(e) => warn!("{} 检索失败: {}", kind, e),
        }
        result
    }

    /// 以数据库中已有图片的哈希进行检索
    pub async fn select_existing(&self, identifier: &str, page: Page) -> Result<QueryResult> {
        let hash = self.bounded(self.store.get_hash(identifier)).await?;
        debug!("{} 的哈希: {}", identifier, hash);
        self.bounded(self.store.top_k_by_distance(hash, page)).await
    }

    /// 计算外部图片的哈希并进行检索
    pub async fn probe_new(&self, data: Vec<u8>, page: Page) -> Result<QueryResult> {
        let hash = self.compute_hash(data).await?;
        debug!("外部图片的哈希: {}", hash);
        self.bounded(self.store.top_k_by_distance(hash, page)).await
    }

    /// 无查询时的默认列表
    pub async fn default_view(&self, page: Page) -> Result<QueryResult> {
        self.bounded(self.store.list_all(page)).await
    }

    /// 在阻塞线程上计算哈希
    pub async fn compute_hash(&self, data: Vec<u8>) -> Result<HashVector> {
        let algorithm = self.algorithm;
        join_hash(tokio::task::spawn_blocking(move || hash::compute_hash(&data, algorithm)).await)
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RetrievalError::Timeout(format!("store call exceeded {limit:?}")))?,
            None => fut.await,
        }
    }
}

fn join_hash(joined: std::result::Result<Result<HashVector>, JoinError>) -> Result<HashVector> {
    match joined {
        Ok(hash) => hash,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        // 任务被取消，通常是运行时正在关闭
        Err(e) => Err(RetrievalError::StoreUnavailable(format!("hash task cancelled: {e}"))),
    }
}
