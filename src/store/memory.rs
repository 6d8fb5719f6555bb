use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::SimilarityStore;
use crate::error::{Result, RetrievalError};
use crate::hamming::par_knn_hamming;
use crate::hash::HashVector;
use crate::types::{ImageRecord, InsertMode, Match, Page, QueryResult};

/// 内存中的哈希存储，记录按标识符排序
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<(String, HashVector)>>,
    mode: InsertMode,
}

impl MemoryStore {
    pub fn new(mode: InsertMode) -> Self {
        Self { records: RwLock::default(), mode }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<(String, HashVector)>>> {
        self.records.read().map_err(|e| RetrievalError::StoreUnavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<(String, HashVector)>>> {
        self.records.write().map_err(|e| RetrievalError::StoreUnavailable(e.to_string()))
    }
}

impl FromIterator<ImageRecord> for MemoryStore {
    /// 重复的标识符保留最后一条
    fn from_iter<T: IntoIterator<Item = ImageRecord>>(iter: T) -> Self {
        let mut records =
            iter.into_iter().map(|r| (r.identifier, r.hash)).collect::<Vec<_>>();
        records.reverse();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records.dedup_by(|a, b| a.0 == b.0);
        Self { records: RwLock::new(records), mode: InsertMode::default() }
    }
}

impl SimilarityStore for MemoryStore {
    async fn get_hash(&self, identifier: &str) -> Result<HashVector> {
        let records = self.read()?;
        records
            .binary_search_by(|(id, _)| id.as_str().cmp(identifier))
            .map(|i| records[i].1)
            .map_err(|_| RetrievalError::NotFound(identifier.to_string()))
    }

    async fn top_k_by_distance(&self, query: HashVector, page: Page) -> Result<QueryResult> {
        let records = self.read()?;
        Ok(par_knn_hamming(query, &records, page))
    }

    async fn list_all(&self, page: Page) -> Result<QueryResult> {
        let records = self.read()?;
        Ok(records
            .iter()
            .skip(page.offset)
            .take(page.k)
            .map(|(id, _)| Match { identifier: id.clone(), distance: None })
            .collect())
    }

    async fn insert(&self, record: ImageRecord) -> Result<bool> {
        let mut records = self.write()?;
        match records.binary_search_by(|(id, _)| id.cmp(&record.identifier)) {
            Ok(_) if self.mode == InsertMode::Strict => {
                Err(RetrievalError::Conflict(record.identifier))
            }
            Ok(i) => {
                records[i].1 = record.hash;
                Ok(false)
            }
            Err(i) => {
                records.insert(i, (record.identifier, record.hash));
                Ok(true)
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }
}
