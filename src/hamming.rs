use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::hash::HashVector;
use crate::types::{Match, Page, QueryResult};

/// 并行排序的最小数据量，低于该值时单线程更快
const PAR_THRESHOLD: usize = 16384;

#[inline(always)]
pub fn hamming_u64(va: u64, vb: u64) -> u32 {
    (va ^ vb).count_ones()
}

/// 有界的 top-k 选择器
///
/// 保留 `page.k + page.offset` 个距离最小的候选，排序键为 (距离, 标识符)，
/// 因此同距离时按标识符升序，结果与输入顺序无关
#[derive(Debug)]
pub struct TopK {
    query: HashVector,
    limit: usize,
    heap: BinaryHeap<(u32, String)>,
}

impl TopK {
    pub fn new(query: HashVector, page: Page) -> Self {
        let limit = page.k.saturating_add(page.offset);
        // limit 可能非常大，容量只按常见的页大小预留
        Self { query, limit, heap: BinaryHeap::with_capacity(limit.min(1024) + 1) }
    }

    /// 加入一个候选
    pub fn push(&mut self, identifier: &str, hash: HashVector) {
        if self.limit == 0 {
            return;
        }
        let d = self.query.distance(&hash);
        if self.heap.len() < self.limit {
            self.heap.push((d, identifier.to_owned()));
            return;
        }
        // 堆顶为当前保留的最差候选
        if let Some((worst_d, worst_id)) = self.heap.peek() {
            if (d, identifier) < (*worst_d, worst_id.as_str()) {
                self.heap.pop();
                self.heap.push((d, identifier.to_owned()));
            }
        }
    }

    /// 合并另一个选择器的候选，用于并行计算
    pub fn merge(mut self, other: TopK) -> TopK {
        for (d, id) in other.heap {
            if self.heap.len() < self.limit {
                self.heap.push((d, id));
            } else if let Some(worst) = self.heap.peek() {
                if (d, &id) < (worst.0, &worst.1) {
                    self.heap.pop();
                    self.heap.push((d, id));
                }
            }
        }
        self
    }

    /// 按 (距离, 标识符) 升序输出，并跳过前 `offset` 个
    pub fn finish(self, offset: usize) -> QueryResult {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .skip(offset)
            .map(|(distance, identifier)| Match { identifier, distance: Some(distance) })
            .collect()
    }
}

/// 对一组记录按汉明距离排序，返回指定分页
pub fn knn_hamming<'a, I>(query: HashVector, records: I, page: Page) -> QueryResult
where
    I: IntoIterator<Item = (&'a str, HashVector)>,
{
    let mut topk = TopK::new(query, page);
    for (identifier, hash) in records {
        topk.push(identifier, hash);
    }
    topk.finish(page.offset)
}

/// [`knn_hamming`] 的并行版本，结果完全一致
pub fn par_knn_hamming(query: HashVector, records: &[(String, HashVector)], page: Page) -> QueryResult {
    if records.len() < PAR_THRESHOLD {
        return knn_hamming(query, records.iter().map(|(id, h)| (id.as_str(), *h)), page);
    }
    records
        .par_iter()
        .fold(
            || TopK::new(query, page),
            |mut topk, (id, hash)| {
                topk.push(id, *hash);
                topk
            },
        )
        .reduce(|| TopK::new(query, page), TopK::merge)
        .finish(page.offset)
}
