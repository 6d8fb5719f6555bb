use serde::{Deserialize, Serialize};

use crate::hash::HashVector;

/// 默认返回的结果数量
pub const DEFAULT_K: usize = 20;

/// 图片记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// 图片的唯一标识，通常为文件路径
    pub identifier: String,
    /// 图片感知哈希
    pub hash: HashVector,
}

impl ImageRecord {
    pub fn new(identifier: impl Into<String>, hash: impl Into<HashVector>) -> Self {
        Self { identifier: identifier.into(), hash: hash.into() }
    }
}

/// 单条检索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub identifier: String,
    /// 与查询哈希的汉明距离，无查询时为空
    pub distance: Option<u32>,
}

/// 有序的检索结果
pub type QueryResult = Vec<Match>;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub k: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { k: DEFAULT_K, offset: 0 }
    }
}

/// 插入已存在的图片时的行为
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMode {
    /// 覆盖旧的哈希
    #[default]
    Upsert,
    /// 返回 [`crate::RetrievalError::Conflict`]
    Strict,
}

/// 检索请求
#[derive(Debug, Clone)]
pub enum Query {
    /// 以数据库中已有的图片为查询
    Existing(String),
    /// 以外部图片数据为查询
    Probe(Vec<u8>),
    /// 无查询，返回默认列表
    Unfiltered,
}

impl Query {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Existing(_) => "existing",
            Self::Probe(_) => "probe",
            Self::Unfiltered => "unfiltered",
        }
    }
}
