use thiserror::Error;

/// 检索过程中可能出现的错误
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// 输入的数据无法解码为图片
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// 数据库中不存在该图片
    #[error("image not found: {0}")]
    NotFound(String),
    /// 哈希值格式错误
    #[error("malformed hash value: {0}")]
    Format(String),
    /// 存储后端不可用
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// 操作超时
    #[error("operation timed out: {0}")]
    Timeout(String),
    /// 严格插入模式下图片已存在
    #[error("image already exists: {0}")]
    Conflict(String),
}

impl RetrievalError {
    /// 错误类型的简短名称，用于日志和指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::NotFound(_) => "not_found",
            Self::Format(_) => "format",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Conflict(_) => "conflict",
        }
    }
}

impl From<sqlx::Error> for RetrievalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Format(err.to_string())
            }
            sqlx::Error::PoolTimedOut => Self::Timeout(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Self::Conflict(err.to_string())
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<opencv::Error> for RetrievalError {
    fn from(err: opencv::Error) -> Self {
        Self::Decode(err.message)
    }
}

pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;
