use sqlx::FromRow;

/// 图片记录
#[derive(Debug, FromRow)]
pub struct ImageRow {
    /// 图片路径
    pub image_path: String,
    /// 图片感知哈希，按位存储为有符号整数
    pub hash: i64,
}
