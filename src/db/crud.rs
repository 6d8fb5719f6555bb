use futures::Stream;
use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::ImageRow;

/// 查询图片哈希
pub async fn get_image_hash<'c, E>(executor: E, path: &str) -> Result<Option<i64>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        SELECT hash FROM images WHERE image_path = ?
        "#,
    )
    .bind(path)
    .fetch_optional(executor)
    .await
}

/// 添加图片记录，路径已存在时返回错误
pub async fn add_image<'c, E>(executor: E, path: &str, hash: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO images (image_path, hash)
        VALUES (?, ?)
        "#,
    )
    .bind(path)
    .bind(hash)
    .execute(executor)
    .await?;

    Ok(())
}

/// 添加图片记录，路径已存在时忽略，返回是否插入了新记录
pub async fn add_image_or_ignore<'c, E>(executor: E, path: &str, hash: i64) -> Result<bool>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO images (image_path, hash)
        VALUES (?, ?)
        "#,
    )
    .bind(path)
    .bind(hash)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// 更新已有图片的哈希
pub async fn update_image_hash<'c, E>(executor: E, path: &str, hash: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE images SET hash = ? WHERE image_path = ?
        "#,
    )
    .bind(hash)
    .bind(path)
    .execute(executor)
    .await?;

    Ok(())
}

/// 遍历所有图片记录，顺序不定
pub fn stream_images(executor: &SqlitePool) -> impl Stream<Item = Result<ImageRow>> + Send + '_ {
    sqlx::query_as::<_, ImageRow>(
        r#"
        SELECT image_path, hash FROM images
        "#,
    )
    .fetch(executor)
}

/// 按路径升序分页获取图片路径
pub async fn get_image_paths(executor: &SqlitePool, limit: usize, offset: usize) -> Result<Vec<String>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    sqlx::query_scalar(
        r#"
        SELECT image_path FROM images
        ORDER BY image_path ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// 查询图片数量
pub async fn get_count(executor: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM images
        "#,
    )
    .fetch_one(executor)
    .await
}

/// 读取元数据
pub async fn get_meta(executor: &SqlitePool, key: &str) -> Result<Option<String>> {
    sqlx::query_scalar(
        r#"
        SELECT value FROM meta WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(executor)
    .await
}

/// 写入元数据
pub async fn set_meta(executor: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meta (key, value)
        VALUES (?, ?)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await?;

    Ok(())
}
