use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::Match;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
    pub k: Option<usize>,
    pub offset: Option<usize>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 返回的结果数量
    pub k: Option<usize>,
    /// 跳过的结果数量
    pub offset: Option<usize>,
}

/// 以已有图片搜索的参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct SimilarRequest {
    /// 数据库中的图片标识
    pub path: String,
    pub k: Option<usize>,
    pub offset: Option<usize>,
}

/// 列出图片的参数
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListRequest {
    pub k: Option<usize>,
    pub offset: Option<usize>,
}

/// 单条结果
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchItem {
    /// 图片标识
    pub identifier: String,
    /// 汉明距离，列出图片时为空
    pub distance: Option<u32>,
}

impl From<Match> for MatchItem {
    fn from(m: Match) -> Self {
        Self { identifier: m.identifier, distance: m.distance }
    }
}

/// 检索响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    /// 耗时，单位为毫秒
    pub time: u64,
    /// 按距离升序排列的结果
    pub result: Vec<MatchItem>,
}
