use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::metrics;
use crate::types::{Query, QueryResult};

async fn query(state: &AppState, query: Query, k: Option<usize>, offset: Option<usize>) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let result: QueryResult = state.engine.run(query, state.page(k, offset)).await?;
    Ok(Json(QueryResponse {
        time: start.elapsed().as_millis() as u64,
        result: result.into_iter().map(MatchItem::from).collect(),
    }))
}

/// 上传一张图片，搜索相似图片
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = QueryResponse),
        (status = 400, description = "上传的文件不是图片"),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(data): TypedMultipart<SearchRequest>,
) -> Result<Json<QueryResponse>> {
    info!("正在搜索上传图片，大小 {} 字节", data.file.len());
    query(&state, Query::Probe(data.file.to_vec()), data.k, data.offset).await
}

/// 搜索与数据库中某张图片相似的图片
#[utoipa::path(
    post,
    path = "/similar",
    request_body = SimilarRequest,
    responses(
        (status = 200, body = QueryResponse),
        (status = 404, description = "图片不存在"),
    )
)]
pub async fn similar_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SimilarRequest>,
) -> Result<Json<QueryResponse>> {
    info!("正在搜索相似图片: {}", data.path);
    query(&state, Query::Existing(data.path), data.k, data.offset).await
}

/// 列出数据库中的图片
#[utoipa::path(
    post,
    path = "/list",
    request_body = ListRequest,
    responses(
        (status = 200, body = QueryResponse),
    )
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<ListRequest>,
) -> Result<Json<QueryResponse>> {
    query(&state, Query::Unfiltered, data.k, data.offset).await
}

/// Prometheus 指标
pub async fn metrics_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], metrics::gather_text())
}
