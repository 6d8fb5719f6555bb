use std::sync::Arc;

use crate::engine::RetrievalEngine;
use crate::store::SqliteStore;
use crate::types::Page;

/// 应用状态
pub struct AppState {
    /// 检索引擎
    pub engine: RetrievalEngine<SqliteStore>,
    /// 请求未指定时使用的分页参数
    pub page: Page,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(engine: RetrievalEngine<SqliteStore>, page: Page) -> Arc<Self> {
        Arc::new(AppState { engine, page })
    }

    /// 用请求参数覆盖默认分页
    pub fn page(&self, k: Option<usize>, offset: Option<usize>) -> Page {
        Page { k: k.unwrap_or(self.page.k), offset: offset.unwrap_or(self.page.offset) }
    }
}
