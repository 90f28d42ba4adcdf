use std::sync::Arc;

use crate::classifier::HttpClassifier;
use crate::tagdb::TagDB;

/// 应用状态
pub struct AppState {
    /// 图片标签库
    pub db: TagDB<HttpClassifier>,
    /// 搜索未指定数量时的默认值
    pub default_count: usize,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(db: TagDB<HttpClassifier>, default_count: usize) -> Arc<Self> {
        Arc::new(AppState { db, default_count })
    }
}
