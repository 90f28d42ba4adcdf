use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use log::{error, info};

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::index::IndexStats;
use crate::metrics;
use crate::tagdb::IngestReport;

/// 按标签搜索图片
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let tag = data.tag.trim();
    if tag.is_empty() {
        return Err(AppError::BadRequest("标签不能为空".to_string()));
    }
    let count = data.count.unwrap_or(state.default_count);

    let start = Instant::now();
    let result = state.db.query(tag, count).await;
    info!("搜索标签 {:?}，返回 {} 张图片", tag, result.len());

    Ok(Json(SearchResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 获取图片的相关标签
#[utoipa::path(
    post,
    path = "/suggest",
    request_body = SuggestRequest,
    responses(
        (status = 200, body = SuggestResponse),
    )
)]
pub async fn suggest_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>> {
    let suggestions = state.db.suggestions(&data.url, &data.exclude).await;
    Ok(Json(SuggestResponse { suggestions: suggestions.into_vec() }))
}

/// 导入新的图片列表，重复导入会追加重复的标注
#[utoipa::path(
    post,
    path = "/ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, body = IngestReport),
    )
)]
pub async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<IngestRequest>,
) -> Result<Json<IngestReport>> {
    if data.source.trim().is_empty() {
        return Err(AppError::BadRequest("图片列表地址不能为空".to_string()));
    }
    let report = state.db.ingest(data.source.trim()).await.inspect_err(|e| {
        error!("导入失败: {e:#}");
    })?;
    Ok(Json(report))
}

/// 索引统计信息
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, body = IndexStats),
    )
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<IndexStats>> {
    Ok(Json(state.db.stats().await))
}

/// prometheus 指标
pub async fn metrics_handler() -> Result<impl IntoResponse> {
    let body = metrics::gather_text()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
