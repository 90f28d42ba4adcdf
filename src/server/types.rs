use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::query::QueryHit;

/// 搜索请求参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// 搜索的标签
    pub tag: String,
    /// 返回的图片数量，不填则使用服务端默认值
    pub count: Option<usize>,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 按置信度排序的图片与相关标签
    pub result: Vec<QueryHit>,
}

/// 相关标签请求参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestRequest {
    /// 图片地址
    pub url: String,
    /// 排除的标签
    #[serde(default)]
    pub exclude: String,
}

/// 相关标签响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

/// 导入请求参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// 图片列表地址
    pub source: String,
}
