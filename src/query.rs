use serde::Serialize;
use smallvec::SmallVec;
use utoipa::ToSchema;

use crate::index::DualIndex;

/// 每张图片最多给出的相关标签数量
pub const MAX_SUGGESTIONS: usize = 3;

pub type Suggestions = SmallVec<[String; MAX_SUGGESTIONS]>;

/// 一条搜索结果：图片地址与相关标签
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QueryHit {
    /// 图片地址
    pub url: String,
    /// 相关标签，最多三个
    #[schema(value_type = Vec<String>)]
    pub suggestions: Suggestions,
}

impl DualIndex {
    /// 返回与 `tag` 最相关的前 `n` 张图片，并为每张图片附上相关标签
    ///
    /// 标签不存在时返回空列表
    pub fn top_n_by_tag(&self, tag: &str, n: usize) -> Vec<QueryHit> {
        let Some(list) = self.tag(tag) else {
            return vec![];
        };
        list.top(n)
            .iter()
            .map(|(_, url)| QueryHit { url: url.clone(), suggestions: self.suggestions(url, tag) })
            .collect()
    }

    /// 按置信度顺序返回图片的前三个标签，跳过 `exclude`
    pub fn suggestions(&self, url: &str, exclude: &str) -> Suggestions {
        let Some(list) = self.image(url) else {
            return Suggestions::new();
        };
        list.iter()
            .map(|(_, tag)| tag)
            .filter(|tag| tag.as_str() != exclude)
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    /// 图片置信度最高的前 `n` 个标签
    pub fn image_tags(&self, url: &str, n: usize) -> Vec<(f64, String)> {
        self.image(url).map(|list| list.top(n).to_vec()).unwrap_or_default()
    }
}
