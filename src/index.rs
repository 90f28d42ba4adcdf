use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;

/// 分类服务给出的一条标注：图片、标签与置信度
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub url: String,
    pub tag: String,
    pub confidence: f64,
}

/// 按置信度降序排列的列表，置信度相同时先插入者在前
#[derive(Debug, Clone, PartialEq)]
pub struct RankedList<K> {
    entries: Vec<(f64, K)>,
}

impl<K> Default for RankedList<K> {
    fn default() -> Self {
        Self { entries: vec![] }
    }
}

impl<K> RankedList<K> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, K)> {
        self.entries.iter()
    }

    /// 前 `n` 个条目，`n` 超出长度时返回全部
    pub fn top(&self, n: usize) -> &[(f64, K)] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// 追加一个条目，需要之后调用 [`RankedList::sort`] 恢复顺序
    fn push(&mut self, confidence: f64, key: K) {
        self.entries.push((confidence, key));
    }

    /// 稳定排序，置信度相同的条目保持插入顺序
    fn sort(&mut self) {
        // 插入前已过滤 NaN
        self.entries.sort_by(|a, b| b.0.total_cmp(&a.0));
    }

    #[cfg(test)]
    pub(crate) fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].0 >= w[1].0)
    }
}

pub type TagIndex = HashMap<String, RankedList<String>>;
pub type ImageIndex = HashMap<String, RankedList<String>>;

/// 索引规模统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IndexStats {
    /// 标签数量
    pub tags: usize,
    /// 图片数量
    pub images: usize,
    /// 标注总数
    pub annotations: usize,
}

/// 标签 → 图片、图片 → 标签 两个互为镜像的排序索引
///
/// 每条标注同时写入两个索引。写入通过 [`IndexWriter`] 进行，
/// 写入结束时只对本轮涉及的键重新排序，因此查询看到的列表始终有序。
#[derive(Debug, Default)]
pub struct DualIndex {
    pub(crate) by_tag: TagIndex,
    pub(crate) by_image: ImageIndex,
    annotations: usize,
}

impl DualIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一轮写入
    pub fn writer(&mut self) -> IndexWriter<'_> {
        IndexWriter { index: self, tags: HashSet::new(), images: HashSet::new() }
    }

    pub fn tag(&self, tag: &str) -> Option<&RankedList<String>> {
        self.by_tag.get(tag)
    }

    pub fn image(&self, url: &str) -> Option<&RankedList<String>> {
        self.by_image.get(url)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            tags: self.by_tag.len(),
            images: self.by_image.len(),
            annotations: self.annotations,
        }
    }
}

/// 一轮写入，drop 或 [`IndexWriter::finish`] 时对涉及的键重新排序
pub struct IndexWriter<'a> {
    index: &'a mut DualIndex,
    tags: HashSet<String>,
    images: HashSet<String>,
}

impl IndexWriter<'_> {
    pub fn insert(&mut self, annotation: Annotation) {
        let Annotation { url, tag, confidence } = annotation;
        let index = &mut *self.index;

        index.by_tag.entry(tag.clone()).or_default().push(confidence, url.clone());
        index.by_image.entry(url.clone()).or_default().push(confidence, tag.clone());
        index.annotations += 1;

        self.tags.insert(tag);
        self.images.insert(url);
    }

    /// 结束写入，返回本轮涉及的 (标签数, 图片数)
    pub fn finish(mut self) -> (usize, usize) {
        self.sort_touched()
    }

    fn sort_touched(&mut self) -> (usize, usize) {
        let touched = (self.tags.len(), self.images.len());
        for tag in self.tags.drain() {
            if let Some(list) = self.index.by_tag.get_mut(&tag) {
                list.sort();
            }
        }
        for url in self.images.drain() {
            if let Some(list) = self.index.by_image.get_mut(&url) {
                list.sort();
            }
        }
        touched
    }
}

impl Drop for IndexWriter<'_> {
    fn drop(&mut self) {
        self.sort_touched();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(url: &str, tag: &str, confidence: f64) -> Annotation {
        Annotation { url: url.to_string(), tag: tag.to_string(), confidence }
    }

    #[test]
    fn test_mirrored_insert() {
        let mut index = DualIndex::new();
        let mut writer = index.writer();
        writer.insert(ann("A", "cat", 0.95));
        writer.insert(ann("A", "outdoor", 0.80));
        writer.insert(ann("B", "cat", 0.90));
        writer.insert(ann("B", "pet", 0.85));
        assert_eq!(writer.finish(), (3, 2));

        let cat = index.tag("cat").unwrap();
        assert_eq!(cat.iter().cloned().collect::<Vec<_>>(), vec![
            (0.95, "A".to_string()),
            (0.90, "B".to_string())
        ]);
        let b = index.image("B").unwrap();
        assert_eq!(b.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>(), vec!["cat", "pet"]);

        let total_by_tag: usize = index.by_tag.values().map(RankedList::len).sum();
        let total_by_image: usize = index.by_image.values().map(RankedList::len).sum();
        assert_eq!(total_by_tag, 4);
        assert_eq!(total_by_image, 4);
        assert_eq!(index.stats(), IndexStats { tags: 3, images: 2, annotations: 4 });
    }

    #[test]
    fn test_sorted_after_write_with_stable_ties() {
        let mut index = DualIndex::new();
        let mut writer = index.writer();
        writer.insert(ann("low", "dog", 0.1));
        writer.insert(ann("first", "dog", 0.5));
        writer.insert(ann("high", "dog", 0.9));
        writer.insert(ann("second", "dog", 0.5));
        drop(writer);

        let dog = index.tag("dog").unwrap();
        assert!(dog.is_sorted());
        let order = dog.iter().map(|(_, u)| u.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["high", "first", "second", "low"]);

        // 后一轮写入的同分条目排在已有条目之后
        let mut writer = index.writer();
        writer.insert(ann("third", "dog", 0.5));
        writer.finish();
        let order = index.tag("dog").unwrap().iter().map(|(_, u)| u.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["high", "first", "second", "third", "low"]);
    }

    #[test]
    fn test_append_only() {
        let mut index = DualIndex::new();
        for _ in 0..2 {
            let mut writer = index.writer();
            writer.insert(ann("A", "cat", 0.95));
            writer.insert(ann("A", "outdoor", 0.8));
            writer.finish();
        }
        assert_eq!(index.tag("cat").unwrap().len(), 2);
        assert_eq!(index.image("A").unwrap().len(), 4);
    }

    #[test]
    fn test_top() {
        let mut index = DualIndex::new();
        let mut writer = index.writer();
        writer.insert(ann("A", "cat", 0.3));
        writer.insert(ann("B", "cat", 0.7));
        writer.finish();
        let cat = index.tag("cat").unwrap();
        assert_eq!(cat.top(1), &[(0.7, "B".to_string())]);
        assert_eq!(cat.top(10).len(), 2);
        assert!(cat.top(0).is_empty());
    }
}
