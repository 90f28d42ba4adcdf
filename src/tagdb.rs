use std::time::{Duration, Instant};

use anyhow::Result;
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

use crate::aggregate::{AggregateStats, aggregate};
use crate::batch::make_batches;
use crate::classifier::{Classifier, HttpClassifier};
use crate::config::PipelineOptions;
use crate::dispatch::{Dispatcher, Heartbeat};
use crate::index::{DualIndex, IndexStats};
use crate::metrics;
use crate::query::{QueryHit, Suggestions};
use crate::source::SourceLister;

/// 一次导入的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestReport {
    /// 图片数量
    pub items: usize,
    /// 批次数量
    pub batches: usize,
    #[serde(flatten)]
    pub stats: AggregateStats,
    /// 耗时，单位为毫秒
    #[schema(value_type = u64)]
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

pub struct TagDBBuilder {
    opts: PipelineOptions,
    heartbeat: Option<Heartbeat>,
}

impl TagDBBuilder {
    pub fn new(opts: PipelineOptions) -> Self {
        Self { opts, heartbeat: None }
    }

    /// 等待分类结果时定期调用的回调
    pub fn heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// 使用 HTTP 分类服务
    pub fn open(self) -> Result<TagDB<HttpClassifier>> {
        let classifier = HttpClassifier::new(&self.opts)?;
        self.open_with(classifier)
    }

    /// 使用指定的分类器
    pub fn open_with<C: Classifier>(self, classifier: C) -> Result<TagDB<C>> {
        if self.opts.auth_key.is_empty() {
            warn!("未设置分类服务 API key");
        }
        let mut dispatcher = Dispatcher::new(classifier, self.opts.clone());
        dispatcher.set_heartbeat(self.heartbeat);
        Ok(TagDB {
            index: RwLock::new(DualIndex::new()),
            ingest_lock: Mutex::new(()),
            dispatcher,
            lister: SourceLister::new(Client::builder().timeout(self.opts.request_timeout).build()?),
            opts: self.opts,
        })
    }
}

/// 图片标签库
///
/// 持有标签索引与图片索引。导入之间互斥执行；
/// 汇总阶段持有写锁，查询持有读锁，因此查询只会看到排序完成的索引。
pub struct TagDB<C> {
    index: RwLock<DualIndex>,
    ingest_lock: Mutex<()>,
    dispatcher: Dispatcher<C>,
    lister: SourceLister,
    opts: PipelineOptions,
}

impl<C: Classifier> TagDB<C> {
    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// 获取图片列表并导入
    ///
    /// # Arguments
    ///
    /// * `source` - 图片列表地址，也可以是本地文件
    pub async fn ingest(&self, source: &str) -> Result<IngestReport> {
        let items = self.lister.list(source).await?;
        Ok(self.ingest_items(items).await)
    }

    /// 对图片地址进行分类并写入索引，重复导入会追加重复的标注
    pub async fn ingest_items(&self, items: Vec<String>) -> IngestReport {
        let _guard = self.ingest_lock.lock().await;
        let start = Instant::now();

        let n_items = items.len();
        let batches = make_batches(items, self.opts.batch_size);
        let n_batches = batches.len();
        info!("开始导入 {} 张图片，共 {} 个批次", n_items, n_batches);

        let outcomes = self.dispatcher.dispatch(batches).await;

        let stats = {
            let mut index = self.index.write().await;
            aggregate(&outcomes, &mut index)
        };

        let report =
            IngestReport { items: n_items, batches: n_batches, stats, elapsed: start.elapsed() };
        info!(
            "导入完成：成功 {} 个批次，拒绝 {} 个，失败 {} 个，新增 {} 条标注，耗时 {:.2}s",
            stats.accepted,
            stats.rejected,
            stats.failed,
            stats.annotations,
            report.elapsed.as_secs_f32()
        );
        report
    }

    /// 返回与 `tag` 最相关的前 `n` 张图片
    pub async fn query(&self, tag: &str, n: usize) -> Vec<QueryHit> {
        let hits = self.index.read().await.top_n_by_tag(tag, n);
        metrics::inc_query(!hits.is_empty());
        hits
    }

    /// 返回图片除 `exclude` 外的前三个标签
    pub async fn suggestions(&self, url: &str, exclude: &str) -> Suggestions {
        self.index.read().await.suggestions(url, exclude)
    }

    /// 图片置信度最高的前 `n` 个标签
    pub async fn image_tags(&self, url: &str, n: usize) -> Vec<(f64, String)> {
        self.index.read().await.image_tags(url, n)
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }
}
