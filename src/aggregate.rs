use log::{debug, info};
use serde::Serialize;
use utoipa::ToSchema;

use crate::dispatch::BatchOutcome;
use crate::index::{Annotation, DualIndex};
use crate::metrics;

/// 一轮汇总的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AggregateStats {
    /// 成功并写入索引的批次数
    pub accepted: usize,
    /// 被分类服务拒绝的批次数
    pub rejected: usize,
    /// 请求或解析失败的批次数
    pub failed: usize,
    /// 写入的标注数量
    pub annotations: usize,
    /// 本轮涉及的标签数
    pub touched_tags: usize,
    /// 本轮涉及的图片数
    pub touched_images: usize,
}

/// 将所有成功批次中的标注写入索引，结束时对涉及的键重新排序
///
/// 失败或被拒绝的批次直接跳过，不影响其它批次。
pub fn aggregate(outcomes: &[BatchOutcome], index: &mut DualIndex) -> AggregateStats {
    let mut stats = AggregateStats::default();
    let mut writer = index.writer();

    for outcome in outcomes {
        let resp = match &outcome.result {
            Ok(resp) => resp,
            // 失败原因已在 dispatch 阶段记录
            Err(e) => {
                metrics::inc_batch(e.kind());
                stats.failed += 1;
                continue;
            }
        };
        if !resp.status.is_success() {
            info!(
                "跳过被拒绝的批次 #{}: {} {}",
                outcome.key(),
                resp.status.code,
                resp.status.description
            );
            metrics::inc_batch("rejected");
            stats.rejected += 1;
            continue;
        }
        metrics::inc_batch("ok");
        stats.accepted += 1;

        for (i, output) in resp.outputs.iter().enumerate() {
            let url = match output.input.url() {
                "" => match outcome.batch.items.get(i) {
                    Some(url) => url.as_str(),
                    None => {
                        debug!("批次 #{} 第 {} 个结果缺少图片地址", outcome.key(), i);
                        continue;
                    }
                },
                url => url,
            };
            for concept in &output.data.concepts {
                let confidence = concept.value;
                if concept.name.is_empty() || !(0.0..=1.0).contains(&confidence) {
                    debug!("忽略无效标注: {} {:?} {}", url, concept.name, concept.value);
                    continue;
                }
                writer.insert(Annotation {
                    url: url.to_string(),
                    tag: concept.name.clone(),
                    confidence,
                });
                stats.annotations += 1;
            }
        }
    }

    (stats.touched_tags, stats.touched_images) = writer.finish();
    metrics::inc_annotations(stats.annotations);

    stats
}
