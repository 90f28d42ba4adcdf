use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until, timeout};

use crate::batch::Batch;
use crate::classifier::{Classifier, ClassifyResponse};
use crate::config::PipelineOptions;
use crate::error::BatchError;
use crate::metrics;

/// 一个批次的处理结果
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch: Arc<Batch>,
    pub result: Result<ClassifyResponse, BatchError>,
}

impl BatchOutcome {
    pub fn key(&self) -> usize {
        self.batch.key
    }
}

/// 等待结果时的进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinProgress {
    /// 已收到的结果数
    pub received: usize,
    /// 已提交的批次数
    pub dispatched: usize,
    /// 批次总数
    pub total: usize,
    /// 失败的批次数
    pub failed: usize,
}

pub type Heartbeat = Arc<dyn Fn(JoinProgress) + Send + Sync>;

/// 并发提交批次并汇总结果
///
/// 每个批次一个任务，同时运行的任务数不超过 `max_in_flight`；
/// 每提交 `pacing_every` 个批次暂停 `pacing_delay`，用于避开上游的频率限制。
/// 无论成功与否，每个批次都恰好产生一个 [`BatchOutcome`]。
pub struct Dispatcher<C> {
    classifier: Arc<C>,
    opts: PipelineOptions,
    heartbeat: Option<Heartbeat>,
}

impl<C: Classifier> Dispatcher<C> {
    pub fn new(classifier: C, opts: PipelineOptions) -> Self {
        Self { classifier: Arc::new(classifier), opts, heartbeat: None }
    }

    pub fn set_heartbeat(&mut self, heartbeat: Option<Heartbeat>) {
        self.heartbeat = heartbeat;
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// 提交所有批次，返回按批次序号排序的结果
    pub async fn dispatch(&self, batches: Vec<Batch>) -> Vec<BatchOutcome> {
        let total = batches.len();
        let batches = batches.into_iter().map(Arc::new).collect::<Vec<_>>();
        if total == 0 {
            return vec![];
        }

        let deadline = Instant::now() + self.opts.ingest_timeout;
        let limiter = Arc::new(Semaphore::new(self.opts.max_in_flight.max(1)));
        let (tx, mut rx) = mpsc::channel(total);
        let mut tasks = JoinSet::new();
        let mut dispatched = 0;
        let mut expired = false;

        for batch in &batches {
            if self.opts.pacing_every > 0 && dispatched > 0 && dispatched % self.opts.pacing_every == 0
            {
                debug!("已提交 {} 个批次，暂停 {:?}", dispatched, self.opts.pacing_delay);
                if tokio::time::timeout_at(deadline, sleep(self.opts.pacing_delay)).await.is_err() {
                    expired = true;
                    break;
                }
            }

            let permit = match tokio::time::timeout_at(deadline, limiter.clone().acquire_owned()).await
            {
                Ok(permit) => permit.expect("并发限制信号量不会被关闭"),
                Err(_) => {
                    expired = true;
                    break;
                }
            };

            let tx = tx.clone();
            let batch = batch.clone();
            let classifier = self.classifier.clone();
            let request_timeout = self.opts.request_timeout;
            tasks.spawn(async move {
                let start = Instant::now();
                let result = match timeout(request_timeout, classifier.classify(&batch)).await {
                    Ok(result) => result,
                    Err(_) => Err(BatchError::Timeout(request_timeout)),
                };
                metrics::observe_batch_duration(start.elapsed());
                drop(permit);
                // 接收端容量等于批次总数，不会阻塞
                let _ = tx.send(BatchOutcome { batch, result }).await;
            });
            dispatched += 1;
        }
        drop(tx);

        info!("已提交 {}/{} 个批次，等待结果", dispatched, total);

        let mut outcomes = Vec::with_capacity(total);
        let mut failed = 0;
        // interval 不接受零周期
        let period = self.opts.heartbeat.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expire = sleep_until(deadline);
        tokio::pin!(expire);

        while !expired && outcomes.len() < dispatched {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(outcome) => {
                        if let Err(e) = &outcome.result {
                            warn!("批次 #{} 失败: {}", outcome.key(), e);
                            failed += 1;
                        }
                        outcomes.push(outcome);
                    }
                    // 所有发送端都已释放，剩余任务没能返回结果
                    None => break,
                },
                _ = ticker.tick() => {
                    self.beat(JoinProgress { received: outcomes.len(), dispatched, total, failed });
                }
                _ = &mut expire => {
                    warn!("导入超时，取消剩余 {} 个批次", total - outcomes.len());
                    expired = true;
                }
            }
        }
        tasks.abort_all();

        // 超时后通道中可能还有已完成但未取出的结果
        while let Ok(outcome) = rx.try_recv() {
            if let Err(e) = &outcome.result {
                warn!("批次 #{} 失败: {}", outcome.key(), e);
                failed += 1;
            }
            outcomes.push(outcome);
        }

        if outcomes.len() < total {
            let seen = outcomes.iter().map(BatchOutcome::key).collect::<HashSet<_>>();
            for batch in batches.iter().filter(|b| !seen.contains(&b.key)) {
                let error = if expired { BatchError::Deadline } else { BatchError::Lost };
                warn!("批次 #{} 失败: {}", batch.key, error);
                outcomes.push(BatchOutcome { batch: batch.clone(), result: Err(error) });
                failed += 1;
            }
        }
        self.beat(JoinProgress { received: total, dispatched, total, failed });

        outcomes.sort_by_key(BatchOutcome::key);
        outcomes
    }

    fn beat(&self, progress: JoinProgress) {
        match &self.heartbeat {
            Some(heartbeat) => heartbeat(progress),
            None => debug!("等待结果: {}/{}", progress.received, progress.dispatched),
        }
    }
}
