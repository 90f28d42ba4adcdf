use std::future::Future;

use anyhow::Result;
use log::debug;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};

pub mod types;

pub use self::types::*;
use crate::batch::Batch;
use crate::config::PipelineOptions;
use crate::error::BatchError;

/// 图片分类服务
pub trait Classifier: Send + Sync + 'static {
    /// 对一个批次发起一次请求，返回解码后的响应
    fn classify(
        &self,
        batch: &Batch,
    ) -> impl Future<Output = Result<ClassifyResponse, BatchError>> + Send;
}

/// 通过 HTTP 访问的分类服务
///
/// 请求超时由 [`Dispatcher`](crate::dispatch::Dispatcher) 统一控制。
pub struct HttpClassifier {
    http: Client,
    url: String,
    auth: HeaderValue,
}

impl HttpClassifier {
    pub fn new(opts: &PipelineOptions) -> Result<Self> {
        let http = Client::builder().build()?;
        let mut auth = HeaderValue::from_str(&format!("Key {}", opts.auth_key))?;
        auth.set_sensitive(true);
        Ok(Self { http, url: opts.outputs_url(), auth })
    }
}

impl Classifier for HttpClassifier {
    async fn classify(&self, batch: &Batch) -> Result<ClassifyResponse, BatchError> {
        debug!("提交批次 #{}（{} 张图片）", batch.key, batch.len());
        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, self.auth.clone())
            .json(&batch.request())
            .send()
            .await
            .map_err(BatchError::Transport)?;

        // `bytes` 按值消耗响应，任何分支返回时连接都会被释放
        let status = response.status();
        let body = response.bytes().await.map_err(BatchError::Body)?;

        match serde_json::from_slice(&body) {
            Ok(resp) => Ok(resp),
            Err(source) if !status.is_success() => {
                Err(BatchError::Http { status: status.as_u16(), source })
            }
            Err(e) => Err(BatchError::Decode(e)),
        }
    }
}
