use std::time::Duration;

use thiserror::Error;

/// 单个批次失败的原因
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("请求失败: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("读取响应失败: {0}")]
    Body(#[source] reqwest::Error),
    #[error("HTTP 状态异常: {status}")]
    Http { status: u16, source: serde_json::Error },
    #[error("解析响应失败: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    #[error("超过导入时限，批次被取消")]
    Deadline,
    #[error("任务异常退出，未返回结果")]
    Lost,
}

impl BatchError {
    /// 用于指标标签的简短名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Body(_) => "body",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::Deadline => "deadline",
            Self::Lost => "lost",
        }
    }
}
