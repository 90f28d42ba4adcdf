use std::num::ParseIntError;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::cli::*;

/// 单个批次包含的图片数量
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// 每提交多少个批次暂停一次
pub const DEFAULT_PACING_EVERY: usize = 4;
/// 默认分类服务地址
pub const DEFAULT_ENDPOINT: &str = "https://api.clarifai.com";
/// 默认分类模型
pub const DEFAULT_MODEL_ID: &str = "aaa03c23b3724a16a56b629203edc62c";
/// 同时进行的请求数量上限
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

#[derive(Parser, Debug, Clone)]
pub struct PipelineOptions {
    /// 分类服务地址
    #[arg(long, value_name = "URL", env = "IMTAG_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// 分类模型 ID，作为请求路径的一部分
    #[arg(long, value_name = "ID", env = "IMTAG_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,
    /// 分类服务的 API key
    #[arg(long, value_name = "KEY", env = "IMTAG_API_KEY", hide_env_values = true, default_value_t = String::new())]
    pub auth_key: String,
    /// 每个请求包含的图片数量
    #[arg(short, long, value_name = "SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// 每提交 N 个批次后暂停一次，0 表示不暂停
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PACING_EVERY)]
    pub pacing_every: usize,
    /// 暂停时长，单位为毫秒
    #[arg(long = "pacing-delay-ms", value_name = "MS", default_value = "1000", value_parser = parse_millis)]
    pub pacing_delay: Duration,
    /// 等待结果时输出进度的间隔，单位为毫秒
    #[arg(long = "heartbeat-ms", value_name = "MS", default_value = "200", value_parser = parse_millis)]
    pub heartbeat: Duration,
    /// 同时进行的请求数量上限
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,
    /// 单个请求的超时时间，单位为毫秒
    #[arg(long = "request-timeout-ms", value_name = "MS", default_value = "30000", value_parser = parse_millis)]
    pub request_timeout: Duration,
    /// 单次导入的总超时时间，单位为毫秒
    #[arg(long = "ingest-timeout-ms", value_name = "MS", default_value = "300000", value_parser = parse_millis)]
    pub ingest_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            auth_key: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            pacing_every: DEFAULT_PACING_EVERY,
            pacing_delay: Duration::from_secs(1),
            heartbeat: Duration::from_millis(200),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: Duration::from_secs(30),
            ingest_timeout: Duration::from_secs(300),
        }
    }
}

impl PipelineOptions {
    /// 返回分类接口的完整地址
    pub fn outputs_url(&self) -> String {
        format!("{}/v2/models/{}/outputs", self.endpoint.trim_end_matches('/'), self.model_id)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imtag", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 导入图片列表并按标签搜索
    Search(SearchCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

fn parse_millis(s: &str) -> Result<Duration, ParseIntError> {
    Ok(Duration::from_millis(s.parse()?))
}
