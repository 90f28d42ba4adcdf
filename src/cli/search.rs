use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;

use crate::TagDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, PipelineOptions};
use crate::dispatch::JoinProgress;
use crate::query::QueryHit;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub pipeline: PipelineOptions,
    /// 图片列表，可以是 URL 或本地文件
    pub source: String,
    /// 搜索的标签
    pub tag: String,
    /// 显示的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = 10)]
    pub count: usize,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        let pb = ProgressBar::no_length().with_style(pb_style());
        let pb2 = pb.clone();

        let db = TagDBBuilder::new(self.pipeline.clone())
            .heartbeat(Arc::new(move |progress: JoinProgress| {
                pb2.set_length(progress.total as u64);
                pb2.set_position(progress.received as u64);
                if progress.failed > 0 {
                    pb2.set_message(format!("{} 个批次失败", progress.failed));
                }
            }))
            .open()?;

        db.ingest(&self.source).await?;
        pb.finish_and_clear();

        let result = db.query(&self.tag, self.count).await;
        print_result(&result, self)
    }
}

fn print_result(result: &[QueryHit], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for hit in result {
                println!("{}\t{}", hit.url, hit.suggestions.join(","));
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
