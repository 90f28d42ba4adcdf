use clap::Parser;
use log::{error, info};
use tokio::net::TcpListener;

use crate::cli::SubCommandExtend;
use crate::config::PipelineOptions;
use crate::{Opts, TagDBBuilder, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub pipeline: PipelineOptions,
    /// 监听地址，对外提供服务时使用 0.0.0.0:3030
    #[arg(long, value_name = "ADDR", env = "IMTAG_ADDR", default_value = "127.0.0.1:3030")]
    pub addr: String,
    /// 启动前导入的图片列表，可以是 URL 或本地文件
    #[arg(long, value_name = "URL")]
    pub source: Option<String>,
    /// 搜索未指定数量时返回的图片数量
    #[arg(long, value_name = "COUNT", default_value_t = 10)]
    pub count: usize,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, _opts: &Opts) -> anyhow::Result<()> {
        let db = TagDBBuilder::new(self.pipeline.clone()).open()?;

        if let Some(source) = &self.source {
            // 列表获取失败时仍然启动服务，之后可以通过 /ingest 重新导入
            if let Err(e) = db.ingest(source).await {
                error!("导入图片列表失败: {e:#}");
            }
        }

        // 创建应用状态
        let state = server::AppState::new(db, self.count);

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
