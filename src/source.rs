use anyhow::{Context, Result};
use log::info;
use reqwest::Client;

/// 获取图片地址列表，支持 HTTP 地址与本地文件
pub struct SourceLister {
    http: Client,
}

impl SourceLister {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub async fn list(&self, location: &str) -> Result<Vec<String>> {
        let body = if is_remote(location) {
            info!("获取图片列表: {}", location);
            self.http
                .get(location)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .with_context(|| format!("无法获取图片列表: {location}"))?
                .text()
                .await
                .with_context(|| format!("无法读取图片列表: {location}"))?
        } else {
            info!("读取图片列表文件: {}", location);
            tokio::fs::read_to_string(location)
                .await
                .with_context(|| format!("无法读取图片列表文件: {location}"))?
        };

        let urls = parse_source_list(&body);
        info!("图片列表共 {} 项", urls.len());
        Ok(urls)
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// 按行切分图片列表，忽略空行与首尾空白
pub fn parse_source_list(body: &str) -> Vec<String> {
    body.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
}
