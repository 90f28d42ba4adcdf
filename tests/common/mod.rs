#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use imtag::classifier::ClassifyRequest;
use imtag::config::PipelineOptions;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key";

/// 测试用分类服务，同时提供图片列表
#[derive(Default)]
pub struct MockClassifier {
    pub requests: AtomicUsize,
}

impl MockClassifier {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// 图片文件名对应的标注
fn concepts(name: &str) -> Value {
    match name {
        "a.jpg" => json!([
            {"id": "ai_1", "app_id": "main", "name": "cat", "value": 0.95},
            {"id": "ai_2", "app_id": "main", "name": "outdoor", "value": 0.80},
        ]),
        "b.jpg" => json!([
            {"id": "ai_3", "app_id": "main", "name": "pet", "value": 0.85},
            {"id": "ai_1", "app_id": "main", "name": "cat", "value": 0.90},
        ]),
        _ => json!([
            {"id": "ai_4", "app_id": "main", "name": "misc", "value": 0.5},
        ]),
    }
}

/// 地址包含 `broken` 时返回 502，包含 `garbled` 时返回无法解析的 200 响应，
/// 包含 `slow` 时延迟 5 秒响应
async fn outputs_handler(
    State(state): State<Arc<MockClassifier>>,
    headers: HeaderMap,
    Json(req): Json<ClassifyRequest>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let expected = format!("Key {API_KEY}");
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if auth != Some(expected.as_str()) {
        let body = json!({"status": {"code": 11102, "description": "Invalid API key"}});
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }
    if req.inputs.iter().any(|input| input.url().contains("broken")) {
        return (StatusCode::BAD_GATEWAY, "upstream exploded").into_response();
    }
    if req.inputs.iter().any(|input| input.url().contains("garbled")) {
        return (StatusCode::OK, "not json").into_response();
    }
    if req.inputs.iter().any(|input| input.url().contains("slow")) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let outputs = req
        .inputs
        .iter()
        .map(|input| {
            let name = input.url().rsplit('/').next().unwrap_or_default();
            json!({
                "status": {"code": 10000, "description": "Ok"},
                "input": {"data": {"image": {"url": input.url()}}},
                "data": {"concepts": concepts(name)},
            })
        })
        .collect::<Vec<_>>();
    Json(json!({"status": {"code": 10000, "description": "Ok"}, "outputs": outputs})).into_response()
}

/// 列表中的图片，`broken.jpg` 所在的批次会失败
pub fn source_list(addr: SocketAddr) -> String {
    ["a.jpg", "b.jpg", "", "c.jpg", "d.jpg", "broken.jpg", ""]
        .iter()
        .map(|name| if name.is_empty() { String::new() } else { format!("http://{addr}/img/{name}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn router(state: Arc<MockClassifier>) -> Router {
    Router::new()
        .route("/v2/models/{model}/outputs", post(outputs_handler))
        .route(
            "/images.txt",
            get(|headers: HeaderMap| async move {
                let host = headers.get("host").and_then(|v| v.to_str().ok()).unwrap_or_default();
                source_list(host.parse().unwrap())
            }),
        )
        .with_state(state)
}

/// 在随机端口上启动测试服务
pub async fn spawn_mock() -> (SocketAddr, Arc<MockClassifier>) {
    let state = Arc::new(MockClassifier::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, state)
}

/// 在独立线程中启动测试服务，供同步测试使用
pub fn spawn_mock_blocking() -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let (addr, _) = spawn_mock().await;
            tx.send(addr).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

pub fn pipeline(addr: SocketAddr) -> PipelineOptions {
    PipelineOptions {
        endpoint: format!("http://{addr}"),
        model_id: "general".to_string(),
        auth_key: API_KEY.to_string(),
        pacing_every: 2,
        pacing_delay: Duration::from_millis(10),
        heartbeat: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        ingest_timeout: Duration::from_secs(30),
        ..Default::default()
    }
}
