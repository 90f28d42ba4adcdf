use serde::{Deserialize, Serialize};

/// 分类服务表示成功的状态码
pub const STATUS_SUCCESS: i64 = 10000;

/// 分类请求体，`{"inputs": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifyRequest {
    pub inputs: Vec<Input>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Input {
    pub data: InputData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputData {
    pub image: Image,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Image {
    pub url: String,
}

impl Input {
    pub fn image_url(url: impl Into<String>) -> Self {
        Self { data: InputData { image: Image { url: url.into() } } }
    }

    pub fn url(&self) -> &str {
        &self.data.image.url
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Status {
    pub code: i64,
    pub description: String,
}

impl Status {
    pub fn is_success(&self) -> bool {
        self.code == STATUS_SUCCESS
    }
}

/// 分类服务的响应，只保留需要的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifyResponse {
    pub status: Status,
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Output {
    pub status: Status,
    pub input: Input,
    pub data: OutputData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputData {
    pub concepts: Vec<Concept>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Concept {
    pub id: String,
    pub app_id: String,
    pub name: String,
    pub value: f64,
}
