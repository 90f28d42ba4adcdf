use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API错误类型
pub enum AppError {
    /// 请求参数有误
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Internal(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Something went wrong: {err:#}"))
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
