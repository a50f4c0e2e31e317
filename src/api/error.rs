//! API错误类型
//! 统一的 `{error: {message, details?}}` 响应体与HTTP状态码映射

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::valuation::AreaAnalysisError;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// API层错误，带HTTP状态映射
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 校验失败：在任何外部调用前拒绝，携带字段级明细
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Value>,
    },
    /// 资源不存在，与上游故障严格区分
    #[error("{0}")]
    NotFound(String),
    /// 上游服务商故障：已记录日志，不做静默重试
    #[error("{0}")]
    Upstream(String),
    #[error("вътрешна грешка: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::BadRequest {
            details: Some(serde_json::json!({ "field": field, "reason": message })),
            message,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::BadRequest { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            ApiError::Upstream(message) => {
                tracing::warn!(event = "api.upstream_error", error = %message);
                (StatusCode::BAD_GATEWAY, message, None)
            }
            ApiError::Internal(detail) => {
                tracing::error!(event = "api.internal_error", error = %detail);
                // 内部细节不外泄
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "възникна вътрешна грешка".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { message, details },
        };
        (status, Json(body)).into_response()
    }
}

/// Json包装：反序列化失败统一映射为400 + `{error:{message}}`，
/// 不透出axum默认的纯文本422
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}

impl From<AreaAnalysisError> for ApiError {
    fn from(err: AreaAnalysisError) -> Self {
        match err {
            AreaAnalysisError::OriginNotFound => {
                ApiError::bad_field("address", "адресът не може да бъде геокодиран")
            }
            AreaAnalysisError::Upstream(e) => ApiError::Upstream(format!("{e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_bad_request_returns_400_with_details() {
        let response = ApiError::bad_field("area", "площта трябва да е положителна").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "площта трябва да е положителна");
        assert_eq!(json["error"]["details"]["field"], "area");
    }

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let response = ApiError::not_found("имотът не е намерен").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "имотът не е намерен");
        assert!(json["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_upstream_returns_502() {
        let response = ApiError::Upstream("геокодирането върна грешка".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let response = ApiError::Internal("pool exhausted".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(!json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("pool exhausted"));
    }

    #[tokio::test]
    async fn test_origin_not_found_maps_to_bad_request() {
        let api_err: ApiError = AreaAnalysisError::OriginNotFound.into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
