//! 房间照片分类接口
//! 委托给注入的分类器；当前为桩模型，真实模型接入后此处不变

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::api::error::ApiError;
use crate::model::evaluation::RoomClassification;
use crate::AppState;

/// POST /api/rooms/classify - 请求体为照片原始字节
pub async fn classify_room(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<RoomClassification>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_field("body", "очаква се изображение в тялото на заявката"));
    }

    let result = app_state
        .classifier
        .classify_room(&body)
        .await
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?;

    debug!(
        event = "api.rooms.classified",
        room_type = %result.room_type,
        confidence = result.confidence
    );

    Ok(Json(result))
}
