//! 估价接口
//! 完整估价流程编排：房产 → 文档数据 → 区域分析 → 引擎 → 落库

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::api::error::{ApiError, ApiJson};
use crate::api::utils::generate_record_id;
use crate::db::traits::{
    EvaluationHistoryEntry, EvaluationRecord, EvaluationStatus, EvaluationType,
};
use crate::model::evaluation::AreaAnalysis;
use crate::AppState;

/// 快照里保留的周边设施条数上限
const NEARBY_SNAPSHOT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct CreateEvaluationRequest {
    pub property_id: String,
    #[serde(default)]
    pub evaluation_type: Option<String>,
}

/// POST /api/evaluations
pub async fn create_evaluation(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<EvaluationRecord>), ApiError> {
    let evaluation_type = match request.evaluation_type.as_deref() {
        None => EvaluationType::Quick,
        Some(raw) => EvaluationType::from_str(raw)
            .map_err(|_| ApiError::bad_field("evaluation_type", "очаква се quick или licensed"))?,
    };

    let property = app_state
        .database
        .get_property(&request.property_id)
        .await?
        .ok_or_else(|| ApiError::not_found("имотът не е намерен"))?;

    // 文档抽取数据优先于表单自报数据
    let extracted = app_state
        .database
        .latest_document_data_for_property(&property.id)
        .await?;

    // 区域分析：地理编码失败则整体失败，不产出残缺评分
    let area = app_state.scorer.score_area(&property.address).await?;

    let valuation = app_state.engine.estimate(&property, extracted.as_ref());

    let mut nearby = area.nearby.clone();
    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby.truncate(NEARBY_SNAPSHOT_LIMIT);

    let record = EvaluationRecord {
        id: generate_record_id(),
        property_id: property.id.clone(),
        estimated_value: valuation.estimated_value.max(0),
        currency: app_state.config.valuation.currency.clone(),
        // 刻度换算的唯一位置：引擎置信度 [0,1] → 存储百分比 [0,100]。
        // 抽取/区位置信度保持 [0,1]，两套刻度并存是既定行为。
        confidence: (valuation.confidence * 100.0).round() as i64,
        evaluation_type,
        status: EvaluationStatus::Completed,
        location_score: round1(area.mean_score()),
        infrastructure_score: round1((area.transport_score + area.shopping_score) / 2.0),
        market_score: market_score(&area),
        building_score: building_score(valuation.factors.condition, valuation.factors.market),
        nearby_json: serde_json::to_string(&nearby).ok(),
        market_json: serde_json::to_string(&serde_json::json!({
            "average_price": area.average_price,
            "price_change": area.price_change,
            "infrastructure_projects": area.infrastructure_projects,
        }))
        .ok(),
        factors_json: serde_json::to_string(&valuation.factors).ok(),
        recommendations_json: serde_json::to_string(&valuation.recommendations).ok(),
        verified_by: None,
        verification_date: None,
        created_at: Utc::now(),
    };

    app_state.database.save_evaluation(&record).await?;

    info!(
        event = "api.evaluation.created",
        id = %record.id,
        property_id = %record.property_id,
        estimated_value = record.estimated_value,
        confidence = record.confidence
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/evaluations/:id
pub async fn get_evaluation(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EvaluationRecord>, ApiError> {
    app_state
        .database
        .get_evaluation(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("оценката не е намерена"))
}

/// GET /api/evaluations/property/:property_id - 最近一次估价
pub async fn latest_evaluation_for_property(
    State(app_state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<EvaluationRecord>, ApiError> {
    if app_state
        .database
        .get_property(&property_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("имотът не е намерен"));
    }

    app_state
        .database
        .latest_evaluation_for_property(&property_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("за имота няма изчислена оценка"))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<EvaluationHistoryEntry>,
}

/// GET /api/evaluations/history
pub async fn evaluation_history(
    State(app_state): State<AppState>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = app_state
        .database
        .list_evaluation_history(app_state.config.valuation.history_limit)
        .await?;
    Ok(Json(HistoryResponse { history }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEvaluationRequest {
    pub verified_by: String,
}

/// POST /api/evaluations/:id/verify - 唯一允许的估价后续变更
pub async fn verify_evaluation(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<VerifyEvaluationRequest>,
) -> Result<Json<EvaluationRecord>, ApiError> {
    let verified_by = request.verified_by.trim();
    if verified_by.is_empty() {
        return Err(ApiError::bad_field("verified_by", "името на оценителя е задължително"));
    }

    let found = app_state
        .database
        .mark_evaluation_verified(&id, verified_by, Utc::now())
        .await?;
    if !found {
        return Err(ApiError::not_found("оценката не е намерена"));
    }

    info!(event = "api.evaluation.verified", id = %id, verified_by);

    app_state
        .database
        .get_evaluation(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("оценката не е намерена"))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 行情评分：年同比变动收敛进 [0,10]
fn market_score(area: &AreaAnalysis) -> f64 {
    round1(area.price_change.clamp(0.0, 10.0))
}

/// 建筑评分：状况与建筑系数（0~100量纲）折回 [0,10]
fn building_score(condition: i64, market: i64) -> f64 {
    let combined = (condition as f64 + market as f64) / 2.0;
    round1((combined / 13.0).clamp(0.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geo::GeocodedAddress;

    fn analysis(price_change: f64) -> AreaAnalysis {
        AreaAnalysis {
            origin: GeocodedAddress {
                lat: 42.7,
                lng: 23.3,
                display_name: "гр. София".to_string(),
            },
            transport_score: 8.0,
            education_score: 6.0,
            shopping_score: 7.0,
            leisure_score: 5.0,
            average_price: 1850,
            price_change,
            infrastructure_projects: vec![],
            nearby: vec![],
        }
    }

    #[test]
    fn test_market_score_clamped() {
        assert_eq!(market_score(&analysis(8.4)), 8.4);
        assert_eq!(market_score(&analysis(14.2)), 10.0);
        assert_eq!(market_score(&analysis(-2.0)), 0.0);
    }

    #[test]
    fn test_building_score_scale() {
        // 全新тухла：condition 130、market 120 → (125 / 13) = 9.6
        assert_eq!(building_score(130, 120), 9.6);
        // 老旧панел：condition 50、market 85 → 67.5/13 = 5.2
        assert_eq!(building_score(50, 85), 5.2);
    }
}
