//! 文档接口
//! 扫描文档登记（含服务端字段抽取）与按房产查询

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiJson};
use crate::api::utils::{clamp_unit_confidence, generate_record_id};
use crate::db::traits::{DocumentDataRecord, DocumentRecord, DocumentStatus, DocumentType};
use crate::util::extract;
use crate::AppState;

/// 客户端提交的抽取数据（字段与落库记录一致，全部可选）
#[derive(Debug, Default, Deserialize)]
pub struct ExtractedDataPayload {
    pub square_meters: Option<f64>,
    pub construction_year: Option<i32>,
    pub address: Option<String>,
    pub rooms: Option<i32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub owner: Option<String>,
    pub cadastral_number: Option<String>,
    pub tax_assessment_value: Option<f64>,
    pub document_price: Option<f64>,
}

impl ExtractedDataPayload {
    fn is_empty(&self) -> bool {
        self.square_meters.is_none()
            && self.construction_year.is_none()
            && self.address.is_none()
            && self.rooms.is_none()
            && self.floor.is_none()
            && self.total_floors.is_none()
            && self.owner.is_none()
            && self.cadastral_number.is_none()
            && self.tax_assessment_value.is_none()
            && self.document_price.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub property_id: String,
    /// 缺失时依据OCR文本关键词判定
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub ocr_text: Option<String>,
    /// OCR置信度 [0,1]
    #[serde(default)]
    pub confidence: Option<f64>,
    /// 客户端已抽取的结构化数据；缺失时由服务端对OCR文本抽取
    #[serde(default)]
    pub extracted_data: Option<ExtractedDataPayload>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: DocumentRecord,
    /// 抽取数据可能不存在，消费方必须容忍空值
    pub data: Option<DocumentDataRecord>,
}

/// POST /api/documents
pub async fn create_document(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let property = app_state
        .database
        .get_property(&request.property_id)
        .await?;
    if property.is_none() {
        return Err(ApiError::not_found("имотът не е намерен"));
    }

    let ocr_text = request
        .ocr_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    // 类型：显式声明优先，其次按文本关键词判定；两者皆无则拒绝
    let doc_type = match request.doc_type.as_deref() {
        Some(raw) => DocumentType::from_str(raw).map_err(|_| {
            ApiError::bad_field(
                "doc_type",
                "очаква се notary_act, sketch или tax_assessment",
            )
        })?,
        None => ocr_text.and_then(extract::classify).ok_or_else(|| {
            ApiError::bad_field("doc_type", "типът не е подаден и не може да бъде определен")
        })?,
    };

    let now = Utc::now();
    let document_id = generate_record_id();

    let document = DocumentRecord {
        id: document_id.clone(),
        property_id: request.property_id.clone(),
        doc_type,
        status: if ocr_text.is_some() {
            DocumentStatus::Processed
        } else {
            DocumentStatus::Pending
        },
        ocr_text: ocr_text.map(|t| t.to_string()),
        confidence: request.confidence.map(clamp_unit_confidence),
        created_at: now,
        updated_at: now,
    };

    // 抽取数据来源：客户端提交优先，否则服务端跑规则表；全空则不建数据行
    let data = match request.extracted_data {
        Some(payload) if !payload.is_empty() => Some(DocumentDataRecord {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.clone(),
            square_meters: payload.square_meters,
            construction_year: payload.construction_year,
            address: payload.address,
            rooms: payload.rooms,
            floor: payload.floor,
            total_floors: payload.total_floors,
            owner: payload.owner,
            cadastral_number: payload.cadastral_number,
            tax_assessment_value: payload.tax_assessment_value,
            document_price: payload.document_price,
            created_at: now,
        }),
        _ => ocr_text.and_then(|text| {
            let fields = extract::extract(text);
            if fields == extract::ExtractedFields::default() {
                return None;
            }
            Some(DocumentDataRecord {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.clone(),
                square_meters: fields.square_meters,
                construction_year: fields.construction_year,
                address: fields.address,
                rooms: fields.rooms,
                floor: fields.floor,
                total_floors: fields.total_floors,
                owner: fields.owner,
                cadastral_number: fields.cadastral_number,
                tax_assessment_value: fields.tax_assessment_value,
                document_price: fields.price,
                created_at: now,
            })
        }),
    };

    app_state
        .database
        .save_document_with_data(&document, data.as_ref())
        .await?;

    info!(
        event = "api.document.created",
        id = %document.id,
        property_id = %document.property_id,
        doc_type = doc_type.as_str(),
        has_data = data.is_some()
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse { document, data }),
    ))
}

/// GET /api/properties/:property_id/documents
pub async fn list_property_documents(
    State(app_state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    if app_state
        .database
        .get_property(&property_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("имотът не е намерен"));
    }

    let documents = app_state
        .database
        .list_documents_by_property(&property_id)
        .await?;

    let mut responses = Vec::with_capacity(documents.len());
    for document in documents {
        let data = app_state.database.get_document_data(&document.id).await?;
        responses.push(DocumentResponse { document, data });
    }

    Ok(Json(responses))
}
