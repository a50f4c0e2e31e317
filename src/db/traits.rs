use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 房产记录 - 表单提交时创建，之后仅能通过重新提交替换
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    pub address: String,
    /// 建筑面积（平方米），必须为正数
    pub area: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// 距最近地铁站的米数（表单可选项）
    pub metro_distance_m: Option<i64>,
    /// 周边绿地数量（表单可选项）
    pub green_zones: Option<i64>,
    pub price_range: Option<String>,
    pub construction_type: Option<String>,
    pub construction_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// 文档类型 - 固定的三种扫描件类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    NotaryAct,
    Sketch,
    TaxAssessment,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::NotaryAct => "notary_act",
            DocumentType::Sketch => "sketch",
            DocumentType::TaxAssessment => "tax_assessment",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "notary_act" => Ok(DocumentType::NotaryAct),
            "sketch" => Ok(DocumentType::Sketch),
            "tax_assessment" => Ok(DocumentType::TaxAssessment),
            _ => Err(()),
        }
    }
}

/// 文档处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "processed" => Ok(DocumentStatus::Processed),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 扫描文档记录 - 必须归属于一个已存在的房产
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub property_id: String,
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    /// OCR原始文本（识别失败时为空）
    pub ocr_text: Option<String>,
    /// OCR置信度，范围 [0,1]
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 从文档文本中抽取的结构化字段，每文档零或一条
///
/// 业务字段全部可选：抽取器找不到就留空，绝不填默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDataRecord {
    pub id: String,
    pub document_id: String,
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
    pub created_at: DateTime<Utc>,
}

/// 估价类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Quick,
    Licensed,
}

impl EvaluationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::Quick => "quick",
            EvaluationType::Licensed => "licensed",
        }
    }
}

impl FromStr for EvaluationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(EvaluationType::Quick),
            "licensed" => Ok(EvaluationType::Licensed),
            _ => Err(()),
        }
    }
}

/// 估价状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Completed,
    Failed,
    Verified,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Failed => "failed",
            EvaluationStatus::Verified => "verified",
        }
    }
}

impl FromStr for EvaluationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(EvaluationStatus::Pending),
            "completed" => Ok(EvaluationStatus::Completed),
            "failed" => Ok(EvaluationStatus::Failed),
            "verified" => Ok(EvaluationStatus::Verified),
            _ => Err(()),
        }
    }
}

/// 估价结果记录 - 每次计算完成后写入一条，归属于一个房产
///
/// confidence 以百分比 [0,100] 存储；引擎内部置信度为 [0,1]，
/// 两套刻度是有意保留的，换算只发生在构造本记录的一处（见 api::evaluations）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: String,
    pub property_id: String,
    /// 估算市值，非负整数
    pub estimated_value: i64,
    pub currency: String,
    /// 置信度百分比 [0,100]
    pub confidence: i64,
    pub evaluation_type: EvaluationType,
    pub status: EvaluationStatus,
    /// 各维度评分 [0,10]
    pub location_score: f64,
    pub infrastructure_score: f64,
    pub market_score: f64,
    pub building_score: f64,
    /// 周边设施快照（JSON序列化的 Vec<NearbyPlaceInfo>）
    pub nearby_json: Option<String>,
    /// 市场行情快照（JSON序列化的 MarketSnapshot）
    pub market_json: Option<String>,
    /// 估价因子明细（JSON序列化的 ValuationFactors）
    pub factors_json: Option<String>,
    pub recommendations_json: Option<String>,
    /// 唯一允许的后续变更：核验人与核验时间
    pub verified_by: Option<String>,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 估价历史条目 - evaluations 与 properties 联表的投影
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationHistoryEntry {
    pub evaluation_id: String,
    pub property_id: String,
    pub address: String,
    pub area: f64,
    pub estimated_value: i64,
    pub currency: String,
    pub confidence: i64,
    pub evaluation_type: EvaluationType,
    pub status: EvaluationStatus,
    pub created_at: DateTime<Utc>,
}

/// 数据库操作trait
#[async_trait]
pub trait Database: Send + Sync {
    /// 保存房产记录
    async fn save_property(&self, property: &PropertyRecord) -> Result<()>;

    /// 获取房产记录
    async fn get_property(&self, id: &str) -> Result<Option<PropertyRecord>>;

    /// 保存文档及其可选的抽取数据（单事务：两行一起落库，或抽取数据不落库）
    async fn save_document_with_data(
        &self,
        document: &DocumentRecord,
        data: Option<&DocumentDataRecord>,
    ) -> Result<()>;

    /// 获取文档记录
    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>>;

    /// 列出某房产的全部文档（按创建时间倒序）
    async fn list_documents_by_property(
        &self,
        property_id: &str,
    ) -> Result<Vec<DocumentRecord>>;

    /// 获取文档的抽取数据（可能不存在，调用方必须容忍空值）
    async fn get_document_data(&self, document_id: &str) -> Result<Option<DocumentDataRecord>>;

    /// 获取某房产最近一条文档抽取数据（按文档创建时间倒序）
    async fn latest_document_data_for_property(
        &self,
        property_id: &str,
    ) -> Result<Option<DocumentDataRecord>>;

    /// 保存估价结果
    async fn save_evaluation(&self, evaluation: &EvaluationRecord) -> Result<()>;

    /// 按ID获取估价结果
    async fn get_evaluation(&self, id: &str) -> Result<Option<EvaluationRecord>>;

    /// 获取某房产最近一次估价（按创建时间倒序）
    async fn latest_evaluation_for_property(
        &self,
        property_id: &str,
    ) -> Result<Option<EvaluationRecord>>;

    /// 估价历史（与房产联表，按创建时间倒序）
    async fn list_evaluation_history(&self, limit: u32) -> Result<Vec<EvaluationHistoryEntry>>;

    /// 标记估价已核验（唯一允许的后续变更），返回是否存在该记录
    async fn mark_evaluation_verified(
        &self,
        id: &str,
        verified_by: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// 健康检查
    async fn health_check(&self) -> Result<bool>;

    /// 初始化数据库（创建表等）
    async fn initialize(&self) -> Result<()>;
}
