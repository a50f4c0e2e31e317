//! SQLite数据库查询操作
//! 包含所有数据库查询和操作的实现

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::db::traits::*;

/// RFC3339时间列解析，历史数据容错为当前时间
fn parse_time(value: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_opt_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value.map(parse_time)
}

/// 房产查询操作
pub struct PropertyQueries;

impl PropertyQueries {
    pub async fn upsert(pool: &SqlitePool, property: &PropertyRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (
                id, address, area, lat, lng, metro_distance_m, green_zones,
                price_range, construction_type, construction_year, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                address = excluded.address,
                area = excluded.area,
                lat = excluded.lat,
                lng = excluded.lng,
                metro_distance_m = excluded.metro_distance_m,
                green_zones = excluded.green_zones,
                price_range = excluded.price_range,
                construction_type = excluded.construction_type,
                construction_year = excluded.construction_year
            "#,
        )
        .bind(&property.id)
        .bind(&property.address)
        .bind(property.area)
        .bind(property.lat)
        .bind(property.lng)
        .bind(property.metro_distance_m)
        .bind(property.green_zones)
        .bind(&property.price_range)
        .bind(&property.construction_type)
        .bind(property.construction_year)
        .bind(property.created_at.to_rfc3339())
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<PropertyRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, address, area, lat, lng, metro_distance_m, green_zones,
                   price_range, construction_type, construction_year, created_at
            FROM properties
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_record))
    }

    fn row_to_record(row: SqliteRow) -> PropertyRecord {
        PropertyRecord {
            id: row.get("id"),
            address: row.get("address"),
            area: row.get("area"),
            lat: row.get("lat"),
            lng: row.get("lng"),
            metro_distance_m: row.get("metro_distance_m"),
            green_zones: row.get("green_zones"),
            price_range: row.get("price_range"),
            construction_type: row.get("construction_type"),
            construction_year: row.get("construction_year"),
            created_at: parse_time(row.get("created_at")),
        }
    }
}

/// 文档与抽取数据查询操作
pub struct DocumentQueries;

impl DocumentQueries {
    /// 单事务写入文档及其可选抽取数据：两行一起提交，或只提交文档行
    pub async fn insert_with_data(
        pool: &SqlitePool,
        document: &DocumentRecord,
        data: Option<&DocumentDataRecord>,
    ) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, property_id, doc_type, status, ocr_text, confidence,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.property_id)
        .bind(document.doc_type.as_str())
        .bind(document.status.as_str())
        .bind(&document.ocr_text)
        .bind(document.confidence)
        .bind(document.created_at.to_rfc3339())
        .bind(document.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        if let Some(data) = data {
            sqlx::query(
                r#"
                INSERT INTO document_data (
                    id, document_id, square_meters, construction_year, address,
                    rooms, floor, total_floors, owner, cadastral_number,
                    tax_assessment_value, document_price, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&data.id)
            .bind(&document.id)
            .bind(data.square_meters)
            .bind(data.construction_year)
            .bind(&data.address)
            .bind(data.rooms)
            .bind(data.floor)
            .bind(data.total_floors)
            .bind(&data.owner)
            .bind(&data.cadastral_number)
            .bind(data.tax_assessment_value)
            .bind(data.document_price)
            .bind(data.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, property_id, doc_type, status, ocr_text, confidence,
                   created_at, updated_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_record))
    }

    pub async fn list_by_property(
        pool: &SqlitePool,
        property_id: &str,
    ) -> Result<Vec<DocumentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, property_id, doc_type, status, ocr_text, confidence,
                   created_at, updated_at
            FROM documents
            WHERE property_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_record).collect())
    }

    pub async fn get_data(
        pool: &SqlitePool,
        document_id: &str,
    ) -> Result<Option<DocumentDataRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, document_id, square_meters, construction_year, address,
                   rooms, floor, total_floors, owner, cadastral_number,
                   tax_assessment_value, document_price, created_at
            FROM document_data
            WHERE document_id = ?
            "#,
        )
        .bind(document_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_data))
    }

    pub async fn latest_data_for_property(
        pool: &SqlitePool,
        property_id: &str,
    ) -> Result<Option<DocumentDataRecord>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.document_id, d.square_meters, d.construction_year,
                   d.address, d.rooms, d.floor, d.total_floors, d.owner,
                   d.cadastral_number, d.tax_assessment_value, d.document_price,
                   d.created_at
            FROM document_data d
            JOIN documents doc ON doc.id = d.document_id
            WHERE doc.property_id = ?
            ORDER BY doc.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(property_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_data))
    }

    fn row_to_record(row: SqliteRow) -> DocumentRecord {
        let doc_type: String = row.get("doc_type");
        let status: String = row.get("status");
        DocumentRecord {
            id: row.get("id"),
            property_id: row.get("property_id"),
            doc_type: DocumentType::from_str(&doc_type).unwrap_or(DocumentType::NotaryAct),
            status: DocumentStatus::from_str(&status).unwrap_or(DocumentStatus::Pending),
            ocr_text: row.get("ocr_text"),
            confidence: row.get("confidence"),
            created_at: parse_time(row.get("created_at")),
            updated_at: parse_time(row.get("updated_at")),
        }
    }

    fn row_to_data(row: SqliteRow) -> DocumentDataRecord {
        DocumentDataRecord {
            id: row.get("id"),
            document_id: row.get("document_id"),
            square_meters: row.get("square_meters"),
            construction_year: row.get("construction_year"),
            address: row.get("address"),
            rooms: row.get("rooms"),
            floor: row.get("floor"),
            total_floors: row.get("total_floors"),
            owner: row.get("owner"),
            cadastral_number: row.get("cadastral_number"),
            tax_assessment_value: row.get("tax_assessment_value"),
            document_price: row.get("document_price"),
            created_at: parse_time(row.get("created_at")),
        }
    }
}

/// 估价结果查询操作
pub struct EvaluationQueries;

impl EvaluationQueries {
    pub async fn insert(pool: &SqlitePool, evaluation: &EvaluationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO evaluations (
                id, property_id, estimated_value, currency, confidence,
                evaluation_type, status, location_score, infrastructure_score,
                market_score, building_score, nearby_json, market_json,
                factors_json, recommendations_json, verified_by,
                verification_date, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&evaluation.id)
        .bind(&evaluation.property_id)
        .bind(evaluation.estimated_value)
        .bind(&evaluation.currency)
        .bind(evaluation.confidence)
        .bind(evaluation.evaluation_type.as_str())
        .bind(evaluation.status.as_str())
        .bind(evaluation.location_score)
        .bind(evaluation.infrastructure_score)
        .bind(evaluation.market_score)
        .bind(evaluation.building_score)
        .bind(&evaluation.nearby_json)
        .bind(&evaluation.market_json)
        .bind(&evaluation.factors_json)
        .bind(&evaluation.recommendations_json)
        .bind(&evaluation.verified_by)
        .bind(evaluation.verification_date.map(|dt| dt.to_rfc3339()))
        .bind(evaluation.created_at.to_rfc3339())
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<EvaluationRecord>> {
        let row = sqlx::query(&format!(
            "{} WHERE id = ?",
            Self::SELECT_BASE
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_record))
    }

    pub async fn latest_for_property(
        pool: &SqlitePool,
        property_id: &str,
    ) -> Result<Option<EvaluationRecord>> {
        let row = sqlx::query(&format!(
            "{} WHERE property_id = ? ORDER BY created_at DESC LIMIT 1",
            Self::SELECT_BASE
        ))
        .bind(property_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_record))
    }

    pub async fn list_history(
        pool: &SqlitePool,
        limit: u32,
    ) -> Result<Vec<EvaluationHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id AS evaluation_id, e.property_id, p.address, p.area,
                   e.estimated_value, e.currency, e.confidence,
                   e.evaluation_type, e.status, e.created_at
            FROM evaluations e
            JOIN properties p ON p.id = e.property_id
            ORDER BY e.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| {
                let evaluation_type: String = row.get("evaluation_type");
                let status: String = row.get("status");
                EvaluationHistoryEntry {
                    evaluation_id: row.get("evaluation_id"),
                    property_id: row.get("property_id"),
                    address: row.get("address"),
                    area: row.get("area"),
                    estimated_value: row.get("estimated_value"),
                    currency: row.get("currency"),
                    confidence: row.get("confidence"),
                    evaluation_type: EvaluationType::from_str(&evaluation_type)
                        .unwrap_or(EvaluationType::Quick),
                    status: EvaluationStatus::from_str(&status)
                        .unwrap_or(EvaluationStatus::Completed),
                    created_at: parse_time(row.get("created_at")),
                }
            })
            .collect();

        Ok(entries)
    }

    pub async fn mark_verified(
        pool: &SqlitePool,
        id: &str,
        verified_by: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE evaluations
            SET status = 'verified', verified_by = ?, verification_date = ?
            WHERE id = ?
            "#,
        )
        .bind(verified_by)
        .bind(verified_at.to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    const SELECT_BASE: &'static str = r#"
        SELECT id, property_id, estimated_value, currency, confidence,
               evaluation_type, status, location_score, infrastructure_score,
               market_score, building_score, nearby_json, market_json,
               factors_json, recommendations_json, verified_by,
               verification_date, created_at
        FROM evaluations
    "#;

    fn row_to_record(row: SqliteRow) -> EvaluationRecord {
        let evaluation_type: String = row.get("evaluation_type");
        let status: String = row.get("status");
        EvaluationRecord {
            id: row.get("id"),
            property_id: row.get("property_id"),
            estimated_value: row.get("estimated_value"),
            currency: row.get("currency"),
            confidence: row.get("confidence"),
            evaluation_type: EvaluationType::from_str(&evaluation_type)
                .unwrap_or(EvaluationType::Quick),
            status: EvaluationStatus::from_str(&status).unwrap_or(EvaluationStatus::Completed),
            location_score: row.get("location_score"),
            infrastructure_score: row.get("infrastructure_score"),
            market_score: row.get("market_score"),
            building_score: row.get("building_score"),
            nearby_json: row.get("nearby_json"),
            market_json: row.get("market_json"),
            factors_json: row.get("factors_json"),
            recommendations_json: row.get("recommendations_json"),
            verified_by: row.get("verified_by"),
            verification_date: parse_opt_time(row.get("verification_date")),
            created_at: parse_time(row.get("created_at")),
        }
    }
}

/// 健康检查查询
pub struct HealthQueries;

impl HealthQueries {
    pub async fn check_health(pool: &SqlitePool) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS ok").fetch_one(pool).await?;
        let ok: i64 = row.get("ok");
        Ok(ok == 1)
    }
}
