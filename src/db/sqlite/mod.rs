//! SQLite模块
//! 模块化的SQLite数据库实现

pub mod connection;
pub mod queries;
pub mod schemas;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::traits::*;
use connection::ConnectionManager;
use queries::{DocumentQueries, EvaluationQueries, HealthQueries, PropertyQueries};
use schemas::SchemaManager;

/// SQLite数据库实现
pub struct SqliteDatabase {
    pool: sqlx::SqlitePool,
}

impl SqliteDatabase {
    /// 创建新的SQLite数据库实例
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = ConnectionManager::create_pool(db_path).await?;
        Ok(Self { pool })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    /// 获取连接池信息
    pub fn pool_info(&self) -> connection::PoolInfo {
        ConnectionManager::get_pool_info(&self.pool)
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn save_property(&self, property: &PropertyRecord) -> Result<()> {
        PropertyQueries::upsert(&self.pool, property).await
    }

    async fn get_property(&self, id: &str) -> Result<Option<PropertyRecord>> {
        PropertyQueries::get_by_id(&self.pool, id).await
    }

    async fn save_document_with_data(
        &self,
        document: &DocumentRecord,
        data: Option<&DocumentDataRecord>,
    ) -> Result<()> {
        DocumentQueries::insert_with_data(&self.pool, document, data).await
    }

    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>> {
        DocumentQueries::get_by_id(&self.pool, id).await
    }

    async fn list_documents_by_property(
        &self,
        property_id: &str,
    ) -> Result<Vec<DocumentRecord>> {
        DocumentQueries::list_by_property(&self.pool, property_id).await
    }

    async fn get_document_data(&self, document_id: &str) -> Result<Option<DocumentDataRecord>> {
        DocumentQueries::get_data(&self.pool, document_id).await
    }

    async fn latest_document_data_for_property(
        &self,
        property_id: &str,
    ) -> Result<Option<DocumentDataRecord>> {
        DocumentQueries::latest_data_for_property(&self.pool, property_id).await
    }

    async fn save_evaluation(&self, evaluation: &EvaluationRecord) -> Result<()> {
        EvaluationQueries::insert(&self.pool, evaluation).await
    }

    async fn get_evaluation(&self, id: &str) -> Result<Option<EvaluationRecord>> {
        EvaluationQueries::get_by_id(&self.pool, id).await
    }

    async fn latest_evaluation_for_property(
        &self,
        property_id: &str,
    ) -> Result<Option<EvaluationRecord>> {
        EvaluationQueries::latest_for_property(&self.pool, property_id).await
    }

    async fn list_evaluation_history(&self, limit: u32) -> Result<Vec<EvaluationHistoryEntry>> {
        EvaluationQueries::list_history(&self.pool, limit).await
    }

    async fn mark_evaluation_verified(
        &self,
        id: &str,
        verified_by: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<bool> {
        EvaluationQueries::mark_verified(&self.pool, id, verified_by, verified_at).await
    }

    async fn health_check(&self) -> Result<bool> {
        HealthQueries::check_health(&self.pool).await
    }

    async fn initialize(&self) -> Result<()> {
        SchemaManager::create_all_tables(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_db() -> (SqliteDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = SqliteDatabase::new(path.to_str().unwrap()).await.unwrap();
        db.initialize().await.unwrap();
        (db, dir)
    }

    fn sample_property(id: &str, created_at: DateTime<Utc>) -> PropertyRecord {
        PropertyRecord {
            id: id.to_string(),
            address: "гр. София, ж.к. Младост 1, бл. 25".to_string(),
            area: 85.0,
            lat: Some(42.65),
            lng: Some(23.37),
            metro_distance_m: Some(400),
            green_zones: Some(2),
            price_range: None,
            construction_type: Some("панел".to_string()),
            construction_year: Some(1985),
            created_at,
        }
    }

    fn sample_document(id: &str, property_id: &str) -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id: id.to_string(),
            property_id: property_id.to_string(),
            doc_type: DocumentType::NotaryAct,
            status: DocumentStatus::Processed,
            ocr_text: Some("апартамент с площ 85 кв.м".to_string()),
            confidence: Some(0.91),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_data(id: &str, document_id: &str) -> DocumentDataRecord {
        DocumentDataRecord {
            id: id.to_string(),
            document_id: document_id.to_string(),
            square_meters: Some(85.0),
            construction_year: Some(1985),
            ..Default::default()
        }
    }

    fn sample_evaluation(
        id: &str,
        property_id: &str,
        created_at: DateTime<Utc>,
    ) -> EvaluationRecord {
        EvaluationRecord {
            id: id.to_string(),
            property_id: property_id.to_string(),
            estimated_value: 120_000,
            currency: "EUR".to_string(),
            confidence: 82,
            evaluation_type: EvaluationType::Quick,
            status: EvaluationStatus::Completed,
            location_score: 7.0,
            infrastructure_score: 6.0,
            market_score: 8.0,
            building_score: 5.0,
            nearby_json: None,
            market_json: None,
            factors_json: None,
            recommendations_json: None,
            verified_by: None,
            verification_date: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_property_roundtrip() {
        let (db, _dir) = test_db().await;
        let property = sample_property("prop-1", Utc::now());
        db.save_property(&property).await.unwrap();

        let loaded = db.get_property("prop-1").await.unwrap().unwrap();
        assert_eq!(loaded.address, property.address);
        assert_eq!(loaded.area, 85.0);
        assert_eq!(loaded.construction_type.as_deref(), Some("панел"));
        assert!(db.get_property("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_document_with_data_transaction_rolls_back() {
        let (db, _dir) = test_db().await;
        db.save_property(&sample_property("prop-1", Utc::now()))
            .await
            .unwrap();

        let doc1 = sample_document("doc-1", "prop-1");
        db.save_document_with_data(&doc1, Some(&sample_data("data-1", "doc-1")))
            .await
            .unwrap();

        // 第二个文档携带重复主键的抽取数据：数据插入失败时文档行也必须回滚
        let doc2 = sample_document("doc-2", "prop-1");
        let result = db
            .save_document_with_data(&doc2, Some(&sample_data("data-1", "doc-2")))
            .await;
        assert!(result.is_err());
        assert!(db.get_document("doc-2").await.unwrap().is_none());

        // 无抽取数据的文档正常落库，调用方读回 None
        let doc3 = sample_document("doc-3", "prop-1");
        db.save_document_with_data(&doc3, None).await.unwrap();
        assert!(db.get_document("doc-3").await.unwrap().is_some());
        assert!(db.get_document_data("doc-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_document_data_follows_document_order() {
        let (db, _dir) = test_db().await;
        db.save_property(&sample_property("prop-1", Utc::now()))
            .await
            .unwrap();

        let mut old_doc = sample_document("doc-old", "prop-1");
        old_doc.created_at = Utc::now() - Duration::hours(2);
        let mut old_data = sample_data("data-old", "doc-old");
        old_data.square_meters = Some(70.0);
        db.save_document_with_data(&old_doc, Some(&old_data))
            .await
            .unwrap();

        let new_doc = sample_document("doc-new", "prop-1");
        let mut new_data = sample_data("data-new", "doc-new");
        new_data.square_meters = Some(92.5);
        db.save_document_with_data(&new_doc, Some(&new_data))
            .await
            .unwrap();

        let latest = db
            .latest_document_data_for_property("prop-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.square_meters, Some(92.5));
    }

    #[tokio::test]
    async fn test_evaluation_history_ordering_and_fk() {
        let (db, _dir) = test_db().await;
        db.save_property(&sample_property("prop-1", Utc::now()))
            .await
            .unwrap();
        db.save_property(&sample_property("prop-2", Utc::now()))
            .await
            .unwrap();

        let base = Utc::now();
        db.save_evaluation(&sample_evaluation("ev-1", "prop-1", base - Duration::hours(3)))
            .await
            .unwrap();
        db.save_evaluation(&sample_evaluation("ev-2", "prop-2", base - Duration::hours(1)))
            .await
            .unwrap();
        db.save_evaluation(&sample_evaluation("ev-3", "prop-1", base))
            .await
            .unwrap();

        let history = db.list_evaluation_history(10).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].evaluation_id, "ev-3");
        assert_eq!(history[1].evaluation_id, "ev-2");
        assert_eq!(history[2].evaluation_id, "ev-1");
        for entry in &history {
            let property = db.get_property(&entry.property_id).await.unwrap().unwrap();
            assert_eq!(property.address, entry.address);
        }

        let latest = db
            .latest_evaluation_for_property("prop-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, "ev-3");
    }

    #[tokio::test]
    async fn test_mark_evaluation_verified() {
        let (db, _dir) = test_db().await;
        db.save_property(&sample_property("prop-1", Utc::now()))
            .await
            .unwrap();
        db.save_evaluation(&sample_evaluation("ev-1", "prop-1", Utc::now()))
            .await
            .unwrap();

        let verified_at = Utc::now();
        let found = db
            .mark_evaluation_verified("ev-1", "лицензиран оценител №1042", verified_at)
            .await
            .unwrap();
        assert!(found);

        let loaded = db.get_evaluation("ev-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, EvaluationStatus::Verified);
        assert_eq!(
            loaded.verified_by.as_deref(),
            Some("лицензиран оценител №1042")
        );
        assert!(loaded.verification_date.is_some());

        let missing = db
            .mark_evaluation_verified("ev-404", "никой", verified_at)
            .await
            .unwrap();
        assert!(!missing);
    }
}
