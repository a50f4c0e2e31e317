//! SQLite数据库表结构定义
//! 包含所有表的CREATE语句和索引定义

use anyhow::Result;
use sqlx::SqlitePool;

/// 数据库表结构管理器
pub struct SchemaManager;

impl SchemaManager {
    /// 创建所有表结构
    pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
        Self::create_properties_table(pool).await?;
        Self::create_documents_table(pool).await?;
        Self::create_document_data_table(pool).await?;
        Self::create_evaluations_table(pool).await?;
        Ok(())
    }

    async fn create_properties_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                id TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                area REAL NOT NULL,
                lat REAL,
                lng REAL,
                metro_distance_m INTEGER,
                green_zones INTEGER,
                price_range TEXT,
                construction_type TEXT,
                construction_year INTEGER,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn create_documents_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                property_id TEXT NOT NULL REFERENCES properties(id),
                doc_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                ocr_text TEXT,
                confidence REAL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_property
            ON documents(property_id, created_at)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn create_document_data_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS document_data (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id),
                square_meters REAL,
                construction_year INTEGER,
                address TEXT,
                rooms INTEGER,
                floor INTEGER,
                total_floors INTEGER,
                owner TEXT,
                cadastral_number TEXT,
                tax_assessment_value REAL,
                document_price REAL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // 每个文档至多一条抽取数据
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_document_data_document
            ON document_data(document_id)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn create_evaluations_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS evaluations (
                id TEXT PRIMARY KEY,
                property_id TEXT NOT NULL REFERENCES properties(id),
                estimated_value INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                confidence INTEGER NOT NULL,
                evaluation_type TEXT NOT NULL DEFAULT 'quick',
                status TEXT NOT NULL DEFAULT 'pending',
                location_score REAL NOT NULL DEFAULT 0,
                infrastructure_score REAL NOT NULL DEFAULT 0,
                market_score REAL NOT NULL DEFAULT 0,
                building_score REAL NOT NULL DEFAULT 0,
                nearby_json TEXT,
                market_json TEXT,
                factors_json TEXT,
                recommendations_json TEXT,
                verified_by TEXT,
                verification_date TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_evaluations_property
            ON evaluations(property_id, created_at)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
