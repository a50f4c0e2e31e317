//! 数据库初始化模块
//! 负责创建、验证和初始化数据库连接

use crate::db::{Database, SqliteDatabase};
use crate::util::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// 数据库初始化器
pub struct DatabaseInitializer;

impl DatabaseInitializer {
    /// 根据配置创建数据库实例
    pub async fn create_from_config(config: &Config) -> Result<Arc<dyn Database>> {
        let database = SqliteDatabase::new(&config.database.path)
            .await
            .with_context(|| format!("连接SQLite失败: {}", config.database.path))?;
        Ok(Arc::new(database))
    }

    /// 验证数据库连接
    pub async fn validate_connection(database: &Arc<dyn Database>) -> Result<()> {
        let healthy = database.health_check().await.context("数据库健康检查失败")?;
        anyhow::ensure!(healthy, "数据库健康检查未通过");
        info!(event = "db.validate.ok");
        Ok(())
    }

    /// 初始化数据库架构
    pub async fn initialize_schema(database: &Arc<dyn Database>) -> Result<()> {
        database.initialize().await.context("初始化数据库表失败")?;
        info!(event = "db.schema.ready");
        Ok(())
    }

    /// 执行数据库健康检查
    pub async fn health_check(database: &Arc<dyn Database>) -> Result<DatabaseHealth> {
        let is_healthy = database.health_check().await.unwrap_or(false);
        Ok(DatabaseHealth { is_healthy })
    }
}

/// 数据库健康状态
#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pub is_healthy: bool,
}
