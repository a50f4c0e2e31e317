//! 服务器模块
//!
//! 这个模块提供完整的服务器设置和管理功能，包括：
//! - 配置管理 (config.rs)
//! - 数据库初始化 (database.rs)
//! - HTTP服务器设置 (http.rs)

pub mod config;
pub mod database;
pub mod http;

pub use config::ConfigManager;
pub use database::{DatabaseHealth, DatabaseInitializer};
pub use http::{HttpServer, ServerManager};

use crate::api::init_start_time;
use crate::build_info;
use crate::geo::{GeocodeCache, GeocodingGateway, PlacesClient};
use crate::util::config::{Config, ValidationReport};
use crate::util::http_client::{HttpClient, HttpClientConfig};
use crate::valuation::{
    MarketDataProvider, MockRoomClassifier, ProximityScorer, ValuationEngine,
};
use crate::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// 服务器引导程序 - 统一的服务器启动入口
pub struct ServerBootstrap {
    config: Config,
    validation_report: ValidationReport,
    _log_guard: Option<WorkerGuard>,
}

impl ServerBootstrap {
    /// 创建新的服务器引导程序
    pub async fn new() -> Result<Self> {
        // 加载和验证配置
        let (config, validation_report) = ConfigManager::load_and_validate()?;

        // 初始化日志系统
        let log_guard = ConfigManager::initialize_logging(&config)?;

        if validation_report.has_errors() {
            return Err(anyhow::anyhow!(
                "配置验证失败: {} 个错误",
                validation_report.error_count()
            ));
        }

        tracing::info!(event = "bootstrap.ready");

        Ok(Self {
            config,
            validation_report,
            _log_guard: log_guard,
        })
    }

    /// 启动服务器
    pub async fn start(self) -> Result<()> {
        tracing::info!("=== 估价服务启动 ===");
        tracing::info!("版本信息: {}", build_info::summary());
        tracing::info!("服务端口: {}", self.config.get_port());

        init_start_time();

        let app_state = self.create_app_state().await?;

        let server = ServerManager::create_server(&self.config, app_state).await?;
        ServerManager::start_server(server).await
    }

    /// 创建应用状态 - 所有服务在此显式构造并注入
    async fn create_app_state(&self) -> Result<AppState> {
        tracing::info!(event = "bootstrap.app_state.create");

        // 初始化数据库
        let database = self.initialize_database().await?;

        // 初始化HTTP客户端（上游地图服务商共用）
        let http_client = Arc::new(
            HttpClient::new(
                HttpClientConfig::default()
                    .with_env_proxy()
                    .with_timeout(self.config.maps.request_timeout_secs),
            )
            .context("初始化HTTP客户端失败")?,
        );

        // 地理编码网关：注入有界LRU缓存
        let geocode_cache = Arc::new(GeocodeCache::new(self.config.maps.geocode_cache_capacity));
        let geocoder = Arc::new(GeocodingGateway::new(
            http_client.clone(),
            self.config.maps.clone(),
            geocode_cache,
        ));
        let places = Arc::new(PlacesClient::new(
            http_client.clone(),
            self.config.maps.clone(),
        ));

        let scorer = Arc::new(ProximityScorer::new(
            geocoder.clone(),
            places.clone(),
            MarketDataProvider::new(),
            self.config.proximity.clone(),
        ));

        let app_state = AppState {
            database,
            config: self.config.clone(),
            http_client,
            geocoder,
            places,
            scorer,
            engine: Arc::new(ValuationEngine::new()),
            classifier: Arc::new(MockRoomClassifier::new()),
        };

        tracing::info!(event = "bootstrap.app_state.ready");
        Ok(app_state)
    }

    /// 初始化数据库
    async fn initialize_database(&self) -> Result<Arc<dyn crate::db::Database>> {
        let database = DatabaseInitializer::create_from_config(&self.config).await?;
        DatabaseInitializer::validate_connection(&database).await?;
        DatabaseInitializer::initialize_schema(&database).await?;
        Ok(database)
    }

    /// 获取配置信息
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// 获取验证报告
    pub fn get_validation_report(&self) -> &ValidationReport {
        &self.validation_report
    }

    /// 执行健康检查
    pub async fn health_check(&self) -> Result<SystemHealthReport> {
        let database = DatabaseInitializer::create_from_config(&self.config).await?;
        let database_health = DatabaseInitializer::health_check(&database).await?;

        let maps_configured = !self.config.maps.api_key.trim().is_empty();
        let overall_healthy = database_health.is_healthy && !self.validation_report.has_errors();

        Ok(SystemHealthReport {
            overall_healthy,
            database_health,
            maps_configured,
            check_time: chrono::Utc::now(),
        })
    }
}

/// 系统健康检查报告
#[derive(Debug, Clone)]
pub struct SystemHealthReport {
    pub overall_healthy: bool,
    pub database_health: DatabaseHealth,
    pub maps_configured: bool,
    pub check_time: chrono::DateTime<chrono::Utc>,
}

/// 便捷函数：快速启动服务器
pub async fn start_server() -> Result<()> {
    let bootstrap = ServerBootstrap::new().await?;
    bootstrap.start().await
}

/// 便捷函数：执行健康检查
pub async fn check_system_health() -> Result<SystemHealthReport> {
    let bootstrap = ServerBootstrap::new().await?;
    bootstrap.health_check().await
}
