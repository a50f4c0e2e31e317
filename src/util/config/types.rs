//! 配置结构定义模块
//! 包含系统配置的所有数据结构

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub proximity: ProximityConfig,
    #[serde(default)]
    pub valuation: ValuationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Config {
    pub fn get_port(&self) -> u16 {
        self.server.port
    }

    pub fn bind_host(&self) -> &str {
        &self.server.host
    }
}

/// HTTP服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 允许的CORS来源列表
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:8086".to_string(),
        "http://127.0.0.1:8086".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "runtime/valuation.db".to_string()
}

/// 地图服务商配置（地理编码 + 周边检索）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// 服务商API密钥，缺失时上游调用将返回失败
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// 结果限定的国家码（单一国家上下文）
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_maps_timeout")]
    pub request_timeout_secs: u64,
    /// 地理编码LRU缓存容量
    #[serde(default = "default_geocode_cache_capacity")]
    pub geocode_cache_capacity: usize,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_maps_base_url(),
            country: default_country(),
            language: default_language(),
            request_timeout_secs: default_maps_timeout(),
            geocode_cache_capacity: default_geocode_cache_capacity(),
        }
    }
}

fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_country() -> String {
    "BG".to_string()
}

fn default_language() -> String {
    "bg".to_string()
}

fn default_maps_timeout() -> u64 {
    10
}

fn default_geocode_cache_capacity() -> usize {
    1024
}

/// 周边检索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// 默认检索半径（米）
    #[serde(default = "default_radius_m")]
    pub default_radius_m: u32,
    /// 按类别覆盖的半径，键为类别名（transport/education/shopping/leisure）
    #[serde(default)]
    pub category_radius_m: HashMap<String, u32>,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            default_radius_m: default_radius_m(),
            category_radius_m: HashMap::new(),
        }
    }
}

fn default_radius_m() -> u32 {
    1000
}

/// 估价配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 历史查询单次返回上限
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_history_limit() -> u32 {
    100
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 是否输出JSON结构化日志
    #[serde(default)]
    pub structured: Option<bool>,
    #[serde(default)]
    pub file: FileLogConfig,
    /// 按子系统覆盖日志级别
    #[serde(default)]
    pub level_config: Option<LevelConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            structured: None,
            file: FileLogConfig::default(),
            level_config: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 文件日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// 日志保留天数，超期清理
    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_log_directory(),
            retention_days: None,
        }
    }
}

fn default_log_directory() -> String {
    "logs".to_string()
}

/// 子系统级别覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    pub api: Option<String>,
    pub valuation: Option<String>,
    pub system: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

/// 调试配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
}
