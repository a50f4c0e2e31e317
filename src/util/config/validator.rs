//! 配置验证模块
//! 启动前对配置做一致性检查，区分错误与警告

use super::types::Config;

/// 单条验证问题
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// 配置验证报告
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_server(config, &mut report);
        Self::validate_database(config, &mut report);
        Self::validate_maps(config, &mut report);
        Self::validate_proximity(config, &mut report);
        Self::validate_logging(config, &mut report);

        report
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "端口不能为0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "使用了特权端口，可能需要管理员权限");
        }

        if config.server.request_timeout_secs == 0 {
            report.add_error("server.request_timeout_secs", "请求超时必须大于0");
        }

        for origin in &config.server.cors_allowed_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                report.add_warning(
                    "server.cors_allowed_origins",
                    format!("来源缺少协议前缀: {}", origin),
                );
            }
        }
    }

    fn validate_database(config: &Config, report: &mut ValidationReport) {
        if config.database.path.trim().is_empty() {
            report.add_error("database.path", "数据库路径不能为空");
        }
    }

    fn validate_maps(config: &Config, report: &mut ValidationReport) {
        if config.maps.api_key.trim().is_empty() {
            report.add_warning(
                "maps.api_key",
                "未配置地图服务商密钥，地理编码与周边检索将失败",
            );
        }

        if config.maps.base_url.trim().is_empty() {
            report.add_error("maps.base_url", "地图服务商地址不能为空");
        } else if url::Url::parse(&config.maps.base_url).is_err() {
            report.add_error("maps.base_url", "地图服务商地址不是合法URL");
        }

        if config.maps.geocode_cache_capacity == 0 {
            report.add_error("maps.geocode_cache_capacity", "缓存容量必须大于0");
        }

        if config.maps.country.len() != 2 {
            report.add_warning("maps.country", "国家码应为两位ISO代码");
        }
    }

    fn validate_proximity(config: &Config, report: &mut ValidationReport) {
        if config.proximity.default_radius_m == 0 {
            report.add_error("proximity.default_radius_m", "检索半径必须大于0");
        }

        const KNOWN_CATEGORIES: [&str; 4] = ["transport", "education", "shopping", "leisure"];
        for (category, radius) in &config.proximity.category_radius_m {
            if !KNOWN_CATEGORIES.contains(&category.as_str()) {
                report.add_warning(
                    "proximity.category_radius_m",
                    format!("未知类别: {}", category),
                );
            }
            if *radius == 0 {
                report.add_error(
                    "proximity.category_radius_m",
                    format!("类别 {} 的半径必须大于0", category),
                );
            }
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        const KNOWN_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !KNOWN_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            report.add_error(
                "logging.level",
                format!("未知日志级别: {}", config.logging.level),
            );
        }

        if config.logging.file.enabled && config.logging.file.directory.trim().is_empty() {
            report.add_error("logging.file.directory", "启用文件日志时目录不能为空");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::loader::ConfigWriter;

    #[test]
    fn test_default_config_passes() {
        let config = ConfigWriter::generate_template();
        let report = ConfigValidator::validate(&config);
        assert!(!report.has_errors());
        // 默认无API密钥，应有警告
        assert!(report.has_warnings());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = ConfigWriter::generate_template();
        config.server.port = 0;
        let report = ConfigValidator::validate(&config);
        assert!(report.has_errors());
        assert!(report.errors.iter().any(|e| e.field == "server.port"));
    }

    #[test]
    fn test_zero_category_radius_rejected() {
        let mut config = ConfigWriter::generate_template();
        config
            .proximity
            .category_radius_m
            .insert("transport".to_string(), 0);
        let report = ConfigValidator::validate(&config);
        assert!(report.has_errors());
    }

    #[test]
    fn test_malformed_maps_url_rejected() {
        let mut config = ConfigWriter::generate_template();
        config.maps.base_url = "not a url".to_string();
        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "maps.base_url"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = ConfigWriter::generate_template();
        config.logging.level = "verbose".to_string();
        let report = ConfigValidator::validate(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| e.field == "logging.level"));
    }
}
