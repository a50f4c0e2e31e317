//! 配置管理模块
//! 负责配置文件的加载、验证和日志系统初始化

use crate::util::config::{Config, ConfigValidator, ValidationReport};
use crate::util::log::{cleanup_old_logs, log_init_with_config};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载和验证配置
    pub fn load_and_validate() -> Result<(Config, ValidationReport)> {
        let config_path = Self::find_config_file_path("config.yaml");

        let config = match Self::load_config_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("配置文件读取失败: {} - {}", config_path.display(), e);
                Self::handle_config_load_failure(&config_path)?
            }
        };

        let validation_report = ConfigValidator::validate(&config);

        if validation_report.has_errors() {
            warn!("配置验证发现错误: {}", validation_report.error_count());
            for error in &validation_report.errors {
                warn!("  - {}: {}", error.field, error.message);
            }
        }
        if validation_report.has_warnings() {
            info!("配置验证发现警告: {}", validation_report.warning_count());
            for warning in &validation_report.warnings {
                info!("  - {}: {}", warning.field, warning.message);
            }
        }

        Ok((config, validation_report))
    }

    /// 初始化日志系统
    pub fn initialize_logging(config: &Config) -> Result<Option<WorkerGuard>> {
        let log_guard = log_init_with_config("valuation-server", &config.logging)?;

        // 按保留天数清理过期日志
        if let Some(retention_days) = config.logging.file.retention_days {
            if config.logging.file.enabled {
                let log_path = Path::new(&config.logging.file.directory);
                if let Err(e) = cleanup_old_logs(log_path, retention_days) {
                    warn!("日志清理失败: {}", e);
                }
            }
        }

        Ok(log_guard)
    }

    /// 智能查找配置文件路径，适应开发和生产环境
    pub fn find_config_file_path(filename: &str) -> PathBuf {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        // 情况1：当前目录的config子目录
        let config_in_current = current_dir.join("config").join(filename);
        if config_in_current.exists() {
            return config_in_current;
        }

        // 情况2：在bin/目录下运行时，上级目录的config/
        if let Some(parent) = current_dir.parent() {
            let config_in_parent = parent.join("config").join(filename);
            if config_in_parent.exists() {
                return config_in_parent;
            }
        }

        // 情况3：可执行文件同级的config/
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        {
            let config_next_to_exe = exe_dir.join("config").join(filename);
            if config_next_to_exe.exists() {
                return config_next_to_exe;
            }
        }

        // 情况4：当前目录直接放置
        let dev_path = current_dir.join(filename);
        if dev_path.exists() {
            return dev_path;
        }

        // 都不存在时返回当前目录路径（供模板生成）
        current_dir.join(filename)
    }

    /// 从文件加载配置（支持环境变量覆盖）
    fn load_config_from_file(config_path: &Path) -> Result<Config> {
        crate::util::config::loader::ConfigLoader::load_with_env_overrides(config_path)
    }

    /// 处理配置加载失败
    fn handle_config_load_failure(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            info!("创建默认配置文件: {}", config_path.display());
            let config = Config::default();
            if let Err(write_err) = config.write_yaml_to_path(config_path) {
                warn!("创建默认配置文件失败: {}", write_err);
            }
            Ok(config)
        } else {
            warn!("配置文件存在但无法解析，请检查语法");
            Err(anyhow::anyhow!(
                "配置文件解析失败: {}",
                config_path.display()
            ))
        }
    }
}
