use crate::util::config::{LevelConfig, LoggingConfig};
use std::io;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

/// 根据配置初始化日志系统
///
/// 返回文件写入守卫（仅启用文件日志时），调用方需持有到进程退出
pub fn log_init_with_config(
    file_prefix: &str,
    config: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level_filter = parse_level(&config.level);
    let filter_expression = build_env_filter_expression(level_filter, config.level_config.as_ref());
    let use_json = config.structured.unwrap_or(false);

    let stdout_filter = EnvFilter::try_new(filter_expression.as_str())
        .unwrap_or_else(|_| EnvFilter::new(level_filter_to_str(level_filter)));

    if config.file.enabled {
        std::fs::create_dir_all(&config.file.directory)?;

        let file_appender = daily(&config.file.directory, format!("{}-info", file_prefix));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_filter = EnvFilter::try_new(filter_expression.as_str())
            .unwrap_or_else(|_| EnvFilter::new(level_filter_to_str(level_filter)));

        if use_json {
            let stdout_layer = layer()
                .json()
                .with_target(false)
                .with_writer(io::stdout)
                .with_filter(stdout_filter);
            let file_layer = layer()
                .json()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(file_filter);
            Registry::default().with(stdout_layer).with(file_layer).init();
        } else {
            let stdout_layer = layer().with_writer(io::stdout).with_filter(stdout_filter);
            let file_layer = layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(file_filter);
            Registry::default().with(stdout_layer).with(file_layer).init();
        }

        tracing::info!(
            event = "log.init",
            level = %config.level,
            console = true,
            file = true,
            directory = %config.file.directory,
            rotation = "daily",
            structured = use_json
        );
        if let Some(retention) = config.file.retention_days {
            tracing::info!(event = "log.retention", days = retention);
        }

        Ok(Some(guard))
    } else {
        if use_json {
            let stdout_layer = layer()
                .json()
                .with_target(false)
                .with_writer(io::stdout)
                .with_filter(stdout_filter);
            Registry::default().with(stdout_layer).init();
        } else {
            let stdout_layer = layer().with_writer(io::stdout).with_filter(stdout_filter);
            Registry::default().with(stdout_layer).init();
        }

        tracing::info!(event = "log.init", level = %config.level, console = true, file = false, structured = use_json);

        Ok(None)
    }
}

/// 清理超过保留天数的日志文件
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u32) -> anyhow::Result<()> {
    if !log_dir.exists() {
        tracing::debug!("日志目录不存在: {}", log_dir.display());
        return Ok(());
    }

    let cutoff_time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs()
        .saturating_sub(retention_days as u64 * 24 * 60 * 60);

    let mut deleted_count = 0;
    let mut error_count = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("");

        // 只处理本服务的日志文件，避免误删
        if !file_name.contains("valuation-server") {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if !metadata.is_file() {
                continue;
            }
            let check_time = metadata
                .modified()
                .or_else(|_| metadata.created())
                .unwrap_or_else(|_| std::time::SystemTime::now());

            if let Ok(file_time) = check_time.duration_since(std::time::UNIX_EPOCH) {
                if file_time.as_secs() < cutoff_time {
                    match std::fs::remove_file(&path) {
                        Ok(()) => {
                            deleted_count += 1;
                            tracing::debug!("已删除过期日志: {}", path.display());
                        }
                        Err(e) => {
                            error_count += 1;
                            tracing::warn!("删除日志文件失败: {} - {}", path.display(), e);
                        }
                    }
                }
            }
        }
    }

    if deleted_count > 0 {
        tracing::info!("已清理 {} 个过期日志文件", deleted_count);
    }
    if error_count > 0 {
        tracing::warn!("有 {} 个文件清理失败", error_count);
    }

    Ok(())
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn build_env_filter_expression(
    default_level: LevelFilter,
    level_config: Option<&LevelConfig>,
) -> String {
    let mut directives = vec![level_filter_to_str(default_level).to_string()];

    if let Some(cfg) = level_config {
        if let Some(level) = cfg.api.as_deref().and_then(normalize_level_str) {
            directives.push(format!("valuation_server::api={level}"));
        }
        if let Some(level) = cfg.valuation.as_deref().and_then(normalize_level_str) {
            directives.push(format!("valuation_server::valuation={level}"));
            directives.push(format!("valuation_server::geo={level}"));
        }
        if let Some(level) = cfg.system.as_deref().and_then(normalize_level_str) {
            directives.push(format!("valuation_server::server={level}"));
            directives.push(format!("valuation_server::db={level}"));
        }

        for (target, level_str) in &cfg.overrides {
            if let Some(level) = normalize_level_str(level_str) {
                directives.push(format!("{}={level}", normalize_directive_target(target)));
            }
        }
    }

    directives.join(",")
}

fn normalize_level_str(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn level_filter_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::OFF => "off",
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
    }
}

fn normalize_directive_target(target: &str) -> String {
    if let Some(raw) = target.strip_prefix("target:") {
        raw.to_string()
    } else if target.contains("::") || target.starts_with("valuation_server::") {
        target.to_string()
    } else {
        let path = target.replace('.', "::");
        format!("valuation_server::{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_expression_with_overrides() {
        let mut level_config = LevelConfig::default();
        level_config.api = Some("debug".to_string());
        level_config
            .overrides
            .insert("geo.cache".to_string(), "trace".to_string());

        let expr = build_env_filter_expression(LevelFilter::INFO, Some(&level_config));
        assert!(expr.starts_with("info"));
        assert!(expr.contains("valuation_server::api=debug"));
        assert!(expr.contains("valuation_server::geo::cache=trace"));
    }

    #[test]
    fn test_invalid_level_ignored() {
        let mut level_config = LevelConfig::default();
        level_config.api = Some("loud".to_string());
        let expr = build_env_filter_expression(LevelFilter::WARN, Some(&level_config));
        assert_eq!(expr, "warn");
    }
}
