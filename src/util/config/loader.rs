//! 配置加载和管理模块
//! 处理配置文件的读取、写入和环境变量覆盖

use super::types::*;
use anyhow::Result;
use std::fs;
use std::path::Path;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从YAML文件读取配置
    pub fn read_yaml(path: impl AsRef<Path>) -> Result<Config> {
        let config_str = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    /// 从环境变量读取配置覆盖
    pub fn apply_env_overrides(mut config: Config) -> Config {
        if let Ok(host) = std::env::var("VALUATION_HOST") {
            tracing::info!(event = "config.env_override", field = "server.host", value = %host);
            config.server.host = host;
        }

        if let Ok(port_str) = std::env::var("VALUATION_PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                tracing::info!(event = "config.env_override", field = "server.port", value = port);
                config.server.port = port;
            } else {
                tracing::warn!("VALUATION_PORT 不是合法端口号: {}", port_str);
            }
        }

        if let Ok(db_path) = std::env::var("VALUATION_DB_PATH") {
            tracing::info!(event = "config.env_override", field = "database.path", value = %db_path);
            config.database.path = db_path;
        }

        // 密钥类字段不打印明文
        if let Ok(api_key) = std::env::var("VALUATION_MAPS_API_KEY") {
            tracing::info!(event = "config.env_override", field = "maps.api_key", value = "[隐藏]");
            config.maps.api_key = api_key;
        }

        if let Ok(base_url) = std::env::var("VALUATION_MAPS_BASE_URL") {
            tracing::info!(event = "config.env_override", field = "maps.base_url", value = %base_url);
            config.maps.base_url = base_url;
        }

        if let Ok(level) = std::env::var("VALUATION_LOG_LEVEL") {
            tracing::info!(event = "config.env_override", field = "logging.level", value = %level);
            config.logging.level = level;
        }

        config
    }

    /// 加载配置文件并应用环境变量覆盖
    pub fn load_with_env_overrides(path: impl AsRef<Path>) -> Result<Config> {
        let config = Self::read_yaml(path)?;
        Ok(Self::apply_env_overrides(config))
    }
}

/// 配置写入器
pub struct ConfigWriter;

impl ConfigWriter {
    /// 生成默认配置模板
    pub fn generate_template() -> Config {
        serde_yaml::from_str("{}").expect("empty mapping deserializes via serde defaults")
    }

    /// 写入YAML文件
    pub fn write_yaml(config: &Config, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(config)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// 写入YAML文件，必要时先创建父目录
    pub fn write_yaml_with_dir(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::write_yaml(config, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_uses_defaults() {
        let config = ConfigWriter::generate_template();
        assert_eq!(config.server.port, 8086);
        assert_eq!(config.maps.country, "BG");
        assert_eq!(config.proximity.default_radius_m, 1000);
        assert_eq!(config.valuation.currency, "EUR");
        assert_eq!(config.maps.geocode_cache_capacity, 1024);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
server:
  port: 9000
maps:
  api_key: "test-key"
proximity:
  category_radius_m:
    transport: 800
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.maps.api_key, "test-key");
        assert_eq!(config.maps.language, "bg");
        assert_eq!(
            config.proximity.category_radius_m.get("transport"),
            Some(&800)
        );
        assert_eq!(config.proximity.default_radius_m, 1000);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = ConfigWriter::generate_template();
        config.server.port = 18086;
        config.logging.level = "debug".to_string();
        ConfigWriter::write_yaml_with_dir(&config, &path).unwrap();

        let loaded = ConfigLoader::read_yaml(&path).unwrap();
        assert_eq!(loaded.server.port, 18086);
        assert_eq!(loaded.logging.level, "debug");
    }
}
