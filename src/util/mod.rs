//! 工具模块
//!
//! - config: 配置类型、加载与验证
//! - extract: OCR文本字段抽取（保加利亚语词表）
//! - http_client: 可注入的上游HTTP客户端
//! - log: tracing日志初始化与清理

pub mod config;
pub mod extract;
pub mod http_client;
pub mod log;
