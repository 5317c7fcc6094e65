//! Agrix 基础设施库
//!
//! 为农产品溯源辅助服务提供基础设施组件，包括统一配置、错误模型、监控指标和服务状态管理

pub mod config;
pub mod error;
pub mod metrics;
pub mod monitoring;

// Re-export commonly used types for convenience
pub use error::{BaseError, ConfigError, Result, ValidationError};
pub use monitoring::ServiceState;
