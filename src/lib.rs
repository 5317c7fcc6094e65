//! # agrix
//!
//! 农产品溯源辅助服务器集合，包括 QR 凭证服务和链上计划读取服务

pub mod service;

// Re-export commonly used types
pub use agrix_common::config::AgrixConfig;
pub use service::{ServiceContainer, ServiceManager};
