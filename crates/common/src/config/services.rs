//! 服务配置集合

use serde::{Deserialize, Serialize};

/// 所有服务的配置集合
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServicesConfig {
    /// QRT (QR Token) 服务配置
    #[serde(default)]
    pub qrt: Option<qrt::QrtServiceConfig>,

    /// Chainview 链上计划读取服务配置
    #[serde(default)]
    pub chainview: Option<chainview::ChainviewServiceConfig>,
}
