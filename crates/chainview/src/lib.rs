//! Chainview - 链上种植计划读取服务
//!
//! 调用 PlanRegistry 合约的 getPlanInfo，解码为类型化的
//! 计划/任务/检查记录并以 JSON 形式对外提供。

pub mod abi;
pub mod config;
pub mod error;
pub mod handlers;
pub mod reader;
pub mod types;

pub use config::ChainviewServiceConfig;
pub use error::{ChainviewError, ChainviewResult};
pub use handlers::{
    ChainviewState, create_chainview_state, create_router, register_chainview_metrics,
};
pub use reader::PlanReader;
pub use types::{InspectionRecord, PlanInfo, PlanRecord, TaskRecord, TaskStatus};
