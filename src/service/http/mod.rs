//! HTTP服务模块
//!
//! 管理HTTP相关的服务

mod chainview;
mod qrt;

pub use chainview::ChainviewHttpService;
pub use qrt::QrtHttpService;
