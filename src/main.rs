//! Agrix 辅助服务器主程序
//!
//! 启动和管理农产品溯源相关的辅助服务，包括 QR 凭证和链上读取服务

mod cli;
mod error;
mod observability;
mod process;
mod service;

use agrix_common::config::AgrixConfig;
use clap::Parser;
use observability::init_observability;
use service::{ChainviewHttpService, QrtHttpService, ServiceContainer, ServiceManager};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

macro_rules! bootstrap_info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    };
}

macro_rules! bootstrap_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

use cli::{Cli, Commands};
use error::{Error, Result};

/// Application launcher utilities
struct ApplicationLauncher;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Test { config_file }) => {
            let config_path =
                ApplicationLauncher::find_config_file(config_file.as_ref().unwrap_or(&cli.config))?;
            ApplicationLauncher::test_config_file(&Some(config_path.clone()), &config_path)
        }
        None => {
            let config_path = ApplicationLauncher::find_config_file(&cli.config)?;

            // Create Tokio runtime（before running the application）
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            // Run the asynchronous application
            runtime.block_on(ApplicationLauncher::run_application(&config_path))
        }
    }
}

impl ApplicationLauncher {
    /// Find config file with fallback locations
    fn find_config_file(provided_path: &PathBuf) -> Result<PathBuf> {
        // If the provided path is not the default "config.toml", check if it exists
        if provided_path != Path::new("config.toml") {
            if provided_path.exists() {
                bootstrap_info!("Using provided config file: {:?}", provided_path);
                return Ok(provided_path.clone());
            } else {
                bootstrap_error!("Provided config file not found: {:?}", provided_path);
                return Err(Error::custom(format!(
                    "Config file not found: {provided_path:?}"
                )));
            }
        }

        // Otherwise, try fallback locations
        let fallback_paths = vec![
            // 1. Current working directory
            PathBuf::from("config.toml"),
            // 2. System config directory
            PathBuf::from("/etc/agrix/config.toml"),
        ];

        bootstrap_info!("Searching for config file in default locations...");

        for path in &fallback_paths {
            if path.exists() {
                bootstrap_info!("Found config file: {:?}", path);
                return Ok(path.clone());
            } else {
                bootstrap_info!("Config not found at: {:?}", path);
            }
        }

        // If no config file found, provide helpful error message
        bootstrap_error!("No configuration file found!");
        bootstrap_error!("Please create a config file in one of these locations:");
        for (i, path) in fallback_paths.iter().enumerate() {
            bootstrap_error!("  {}. {:?}", i + 1, path);
        }
        bootstrap_error!("Or specify a custom path with: agrix --config <path>");

        Err(Error::custom(
            "No configuration file found. Please create one or specify path with --config",
        ))
    }

    /// 测试配置文件是否有效
    fn test_config_file(config_file: &Option<PathBuf>, default_config: &PathBuf) -> Result<()> {
        // Initialize basic logging for test command
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();

        let config_path = config_file.as_ref().unwrap_or(default_config);
        match AgrixConfig::from_file(config_path) {
            Ok(config) => {
                info!("✅ 配置文件解析成功: {:?}", config_path);

                // 验证配置
                match config.validate() {
                    Ok(()) => {
                        info!("✅ 配置验证通过");
                    }
                    Err(errors) => {
                        error!("❌ 配置验证发现问题:");
                        for (i, err) in errors.iter().enumerate() {
                            if err.starts_with("Warning:") {
                                info!("  {}. ⚠️  {}", i + 1, err);
                            } else {
                                error!("  {}. ❌ {}", i + 1, err);
                            }
                        }
                        // 检查是否有非警告错误
                        let has_errors = errors.iter().any(|e| !e.starts_with("Warning:"));
                        if has_errors {
                            return Err(Error::service_validation("配置验证失败".to_string()));
                        }
                    }
                }

                info!("✅ 完整配置验证通过");
                Ok(())
            }
            Err(e) => {
                error!("❌ 配置文件解析失败: {}", e);
                Err(Error::service_validation(format!("配置解析失败: {e}")))
            }
        }
    }

    /// 运行应用程序的主入口
    async fn run_application(config_path: &Path) -> Result<()> {
        bootstrap_info!("📄 加载配置文件: {:?}", config_path);

        // 加载配置文件
        let config = match AgrixConfig::from_file(config_path) {
            Ok(config) => {
                bootstrap_info!("✅ 配置加载成功");

                // 验证配置
                if let Err(errors) = config.validate() {
                    bootstrap_error!("❌ 配置验证发现问题:");
                    let mut has_critical_errors = false;
                    for (i, err) in errors.iter().enumerate() {
                        if err.starts_with("Warning:") {
                            bootstrap_info!("  {}. ⚠️  {}", i + 1, err);
                        } else {
                            bootstrap_error!("  {}. ❌ {}", i + 1, err);
                            has_critical_errors = true;
                        }
                    }
                    if has_critical_errors {
                        return Err(Error::custom("配置验证失败，请修复上述错误".to_string()));
                    }
                }

                config
            }
            Err(e) => {
                bootstrap_error!("❌ 配置加载失败: {}", e);
                return Err(Error::custom(format!("配置加载失败: {e}")));
            }
        };

        // 初始化可观测性系统（日志）
        let _observability_guard = init_observability(&config)?;

        // 写入 PID 文件
        let pid_path = process::ProcessManager::write_pid_file(config.get_pid_path().as_deref())?;
        let _pid_guard = process::PidFileGuard::new(pid_path);

        Self::run_services(config).await
    }

    /// 运行所有启用的服务
    async fn run_services(config: AgrixConfig) -> Result<()> {
        info!("🚀 启动农产品溯源辅助服务器集群");

        // 初始化全局关闭通道（供所有服务共享）
        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(10);

        // 安装 Ctrl-C 处理器，确保任何阶段都能广播关闭
        setup_ctrl_c_handler(shutdown_tx.clone()).await;

        let mut service_manager =
            Self::create_service_manager(config.clone(), shutdown_tx.clone()).await?;

        let handle_futs = service_manager.start_all().await?;
        info!("启动所有服务...");

        // 显示服务信息
        Self::display_service_info(&config);

        for handle in handle_futs {
            if let Err(e) = handle.await {
                error!("Service task terminated unexpectedly: {}", e);
                let _ = shutdown_tx.send(());
            }
        }
        service_manager.stop_all().await?;

        info!("🛑 所有服务已安全关闭");
        Ok(())
    }

    /// 创建服务管理器
    async fn create_service_manager(
        config: AgrixConfig,
        shutdown_tx: tokio::sync::broadcast::Sender<()>,
    ) -> Result<ServiceManager> {
        info!("📊 计划启动的服务:");

        // 初始化 Prometheus metrics registry
        let registry = &agrix_common::metrics::REGISTRY;
        if let Err(e) = agrix_common::metrics::register_metrics() {
            warn!(
                "Prometheus metrics registration warning (may already be registered): {}",
                e
            );
        }

        // 注册各服务的 metrics
        if config.is_qrt_enabled()
            && let Err(e) = qrt::register_qrt_metrics(registry)
        {
            warn!(
                "QRT metrics registration warning (may already be registered): {}",
                e
            );
        }

        if config.is_chainview_enabled()
            && let Err(e) = chainview::register_chainview_metrics(registry)
        {
            warn!(
                "Chainview metrics registration warning (may already be registered): {}",
                e
            );
        }

        info!("✅ Prometheus metrics registry 初始化成功");

        let mut service_manager = ServiceManager::new(config.clone(), shutdown_tx.clone());

        // 添加HTTP路由服务 - 每个服务独立控制
        if config.is_qrt_enabled() {
            info!("  - QRT Service (/qrt)");
            let qrt_service = QrtHttpService::new(config.clone());
            service_manager.add_service(ServiceContainer::qrt(qrt_service));
        }

        if config.is_chainview_enabled() {
            info!("  - Chainview Service (/chain)");
            let chainview_service = ChainviewHttpService::new(config.clone());
            service_manager.add_service(ServiceContainer::chainview(chainview_service));
        }

        Ok(service_manager)
    }

    /// 显示服务信息
    fn display_service_info(config: &AgrixConfig) {
        let http_config = &config.bind.http;
        let http_url = format!("http://{}:{}", http_config.ip, http_config.port);

        info!("✅ 所有服务已启动");
        info!("📡 HTTP 服务器监听在: {}", http_url);
        info!("🔧 可用的API端点:");
        if config.is_qrt_enabled() {
            info!("  - {}/qrt/health", http_url);
            info!("  - {}/qrt/encrypt (POST)", http_url);
            info!("  - {}/qrt/token/issue (POST)", http_url);
        }
        if config.is_chainview_enabled() {
            info!("  - {}/chain/health", http_url);
            info!("  - {}/chain/plan/{{address}}", http_url);
        }
        info!("  - {}/metrics", http_url);
    }
}

/// 设置Ctrl-C信号处理程序
async fn setup_ctrl_c_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("无法监听Ctrl-C信号: {}", e);
            return;
        }
        info!("收到Ctrl-C信号，开始优雅关闭...");
        let _ = shutdown_tx.send(());
    });
}
