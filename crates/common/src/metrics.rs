//! Prometheus 监控指标模块
//!
//! 提供全局指标收集和导出功能

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::Once;
use std::time::Instant;

static METRICS_INIT: Once = Once::new();

lazy_static! {
    /// 全局 Prometheus Registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ========== 业务指标 ==========

    /// 凭证颁发次数（QRT）
    pub static ref TOKENS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_tokens_issued_total", "Total number of signed tokens issued")
            .namespace("agrix"),
        &["service", "status"]
    ).unwrap();

    /// 凭证验证次数（QRT）
    pub static ref TOKENS_VALIDATED: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_tokens_validated_total", "Total number of tokens validated")
            .namespace("agrix"),
        &["service", "status"]
    ).unwrap();

    // ========== 性能指标 ==========

    /// HTTP 请求延迟（秒）
    pub static ref REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("agrix_request_duration_seconds", "HTTP request duration in seconds")
            .namespace("agrix")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["service", "method", "path", "status"]
    ).unwrap();

    /// HTTP 请求总数
    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_requests_total", "Total number of HTTP requests")
            .namespace("agrix"),
        &["service", "method", "path", "status"]
    ).unwrap();

    /// 错误次数
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_errors_total", "Total number of errors")
            .namespace("agrix"),
        &["service", "error_type"]
    ).unwrap();

    // ========== 系统指标 ==========

    /// 短链映射命中次数
    pub static ref CACHE_HITS: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_cache_hits_total", "Total number of cache hits")
            .namespace("agrix"),
        &["cache_type"]
    ).unwrap();

    /// 短链映射未命中次数
    pub static ref CACHE_MISSES: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_cache_misses_total", "Total number of cache misses")
            .namespace("agrix"),
        &["cache_type"]
    ).unwrap();

    // ========== 安全指标 ==========

    /// 认证失败次数
    pub static ref AUTH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_auth_failures_total", "Total number of authentication failures")
            .namespace("agrix"),
        &["service", "reason"]
    ).unwrap();

    /// 非法请求次数
    pub static ref INVALID_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("agrix_invalid_requests_total", "Total number of invalid requests")
            .namespace("agrix"),
        &["service", "reason"]
    ).unwrap();
}

/// 注册所有指标到全局 Registry
///
/// This function is idempotent - calling it multiple times is safe.
/// Only the first call will actually register the metrics.
pub fn register_metrics() -> Result<(), prometheus::Error> {
    let mut result = Ok(());

    METRICS_INIT.call_once(|| {
        let register_result = (|| {
            // 业务指标
            REGISTRY.register(Box::new(TOKENS_ISSUED.clone()))?;
            REGISTRY.register(Box::new(TOKENS_VALIDATED.clone()))?;

            // 性能指标
            REGISTRY.register(Box::new(REQUEST_DURATION.clone()))?;
            REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
            REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;

            // 系统指标
            REGISTRY.register(Box::new(CACHE_HITS.clone()))?;
            REGISTRY.register(Box::new(CACHE_MISSES.clone()))?;

            // 安全指标
            REGISTRY.register(Box::new(AUTH_FAILURES.clone()))?;
            REGISTRY.register(Box::new(INVALID_REQUESTS.clone()))?;

            Ok::<(), prometheus::Error>(())
        })();

        if let Err(e) = register_result {
            result = Err(e);
        }
    });

    result
}

/// HTTP 请求计时器
pub struct RequestTimer {
    start: Instant,
    service: String,
    method: String,
    path: String,
}

impl RequestTimer {
    /// 创建计时器
    pub fn new(service: &str, method: &str, path: &str) -> Self {
        Self {
            start: Instant::now(),
            service: service.to_string(),
            method: method.to_string(),
            path: path.to_string(),
        }
    }

    /// 完成计时并记录指标
    pub fn observe(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();
        let status_str = status.to_string();

        REQUEST_DURATION
            .with_label_values(&[&self.service, &self.method, &self.path, &status_str])
            .observe(duration);

        REQUESTS_TOTAL
            .with_label_values(&[&self.service, &self.method, &self.path, &status_str])
            .inc();
    }
}

/// 导出 Prometheus 格式的指标
pub fn export_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();

    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let result = register_metrics();
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_request_timer() {
        let _ = register_metrics();

        let timer = RequestTimer::new("test-service", "GET", "/test");
        std::thread::sleep(std::time::Duration::from_millis(10));
        timer.observe(200);

        let before = REQUESTS_TOTAL
            .with_label_values(&["test-service", "GET", "/test", "200"])
            .get();

        let timer2 = RequestTimer::new("test-service", "GET", "/test");
        timer2.observe(200);

        let after = REQUESTS_TOTAL
            .with_label_values(&["test-service", "GET", "/test", "200"])
            .get();

        assert!(after > before);
    }

    #[test]
    fn test_export_metrics() {
        let _ = register_metrics();

        TOKENS_ISSUED.with_label_values(&["qrt", "success"]).inc();

        let output = export_metrics();
        assert!(
            output.contains("tokens_issued"),
            "Output should contain tokens_issued metric. Output: {}",
            output
        );
    }
}
