// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 审批/审核路径的日志默认开到 info, 依赖库只保留 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认日志过滤器: 依赖库 warn, 本 crate info
const DEFAULT_FILTER: &str = "warn,study_plan_audit=info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: warn,study_plan_audit=info）
///   例如: RUST_LOG=study_plan_audit=trace 可观察单条审批裁决的全过程
///
/// # 示例
/// ```no_run
/// use study_plan_audit::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // target 是模块路径, 审批日志靠它区分 plan_api 与 audit 来源
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 本 crate 开到 debug, 便于跟踪状态机转换与先修判定
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("warn,study_plan_audit=debug"))
        .with_test_writer()
        .try_init();
}
