// ==========================================
// 修业计划审核系统 - API 层
// ==========================================
// 红线: API 是外部调用的唯一入口, 引擎与仓储不直接对外
// ==========================================
// 职责: 参数校验 / 权限校验 / 错误归类 / 告警汇总
// ==========================================

pub mod audit_api;
pub mod catalog_api;
pub mod error;
pub mod plan_api;

// 重导出核心 API
pub use audit_api::AuditApi;
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult, PlanWarning};
pub use plan_api::{PlanApi, SemesterView};
