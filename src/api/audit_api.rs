// ==========================================
// 修业计划审核系统 - 审核 API
// ==========================================
// 职责: 学位审核入口; 汇总口径见审核引擎
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::audit::AuditReport;
use crate::engine::audit::DegreeAuditEngine;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct AuditApi {
    config: ConfigManager,
    engine: DegreeAuditEngine,
}

impl AuditApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(format!("初始化配置失败: {}", e)))?;

        Ok(Self {
            config,
            engine: DegreeAuditEngine::new(conn),
        })
    }

    /// 执行学生的学位审核, 返回总报告
    pub fn run_audit(&self, student_id: &str) -> ApiResult<AuditReport> {
        let report = self.engine.run_audit(student_id, &self.config)?;
        info!(
            "审核报告: student={} programs={} warnings={}",
            student_id,
            report.per_program.len(),
            report.warnings.len()
        );
        Ok(report)
    }
}
