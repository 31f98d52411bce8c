// ==========================================
// 修业计划审核系统 - 启动入口
// ==========================================
// 职责: 初始化日志与数据库, 构建 API 层并输出启动摘要
// ==========================================

use std::sync::{Arc, Mutex};
use study_plan_audit::api::{AuditApi, CatalogApi, PlanApi};
use study_plan_audit::db;
use study_plan_audit::logging;
use tracing::{info, warn};

const DEFAULT_DB_PATH: &str = "study_plan_audit.db";

fn main() -> anyhow::Result<()> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    info!("修业计划审核系统启动, 数据库: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    match db::read_schema_version(&conn)? {
        Some(version) if version == db::CURRENT_SCHEMA_VERSION => {
            info!("schema_version = {}", version);
        }
        Some(version) => {
            warn!(
                "schema_version 不匹配: 库中 {} / 期望 {}, 请确认数据库来源",
                version,
                db::CURRENT_SCHEMA_VERSION
            );
        }
        None => {
            warn!("未读取到 schema_version, 数据库可能未初始化完整");
        }
    }

    let conn = Arc::new(Mutex::new(conn));
    let _catalog_api = CatalogApi::new(conn.clone());
    let _plan_api = PlanApi::new(conn.clone())
        .map_err(|e| anyhow::anyhow!("初始化计划 API 失败: {}", e))?;
    let _audit_api = AuditApi::new(conn)
        .map_err(|e| anyhow::anyhow!("初始化审核 API 失败: {}", e))?;

    info!("API 层就绪: catalog / plan / audit");
    Ok(())
}
