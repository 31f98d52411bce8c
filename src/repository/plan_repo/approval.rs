use crate::domain::plan::ApprovalRecord;
use crate::domain::types::ApprovalDecision;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::plan_repo::{enum_parse_failure, parse_ts_column, TS_FORMAT};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ApprovalRecordRepository - 审批记录仓储
// ==========================================
// 红线: 只追加; 新决定追加新记录, 不覆写历史
pub struct ApprovalRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ApprovalRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加审批记录
    pub fn append(&self, record: &ApprovalRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, record)
    }

    /// 在调用方持有的连接/事务上追加记录
    ///
    /// 状态转换与记录追加同事务时由 entry 仓储调用
    pub(crate) fn insert_tx(conn: &Connection, record: &ApprovalRecord) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO approval_record (
                approval_id, draft_id, semester_no, advisor_id,
                decision, comments, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &record.approval_id,
                &record.draft_id,
                &record.semester_no,
                &record.advisor_id,
                record.decision.to_db_str(),
                &record.comments,
                &record.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }

    /// 查询某学期的审批历史, 按时间升序
    pub fn list_by_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
    ) -> RepositoryResult<Vec<ApprovalRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT approval_id, draft_id, semester_no, advisor_id,
                      decision, comments, created_at
               FROM approval_record WHERE draft_id = ? AND semester_no = ?
               ORDER BY created_at ASC, approval_id ASC"#,
        )?;

        let records = stmt
            .query_map(params![draft_id, semester_no], Self::map_row)?
            .collect::<Result<Vec<ApprovalRecord>, _>>()?;

        Ok(records)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ApprovalRecord> {
        let decision_raw: String = row.get(4)?;
        Ok(ApprovalRecord {
            approval_id: row.get(0)?,
            draft_id: row.get(1)?,
            semester_no: row.get(2)?,
            advisor_id: row.get(3)?,
            decision: ApprovalDecision::from_str(&decision_raw)
                .ok_or_else(|| enum_parse_failure(4, &decision_raw))?,
            comments: row.get(5)?,
            created_at: parse_ts_column(6, &row.get::<_, String>(6)?)?,
        })
    }
}
