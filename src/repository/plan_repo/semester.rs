use crate::domain::plan::PlanSemester;
use crate::domain::types::Term;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::plan_repo::enum_parse_failure;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanSemesterRepository - 计划学期仓储
// ==========================================
// 红线: semester_no 在草稿内从 1 连续; is_locked 播种后不变
pub struct PlanSemesterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanSemesterRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, semester: &PlanSemester) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, semester)
    }

    /// 在调用方持有的连接/事务上插入学期
    ///
    /// 草稿播种时由 draft 仓储在同一事务内调用
    pub(crate) fn insert_tx(conn: &Connection, semester: &PlanSemester) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO plan_semester (draft_id, semester_no, term, year, is_locked)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &semester.draft_id,
                &semester.semester_no,
                semester.term.to_db_str(),
                &semester.year,
                if semester.is_locked { 1 } else { 0 },
            ],
        )?;

        Ok(())
    }

    pub fn find(&self, draft_id: &str, semester_no: i64) -> RepositoryResult<Option<PlanSemester>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT draft_id, semester_no, term, year, is_locked
               FROM plan_semester WHERE draft_id = ? AND semester_no = ?"#,
            params![draft_id, semester_no],
            Self::map_row,
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询草稿的全部学期, 按 semester_no 升序
    pub fn list_by_draft(&self, draft_id: &str) -> RepositoryResult<Vec<PlanSemester>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT draft_id, semester_no, term, year, is_locked
               FROM plan_semester WHERE draft_id = ?
               ORDER BY semester_no ASC"#,
        )?;

        let semesters = stmt
            .query_map(params![draft_id], Self::map_row)?
            .collect::<Result<Vec<PlanSemester>, _>>()?;

        Ok(semesters)
    }

    /// 草稿当前最大学期序号 (无学期时 None)
    pub fn max_semester_no(&self, draft_id: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;

        let max: Option<i64> = conn.query_row(
            "SELECT MAX(semester_no) FROM plan_semester WHERE draft_id = ?",
            params![draft_id],
            |row| row.get(0),
        )?;

        Ok(max)
    }

    /// 删除学期及其条目 (单事务)
    ///
    /// 红线: 只允许删除末位学期 (由 DraftManager 守卫连续性)
    pub fn delete_with_entries(&self, draft_id: &str, semester_no: i64) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM plan_entry WHERE draft_id = ? AND semester_no = ?",
            params![draft_id, semester_no],
        )?;
        let changed = tx.execute(
            "DELETE FROM plan_semester WHERE draft_id = ? AND semester_no = ?",
            params![draft_id, semester_no],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PlanSemester".to_string(),
                id: format!("{}#{}", draft_id, semester_no),
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PlanSemester> {
        let term_raw: String = row.get(2)?;
        Ok(PlanSemester {
            draft_id: row.get(0)?,
            semester_no: row.get(1)?,
            term: Term::from_str(&term_raw).ok_or_else(|| enum_parse_failure(2, &term_raw))?,
            year: row.get(3)?,
            is_locked: row.get::<_, i64>(4)? != 0,
        })
    }
}
