use crate::domain::plan::{ApprovalRecord, PlanEntry};
use crate::domain::types::PlanEntryStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::plan_repo::approval::ApprovalRecordRepository;
use crate::repository::plan_repo::{enum_parse_failure, parse_ts_column, TS_FORMAT};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanEntryRepository - 计划条目仓储
// ==========================================
// 红线: 状态列只能经 transition_semester 修改
// 红线: 整学期转换要么全部生效要么全部回滚
pub struct PlanEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanEntryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 添加条目
    ///
    /// # 返回
    /// - `Err(UniqueConstraintViolation)`: 课程已在该草稿中 (跨学期唯一)
    pub fn insert(&self, entry: &PlanEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO plan_entry (
                draft_id, course_id, semester_no, status, sort_order, prereqs_met, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &entry.draft_id,
                &entry.course_id,
                &entry.semester_no,
                entry.status.to_db_str(),
                &entry.sort_order,
                if entry.prereqs_met { 1 } else { 0 },
                &entry.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }

    pub fn find(&self, draft_id: &str, course_id: &str) -> RepositoryResult<Option<PlanEntry>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT draft_id, course_id, semester_no, status, sort_order, prereqs_met, created_at
               FROM plan_entry WHERE draft_id = ? AND course_id = ?"#,
            params![draft_id, course_id],
            Self::map_row,
        ) {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询单学期条目, 按 sort_order 升序
    pub fn list_by_semester(&self, draft_id: &str, semester_no: i64) -> RepositoryResult<Vec<PlanEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT draft_id, course_id, semester_no, status, sort_order, prereqs_met, created_at
               FROM plan_entry WHERE draft_id = ? AND semester_no = ?
               ORDER BY sort_order ASC, course_id ASC"#,
        )?;

        let entries = stmt
            .query_map(params![draft_id, semester_no], Self::map_row)?
            .collect::<Result<Vec<PlanEntry>, _>>()?;

        Ok(entries)
    }

    /// 查询草稿全部条目
    pub fn list_by_draft(&self, draft_id: &str) -> RepositoryResult<Vec<PlanEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT draft_id, course_id, semester_no, status, sort_order, prereqs_met, created_at
               FROM plan_entry WHERE draft_id = ?
               ORDER BY semester_no ASC, sort_order ASC, course_id ASC"#,
        )?;

        let entries = stmt
            .query_map(params![draft_id], Self::map_row)?
            .collect::<Result<Vec<PlanEntry>, _>>()?;

        Ok(entries)
    }

    /// 移动条目到目标学期 (不改状态)
    pub fn update_placement(
        &self,
        draft_id: &str,
        course_id: &str,
        semester_no: i64,
        sort_order: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE plan_entry SET semester_no = ?, sort_order = ?
               WHERE draft_id = ? AND course_id = ?"#,
            params![semester_no, sort_order, draft_id, course_id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PlanEntry".to_string(),
                id: format!("{}#{}", draft_id, course_id),
            });
        }

        Ok(())
    }

    /// 更新先修检查快照
    pub fn set_prereqs_met(&self, draft_id: &str, course_id: &str, met: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "UPDATE plan_entry SET prereqs_met = ? WHERE draft_id = ? AND course_id = ?",
            params![if met { 1 } else { 0 }, draft_id, course_id],
        )?;

        Ok(())
    }

    /// 删除条目
    pub fn delete(&self, draft_id: &str, course_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            "DELETE FROM plan_entry WHERE draft_id = ? AND course_id = ?",
            params![draft_id, course_id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PlanEntry".to_string(),
                id: format!("{}#{}", draft_id, course_id),
            });
        }

        Ok(())
    }

    /// 整学期状态转换 (单事务 + 事务内前置状态复查)
    ///
    /// # 参数
    /// - `from`: 期望的当前状态 (全部条目必须一致)
    /// - `to`: 目标状态
    ///
    /// # 返回
    /// - `Ok(count)`: 转换的条目数
    /// - `Err(StateConflict)`: 有条目不处于期望状态 (并发修改或重复提交)
    ///
    /// 说明: 先在事务内复查再更新, 使"SUBMITTED → APPROVED"对同一学期
    /// 永远不会成功两次; 重试在学期粒度上幂等 (第二次得到 StateConflict)。
    pub fn transition_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
        from: PlanEntryStatus,
        to: PlanEntryStatus,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let changed = Self::apply_transition(&tx, draft_id, semester_no, from, to)?;
        tx.commit()?;
        Ok(changed)
    }

    /// 提交转换: 状态更新与先修快照刷新同一事务
    ///
    /// 提交前调用方已完成严格先修检查, 整学期快照置为已满足;
    /// 任一步失败整体回滚, 不产生"已提交但快照陈旧"的条目。
    pub fn transition_and_refresh_met(
        &self,
        draft_id: &str,
        semester_no: i64,
        from: PlanEntryStatus,
        to: PlanEntryStatus,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let changed = Self::apply_transition(&tx, draft_id, semester_no, from, to)?;
        tx.execute(
            "UPDATE plan_entry SET prereqs_met = 1 WHERE draft_id = ? AND semester_no = ?",
            params![draft_id, semester_no],
        )?;
        tx.commit()?;
        Ok(changed)
    }

    /// 审批转换: 状态更新与审批记录追加同一事务
    ///
    /// 红线: 记录写入失败时状态转换一并回滚, 审批轨迹与状态永不脱节
    pub fn transition_with_approval(
        &self,
        draft_id: &str,
        semester_no: i64,
        from: PlanEntryStatus,
        to: PlanEntryStatus,
        record: &ApprovalRecord,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let changed = Self::apply_transition(&tx, draft_id, semester_no, from, to)?;
        ApprovalRecordRepository::insert_tx(&tx, record)?;
        tx.commit()?;
        Ok(changed)
    }

    /// 事务内的转换核心: 前置状态复查 + 整学期 UPDATE
    fn apply_transition(
        tx: &Transaction,
        draft_id: &str,
        semester_no: i64,
        from: PlanEntryStatus,
        to: PlanEntryStatus,
    ) -> RepositoryResult<usize> {
        let total: i64 = tx.query_row(
            "SELECT COUNT(*) FROM plan_entry WHERE draft_id = ? AND semester_no = ?",
            params![draft_id, semester_no],
            |row| row.get(0),
        )?;

        if total == 0 {
            return Err(RepositoryError::StateConflict {
                message: format!("学期{}没有计划条目, 无法转换状态", semester_no),
            });
        }

        let mismatched: i64 = tx.query_row(
            r#"SELECT COUNT(*) FROM plan_entry
               WHERE draft_id = ? AND semester_no = ? AND status != ?"#,
            params![draft_id, semester_no, from.to_db_str()],
            |row| row.get(0),
        )?;

        if mismatched > 0 {
            return Err(RepositoryError::StateConflict {
                message: format!(
                    "学期{}存在{}个条目不处于{}状态, 转换被拒绝",
                    semester_no, mismatched, from
                ),
            });
        }

        let changed = tx.execute(
            r#"UPDATE plan_entry SET status = ?
               WHERE draft_id = ? AND semester_no = ? AND status = ?"#,
            params![to.to_db_str(), draft_id, semester_no, from.to_db_str()],
        )?;

        // 复查后条目数仍须一致, 否则回滚
        if changed as i64 != total {
            return Err(RepositoryError::StateConflict {
                message: format!(
                    "学期{}状态转换不完整 (期望{}条, 实际{}条), 已回滚",
                    semester_no, total, changed
                ),
            });
        }

        Ok(changed)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PlanEntry> {
        let status_raw: String = row.get(3)?;
        Ok(PlanEntry {
            draft_id: row.get(0)?,
            course_id: row.get(1)?,
            semester_no: row.get(2)?,
            status: PlanEntryStatus::from_str(&status_raw)
                .ok_or_else(|| enum_parse_failure(3, &status_raw))?,
            sort_order: row.get(4)?,
            prereqs_met: row.get::<_, i64>(5)? != 0,
            created_at: parse_ts_column(6, &row.get::<_, String>(6)?)?,
        })
    }
}
