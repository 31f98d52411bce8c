use crate::domain::plan::{PlanDraft, PlanSemester};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::plan_repo::semester::PlanSemesterRepository;
use crate::repository::plan_repo::{parse_ts_column, TS_FORMAT};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanDraftRepository - 计划草稿仓储
// ==========================================
pub struct PlanDraftRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanDraftRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建草稿
    ///
    /// # 返回
    /// - `Ok(draft_id)`: 成功
    /// - `Err(UniqueConstraintViolation)`: 同名草稿已存在
    pub fn insert(&self, draft: &PlanDraft) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, draft)?;
        Ok(draft.draft_id.clone())
    }

    /// 创建草稿并播种学期序列, 单事务完成
    ///
    /// 红线: 草稿与其学期要么一起落库要么都不落, 不产生零学期草稿
    pub fn insert_seeded(
        &self,
        draft: &PlanDraft,
        semesters: &[PlanSemester],
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::insert_tx(&tx, draft)?;
        for semester in semesters {
            PlanSemesterRepository::insert_tx(&tx, semester)?;
        }

        tx.commit()?;
        Ok(draft.draft_id.clone())
    }

    fn insert_tx(conn: &Connection, draft: &PlanDraft) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO plan_draft (
                draft_id, student_id, draft_name, is_default, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &draft.draft_id,
                &draft.student_id,
                &draft.draft_name,
                if draft.is_default { 1 } else { 0 },
                &draft.created_at.format(TS_FORMAT).to_string(),
                &draft.updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, draft_id: &str) -> RepositoryResult<Option<PlanDraft>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT draft_id, student_id, draft_name, is_default, created_at, updated_at
               FROM plan_draft WHERE draft_id = ?"#,
            params![draft_id],
            Self::map_row,
        ) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询学生的默认草稿
    pub fn find_default(&self, student_id: &str) -> RepositoryResult<Option<PlanDraft>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT draft_id, student_id, draft_name, is_default, created_at, updated_at
               FROM plan_draft WHERE student_id = ? AND is_default = 1"#,
            params![student_id],
            Self::map_row,
        ) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按名称查询学生草稿 (名称在学生内唯一)
    pub fn find_by_name(&self, student_id: &str, draft_name: &str) -> RepositoryResult<Option<PlanDraft>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT draft_id, student_id, draft_name, is_default, created_at, updated_at
               FROM plan_draft WHERE student_id = ? AND draft_name = ?"#,
            params![student_id, draft_name],
            Self::map_row,
        ) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询学生全部草稿, 默认草稿在前
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<PlanDraft>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT draft_id, student_id, draft_name, is_default, created_at, updated_at
               FROM plan_draft WHERE student_id = ?
               ORDER BY is_default DESC, created_at ASC"#,
        )?;

        let drafts = stmt
            .query_map(params![student_id], Self::map_row)?
            .collect::<Result<Vec<PlanDraft>, _>>()?;

        Ok(drafts)
    }

    /// 重命名草稿
    pub fn rename(&self, draft_id: &str, new_name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE plan_draft SET draft_name = ?, updated_at = ? WHERE draft_id = ?"#,
            params![
                new_name,
                chrono::Local::now().naive_local().format(TS_FORMAT).to_string(),
                draft_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PlanDraft".to_string(),
                id: draft_id.to_string(),
            });
        }

        Ok(())
    }

    /// 删除草稿 (级联删除学期/条目/审批记录)
    ///
    /// 红线: 默认草稿不可删除, 由调用方 (DraftManager) 守卫
    pub fn delete(&self, draft_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM approval_record WHERE draft_id = ?", params![draft_id])?;
        tx.execute("DELETE FROM plan_entry WHERE draft_id = ?", params![draft_id])?;
        tx.execute("DELETE FROM plan_semester WHERE draft_id = ?", params![draft_id])?;
        tx.execute("DELETE FROM plan_draft WHERE draft_id = ?", params![draft_id])?;

        tx.commit()?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PlanDraft> {
        Ok(PlanDraft {
            draft_id: row.get(0)?,
            student_id: row.get(1)?,
            draft_name: row.get(2)?,
            is_default: row.get::<_, i64>(3)? != 0,
            created_at: parse_ts_column(4, &row.get::<_, String>(4)?)?,
            updated_at: parse_ts_column(5, &row.get::<_, String>(5)?)?,
        })
    }
}
