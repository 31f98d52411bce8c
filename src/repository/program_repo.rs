// ==========================================
// 修业计划审核系统 - 培养方案仓储
// ==========================================
// ProgramRepository / RequirementGroupRepository / MinorCompatibilityRepository
// 红线: 课程组树的成环校验在写前由引擎完成, 本层只提供查改
// ==========================================

use crate::domain::program::{GroupCourse, MinorCompatibilityRule, Program, RequirementGroup};
use crate::domain::types::{CompatibilityRule, ConcentrationPolicy, MinorPolicy, ProgramType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

fn enum_parse_failure(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析枚举值: {}", value).into(),
    )
}

// ==========================================
// ProgramRepository - 培养方案仓储
// ==========================================
pub struct ProgramRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgramRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, program: &Program) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO program (
                program_id, program_name, program_type, parent_program_id,
                total_credits_required, minor_policy, concentration_policy
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &program.program_id,
                &program.program_name,
                program.program_type.to_db_str(),
                &program.parent_program_id,
                &program.total_credits_required,
                program.minor_policy.to_db_str(),
                program.concentration_policy.to_db_str(),
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, program_id: &str) -> RepositoryResult<Option<Program>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT program_id, program_name, program_type, parent_program_id,
                      total_credits_required, minor_policy, concentration_policy
               FROM program WHERE program_id = ?"#,
            params![program_id],
            Self::map_row,
        ) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 统计指派到该方案的学生数 (删除守卫)
    pub fn count_assigned_students(&self, program_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM student_program WHERE program_id = ?",
            params![program_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 删除方案
    ///
    /// 红线: 调用方必须先确认无学生指派 (count_assigned_students == 0)
    pub fn delete(&self, program_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute("DELETE FROM program WHERE program_id = ?", params![program_id])?;

        Ok(())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Program> {
        let type_raw: String = row.get(2)?;
        let minor_raw: String = row.get(5)?;
        let conc_raw: String = row.get(6)?;

        Ok(Program {
            program_id: row.get(0)?,
            program_name: row.get(1)?,
            program_type: ProgramType::from_str(&type_raw)
                .ok_or_else(|| enum_parse_failure(2, &type_raw))?,
            parent_program_id: row.get(3)?,
            total_credits_required: row.get(4)?,
            minor_policy: MinorPolicy::from_str(&minor_raw)
                .ok_or_else(|| enum_parse_failure(5, &minor_raw))?,
            concentration_policy: ConcentrationPolicy::from_str(&conc_raw)
                .ok_or_else(|| enum_parse_failure(6, &conc_raw))?,
        })
    }
}

// ==========================================
// RequirementGroupRepository - 课程要求组仓储
// ==========================================
pub struct RequirementGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RequirementGroupRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, group: &RequirementGroup) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO requirement_group (
                group_id, program_id, parent_group_id, group_name,
                credits_required, min_courses_required
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &group.group_id,
                &group.program_id,
                &group.parent_group_id,
                &group.group_name,
                &group.credits_required,
                &group.min_courses_required,
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, group_id: &str) -> RepositoryResult<Option<RequirementGroup>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT group_id, program_id, parent_group_id, group_name,
                      credits_required, min_courses_required
               FROM requirement_group WHERE group_id = ?"#,
            params![group_id],
            Self::map_row,
        ) {
            Ok(g) => Ok(Some(g)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询方案下的全部课程组
    pub fn list_by_program(&self, program_id: &str) -> RepositoryResult<Vec<RequirementGroup>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT group_id, program_id, parent_group_id, group_name,
                      credits_required, min_courses_required
               FROM requirement_group WHERE program_id = ?
               ORDER BY group_name ASC"#,
        )?;

        let groups = stmt
            .query_map(params![program_id], Self::map_row)?
            .collect::<Result<Vec<RequirementGroup>, _>>()?;

        Ok(groups)
    }

    /// 修改父组指针
    ///
    /// 红线: 调用方必须先通过成环校验 (引擎 validate_reparent)
    pub fn update_parent(&self, group_id: &str, parent_group_id: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            "UPDATE requirement_group SET parent_group_id = ? WHERE group_id = ?",
            params![parent_group_id, group_id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RequirementGroup".to_string(),
                id: group_id.to_string(),
            });
        }

        Ok(())
    }

    /// 是否存在子组 (删除守卫)
    pub fn has_children(&self, group_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM requirement_group WHERE parent_group_id = ?",
            params![group_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// 删除课程组及其课程成员关系
    ///
    /// 红线: 调用方必须先确认无子组 (has_children == false)
    pub fn delete(&self, group_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM requirement_group_course WHERE group_id = ?",
            params![group_id],
        )?;
        tx.execute(
            "DELETE FROM requirement_group WHERE group_id = ?",
            params![group_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// 添加课程组成员
    pub fn add_course(&self, membership: &GroupCourse) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO requirement_group_course (group_id, course_id, is_mandatory)
               VALUES (?, ?, ?)"#,
            params![
                &membership.group_id,
                &membership.course_id,
                if membership.is_mandatory { 1 } else { 0 },
            ],
        )?;

        Ok(())
    }

    /// 查询方案下全部课程组成员关系
    pub fn list_courses_by_program(&self, program_id: &str) -> RepositoryResult<Vec<GroupCourse>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT gc.group_id, gc.course_id, gc.is_mandatory
               FROM requirement_group_course gc
               JOIN requirement_group g ON g.group_id = gc.group_id
               WHERE g.program_id = ?"#,
        )?;

        let memberships = stmt
            .query_map(params![program_id], |row| {
                Ok(GroupCourse {
                    group_id: row.get(0)?,
                    course_id: row.get(1)?,
                    is_mandatory: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<GroupCourse>, _>>()?;

        Ok(memberships)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<RequirementGroup> {
        Ok(RequirementGroup {
            group_id: row.get(0)?,
            program_id: row.get(1)?,
            parent_group_id: row.get(2)?,
            group_name: row.get(3)?,
            credits_required: row.get(4)?,
            min_courses_required: row.get(5)?,
        })
    }
}

// ==========================================
// MinorCompatibilityRepository - 主辅修兼容规则仓储
// ==========================================
pub struct MinorCompatibilityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MinorCompatibilityRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入或覆盖规则
    pub fn upsert(&self, rule: &MinorCompatibilityRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT OR REPLACE INTO minor_compatibility (
                major_program_id, minor_program_id, rule
            ) VALUES (?, ?, ?)"#,
            params![
                &rule.major_program_id,
                &rule.minor_program_id,
                rule.rule.to_db_str(),
            ],
        )?;

        Ok(())
    }

    /// 查询 (主修, 辅修) 规则; 无规则视为允许
    pub fn find(
        &self,
        major_program_id: &str,
        minor_program_id: &str,
    ) -> RepositoryResult<Option<CompatibilityRule>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT rule FROM minor_compatibility
               WHERE major_program_id = ? AND minor_program_id = ?"#,
            params![major_program_id, minor_program_id],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => Ok(Some(
                CompatibilityRule::from_str(&raw).ok_or_else(|| enum_parse_failure(0, &raw))?,
            )),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
