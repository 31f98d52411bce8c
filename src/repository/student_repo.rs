// ==========================================
// 修业计划审核系统 - 学生侧仓储
// ==========================================
// StudentRepository / ProgramAssignmentRepository /
// AdvisorAssignmentRepository / TranscriptRepository
// 红线: 成绩单由注册中心写入, 本核心只在测试与种子流程中插入
// ==========================================

use crate::domain::student::{ProgramAssignment, Student, TranscriptEntry};
use crate::domain::types::{ProgramType, Term, TranscriptStatus};
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
// StudentRepository - 学生仓储
// ==========================================
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, student: &Student) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO student (student_id, student_name, enrollment_year)
               VALUES (?, ?, ?)"#,
            params![
                &student.student_id,
                &student.student_name,
                &student.enrollment_year,
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT student_id, student_name, enrollment_year
               FROM student WHERE student_id = ?"#,
            params![student_id],
            |row| {
                Ok(Student {
                    student_id: row.get(0)?,
                    student_name: row.get(1)?,
                    enrollment_year: row.get(2)?,
                })
            },
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ==========================================
// ProgramAssignmentRepository - 方案指派仓储
// ==========================================
pub struct ProgramAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgramAssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, assignment: &ProgramAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO student_program (student_id, program_id, assignment_type, is_primary)
               VALUES (?, ?, ?, ?)"#,
            params![
                &assignment.student_id,
                &assignment.program_id,
                assignment.assignment_type.to_db_str(),
                if assignment.is_primary { 1 } else { 0 },
            ],
        )?;

        Ok(())
    }

    /// 查询学生的全部方案指派, 按指派时间升序
    ///
    /// 审核每趟只取: 唯一 primary 主修 + 各类型首个指派
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<ProgramAssignment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT student_id, program_id, assignment_type, is_primary
               FROM student_program WHERE student_id = ?
               ORDER BY assigned_at ASC, program_id ASC"#,
        )?;

        let assignments = stmt
            .query_map(params![student_id], |row| {
                let type_raw: String = row.get(2)?;
                Ok(ProgramAssignment {
                    student_id: row.get(0)?,
                    program_id: row.get(1)?,
                    assignment_type: ProgramType::from_str(&type_raw)
                        .ok_or_else(|| enum_parse_failure(2, &type_raw))?,
                    is_primary: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<Result<Vec<ProgramAssignment>, _>>()?;

        Ok(assignments)
    }
}

// ==========================================
// AdvisorAssignmentRepository - 导师指派仓储
// ==========================================
// 审批前置条件: 导师必须指派到学生 (AuthorizationError 的数据来源)
pub struct AdvisorAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AdvisorAssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn assign(&self, advisor_id: &str, student_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT OR IGNORE INTO advisor_assignment (advisor_id, student_id)
               VALUES (?, ?)"#,
            params![advisor_id, student_id],
        )?;

        Ok(())
    }

    pub fn is_assigned(&self, advisor_id: &str, student_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM advisor_assignment WHERE advisor_id = ? AND student_id = ?",
            params![advisor_id, student_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

// ==========================================
// TranscriptRepository - 成绩单仓储
// ==========================================
pub struct TranscriptRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TranscriptRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, entry: &TranscriptEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO transcript_entry (
                entry_id, student_id, course_id, term, year,
                status, grade, credits_earned
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &entry.entry_id,
                &entry.student_id,
                &entry.course_id,
                entry.term.to_db_str(),
                &entry.year,
                entry.status.to_db_str(),
                &entry.grade,
                &entry.credits_earned,
            ],
        )?;

        Ok(())
    }

    /// 查询学生的全部成绩单条目
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<TranscriptEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT entry_id, student_id, course_id, term, year,
                      status, grade, credits_earned
               FROM transcript_entry WHERE student_id = ?
               ORDER BY year ASC, term ASC"#,
        )?;

        let entries = stmt
            .query_map(params![student_id], |row| {
                let term_raw: String = row.get(3)?;
                let status_raw: String = row.get(5)?;
                Ok(TranscriptEntry {
                    entry_id: row.get(0)?,
                    student_id: row.get(1)?,
                    course_id: row.get(2)?,
                    term: Term::from_str(&term_raw)
                        .ok_or_else(|| enum_parse_failure(3, &term_raw))?,
                    year: row.get(4)?,
                    status: TranscriptStatus::from_str(&status_raw)
                        .ok_or_else(|| enum_parse_failure(5, &status_raw))?,
                    grade: row.get(6)?,
                    credits_earned: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<TranscriptEntry>, _>>()?;

        Ok(entries)
    }

    /// 统计学生成绩单中 distinct (year, term) 学期数
    ///
    /// 默认草稿播种时据此锁定前 N 个计划学期
    pub fn count_distinct_semesters(&self, student_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            r#"SELECT COUNT(*) FROM (
                   SELECT DISTINCT year, term FROM transcript_entry WHERE student_id = ?
               )"#,
            params![student_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}
