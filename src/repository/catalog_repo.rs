// ==========================================
// 修业计划审核系统 - 课程目录仓储
// ==========================================
// CourseRepository / CourseDependencyRepository
// 课程目录由外部协作方维护; 本层承担读取与编目写入
// ==========================================

use crate::domain::course::{Course, CourseDependency};
use crate::domain::types::DependencyKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 枚举列解析失败时转换为 rusqlite 行映射错误
fn enum_parse_failure(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析枚举值: {}", value).into(),
    )
}

// ==========================================
// CourseRepository - 课程仓储
// ==========================================
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入课程 (编目侧)
    pub fn insert(&self, course: &Course) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO course (course_id, course_code, title, credits, is_active)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &course.course_id,
                &course.course_code,
                &course.title,
                &course.credits,
                if course.is_active { 1 } else { 0 },
            ],
        )?;

        Ok(())
    }

    /// 按course_id查询课程
    ///
    /// # 返回
    /// - `Ok(Some(Course))`: 找到课程
    /// - `Ok(None)`: 未找到
    pub fn find_by_id(&self, course_id: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT course_id, course_code, title, credits, is_active
               FROM course WHERE course_id = ?"#,
            params![course_id],
            Self::map_row,
        ) {
            Ok(course) => Ok(Some(course)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按课程代码查询
    pub fn find_by_code(&self, course_code: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT course_id, course_code, title, credits, is_active
               FROM course WHERE course_code = ?"#,
            params![course_code],
            Self::map_row,
        ) {
            Ok(course) => Ok(Some(course)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部课程, 按课程代码升序
    pub fn list_all(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT course_id, course_code, title, credits, is_active
               FROM course ORDER BY course_code ASC"#,
        )?;

        let courses = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Course>, _>>()?;

        Ok(courses)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Course> {
        Ok(Course {
            course_id: row.get(0)?,
            course_code: row.get(1)?,
            title: row.get(2)?,
            credits: row.get(3)?,
            is_active: row.get::<_, i64>(4)? != 0,
        })
    }
}

// ==========================================
// CourseDependencyRepository - 课程依赖仓储
// ==========================================
// 红线: PREREQUISITE 边写入前必须通过成环校验 (由编目 API 调用图引擎完成)
pub struct CourseDependencyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseDependencyRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入依赖边
    pub fn insert(&self, dep: &CourseDependency) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO course_dependency (
                dependency_id, course_id, dependency_course_id,
                dep_kind, required_status, note
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &dep.dependency_id,
                &dep.course_id,
                &dep.dependency_course_id,
                dep.kind.to_db_str(),
                &dep.required_status,
                &dep.note,
            ],
        )?;

        Ok(())
    }

    /// 查询全部依赖边 (用于构建课程依赖图)
    pub fn list_all(&self) -> RepositoryResult<Vec<CourseDependency>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT dependency_id, course_id, dependency_course_id,
                      dep_kind, required_status, note
               FROM course_dependency"#,
        )?;

        let deps = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<CourseDependency>, _>>()?;

        Ok(deps)
    }

    /// 查询指定课程的出边
    pub fn list_by_course(&self, course_id: &str) -> RepositoryResult<Vec<CourseDependency>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT dependency_id, course_id, dependency_course_id,
                      dep_kind, required_status, note
               FROM course_dependency WHERE course_id = ?"#,
        )?;

        let deps = stmt
            .query_map(params![course_id], Self::map_row)?
            .collect::<Result<Vec<CourseDependency>, _>>()?;

        Ok(deps)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<CourseDependency> {
        let kind_raw: String = row.get(3)?;
        let kind = DependencyKind::from_str(&kind_raw)
            .ok_or_else(|| enum_parse_failure(3, &kind_raw))?;

        Ok(CourseDependency {
            dependency_id: row.get(0)?,
            course_id: row.get(1)?,
            dependency_course_id: row.get(2)?,
            kind,
            required_status: row.get(4)?,
            note: row.get(5)?,
        })
    }
}
