// ==========================================
// 修业计划审核系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中 schema 初始化，测试与生产共用同一份 DDL
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构与实体集一一对应:
/// - 课程目录: course / course_dependency
/// - 培养方案: program / requirement_group / requirement_group_course / minor_compatibility
/// - 学生侧: student / student_program / advisor_assignment / transcript_entry
/// - 计划侧: plan_draft / plan_semester / plan_entry / approval_record
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS course (
            course_id TEXT PRIMARY KEY,
            course_code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            credits REAL NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS course_dependency (
            dependency_id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES course(course_id),
            dependency_course_id TEXT REFERENCES course(course_id),
            dep_kind TEXT NOT NULL,
            required_status TEXT,
            note TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_course_dependency_course
            ON course_dependency(course_id);

        CREATE TABLE IF NOT EXISTS program (
            program_id TEXT PRIMARY KEY,
            program_name TEXT NOT NULL,
            program_type TEXT NOT NULL,
            parent_program_id TEXT REFERENCES program(program_id),
            total_credits_required REAL NOT NULL,
            minor_policy TEXT NOT NULL DEFAULT 'NO',
            concentration_policy TEXT NOT NULL DEFAULT 'NOT_AVAILABLE'
        );

        CREATE TABLE IF NOT EXISTS requirement_group (
            group_id TEXT PRIMARY KEY,
            program_id TEXT NOT NULL REFERENCES program(program_id),
            parent_group_id TEXT REFERENCES requirement_group(group_id),
            group_name TEXT NOT NULL,
            credits_required REAL NOT NULL DEFAULT 0,
            min_courses_required INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_requirement_group_program
            ON requirement_group(program_id);

        CREATE TABLE IF NOT EXISTS requirement_group_course (
            group_id TEXT NOT NULL REFERENCES requirement_group(group_id),
            course_id TEXT NOT NULL REFERENCES course(course_id),
            is_mandatory INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (group_id, course_id)
        );

        CREATE TABLE IF NOT EXISTS minor_compatibility (
            major_program_id TEXT NOT NULL REFERENCES program(program_id),
            minor_program_id TEXT NOT NULL REFERENCES program(program_id),
            rule TEXT NOT NULL,
            PRIMARY KEY (major_program_id, minor_program_id)
        );

        CREATE TABLE IF NOT EXISTS student (
            student_id TEXT PRIMARY KEY,
            student_name TEXT NOT NULL,
            enrollment_year INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS student_program (
            student_id TEXT NOT NULL REFERENCES student(student_id),
            program_id TEXT NOT NULL REFERENCES program(program_id),
            assignment_type TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            assigned_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (student_id, program_id)
        );

        CREATE TABLE IF NOT EXISTS advisor_assignment (
            advisor_id TEXT NOT NULL,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            PRIMARY KEY (advisor_id, student_id)
        );

        CREATE TABLE IF NOT EXISTS transcript_entry (
            entry_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            course_id TEXT NOT NULL REFERENCES course(course_id),
            term TEXT NOT NULL,
            year INTEGER NOT NULL,
            status TEXT NOT NULL,
            grade TEXT,
            credits_earned REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transcript_entry_student
            ON transcript_entry(student_id);

        CREATE TABLE IF NOT EXISTS plan_draft (
            draft_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            draft_name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (student_id, draft_name)
        );

        CREATE TABLE IF NOT EXISTS plan_semester (
            draft_id TEXT NOT NULL REFERENCES plan_draft(draft_id) ON DELETE CASCADE,
            semester_no INTEGER NOT NULL,
            term TEXT NOT NULL,
            year INTEGER NOT NULL,
            is_locked INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (draft_id, semester_no)
        );

        CREATE TABLE IF NOT EXISTS plan_entry (
            draft_id TEXT NOT NULL REFERENCES plan_draft(draft_id) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES course(course_id),
            semester_no INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            sort_order INTEGER NOT NULL DEFAULT 0,
            prereqs_met INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            PRIMARY KEY (draft_id, course_id)
        );
        CREATE INDEX IF NOT EXISTS idx_plan_entry_semester
            ON plan_entry(draft_id, semester_no);

        CREATE TABLE IF NOT EXISTS approval_record (
            approval_id TEXT PRIMARY KEY,
            draft_id TEXT NOT NULL REFERENCES plan_draft(draft_id) ON DELETE CASCADE,
            semester_no INTEGER NOT NULL,
            advisor_id TEXT NOT NULL,
            decision TEXT NOT NULL,
            comments TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_approval_record_semester
            ON approval_record(draft_id, semester_no);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}
