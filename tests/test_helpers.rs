// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时测试数据库初始化 + 常用测试数据构造
// ==========================================

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use study_plan_audit::db;
use study_plan_audit::domain::course::{Course, CourseDependency};
use study_plan_audit::domain::program::{GroupCourse, Program, RequirementGroup};
use study_plan_audit::domain::student::{Student, TranscriptEntry};
use study_plan_audit::domain::types::{
    ConcentrationPolicy, DependencyKind, MinorPolicy, ProgramType, Term, TranscriptStatus,
};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件 (需要保持存活)
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接 (与 API 层同款 Arc<Mutex<Connection>>)
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = db::open_sqlite_connection(db_path).unwrap();
    Arc::new(Mutex::new(conn))
}

// ==========================================
// 测试数据构造
// ==========================================

pub fn make_course(course_id: &str, course_code: &str, credits: f64) -> Course {
    Course {
        course_id: course_id.to_string(),
        course_code: course_code.to_string(),
        title: format!("{} 课程", course_code),
        credits,
        is_active: true,
    }
}

pub fn make_student(student_id: &str, enrollment_year: i32) -> Student {
    Student {
        student_id: student_id.to_string(),
        student_name: format!("学生-{}", student_id),
        enrollment_year,
    }
}

pub fn make_major(program_id: &str, total_credits: f64) -> Program {
    Program {
        program_id: program_id.to_string(),
        program_name: format!("方案-{}", program_id),
        program_type: ProgramType::Major,
        parent_program_id: None,
        total_credits_required: total_credits,
        minor_policy: MinorPolicy::No,
        concentration_policy: ConcentrationPolicy::NotAvailable,
    }
}

pub fn make_minor(program_id: &str, total_credits: f64) -> Program {
    Program {
        program_type: ProgramType::Minor,
        ..make_major(program_id, total_credits)
    }
}

pub fn make_group(
    group_id: &str,
    program_id: &str,
    parent: Option<&str>,
    credits_required: f64,
    min_courses: i64,
) -> RequirementGroup {
    RequirementGroup {
        group_id: group_id.to_string(),
        program_id: program_id.to_string(),
        parent_group_id: parent.map(|s| s.to_string()),
        group_name: format!("组-{}", group_id),
        credits_required,
        min_courses_required: min_courses,
    }
}

pub fn make_membership(group_id: &str, course_id: &str, mandatory: bool) -> GroupCourse {
    GroupCourse {
        group_id: group_id.to_string(),
        course_id: course_id.to_string(),
        is_mandatory: mandatory,
    }
}

pub fn make_prereq(course_id: &str, dependency_course_id: &str) -> CourseDependency {
    CourseDependency::course_edge(course_id, dependency_course_id, DependencyKind::Prerequisite)
}

pub fn make_transcript(
    student_id: &str,
    course_id: &str,
    term: Term,
    year: i32,
    status: TranscriptStatus,
    grade: Option<&str>,
    credits: f64,
) -> TranscriptEntry {
    TranscriptEntry {
        entry_id: uuid::Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        term,
        year,
        status,
        grade: grade.map(|g| g.to_string()),
        credits_earned: credits,
    }
}
