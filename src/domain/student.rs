// ==========================================
// 修业计划审核系统 - 学生侧实体
// ==========================================
// Student / ProgramAssignment / TranscriptEntry
// 成绩单是注册中心维护的不可变历史记录, 本核心只读
// ==========================================

use crate::domain::types::{ProgramType, Term, TranscriptStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// Student - 学生
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub student_name: String,
    /// 入学年份, 默认草稿的学期序列从该年秋季开始
    pub enrollment_year: i32,
}

// ==========================================
// ProgramAssignment - 方案指派
// ==========================================
// 审核时: 主修取唯一 primary, 辅修/方向各取一个
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramAssignment {
    pub student_id: String,
    pub program_id: String,
    pub assignment_type: ProgramType,
    pub is_primary: bool,
}

// ==========================================
// TranscriptEntry - 成绩单条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub entry_id: String,
    pub student_id: String,
    pub course_id: String,
    pub term: Term,
    pub year: i32,
    pub status: TranscriptStatus,
    /// 字母等第 (如 "A-"); 通过/不通过等非等第标记不计入 GPA
    pub grade: Option<String>,
    pub credits_earned: f64,
}

impl TranscriptEntry {
    /// 学期标识 (year, term), 用于统计已确认学期数
    pub fn semester_key(&self) -> (i32, Term) {
        (self.year, self.term)
    }
}
