// ==========================================
// 修业计划审核系统 - 选课计划实体
// ==========================================
// PlanDraft / PlanSemester / PlanEntry / ApprovalRecord
// 红线: 每个学生任一时刻恰有一个默认草稿
// 红线: ApprovalRecord 只追加, 不覆写历史
// ==========================================

use crate::domain::types::{ApprovalDecision, PlanEntryStatus, Term};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanDraft - 计划草稿
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDraft {
    pub draft_id: String,
    pub student_id: String,
    pub draft_name: String,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PlanDraft {
    /// 创建新草稿 (生成 draft_id 与时间戳)
    pub fn new(student_id: &str, draft_name: &str, is_default: bool) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            draft_id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            draft_name: draft_name.to_string(),
            is_default,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// PlanSemester - 计划学期
// ==========================================
// semester_no 在草稿内从 1 连续递增
// is_locked 在播种时一次性计算, 此后不变 (行政覆写不在本核心范围)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSemester {
    pub draft_id: String,
    pub semester_no: i64,
    pub term: Term,
    pub year: i32,
    pub is_locked: bool,
}

// ==========================================
// PlanEntry - 计划条目
// ==========================================
// 一门课程在同一草稿内至多出现一次 (跨学期唯一)
// status 只能经状态机转换修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub draft_id: String,
    pub course_id: String,
    pub semester_no: i64,
    pub status: PlanEntryStatus,
    pub sort_order: i64,
    /// 加课时的先修检查快照 (宽松模式); 提交时以严格模式重查
    pub prereqs_met: bool,
    pub created_at: NaiveDateTime,
}

impl PlanEntry {
    pub fn new(draft_id: &str, course_id: &str, semester_no: i64, sort_order: i64) -> Self {
        Self {
            draft_id: draft_id.to_string(),
            course_id: course_id.to_string(),
            semester_no,
            status: PlanEntryStatus::Draft,
            sort_order,
            prereqs_met: true,
            created_at: chrono::Local::now().naive_local(),
        }
    }
}

// ==========================================
// ApprovalRecord - 审批记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approval_id: String,
    pub draft_id: String,
    pub semester_no: i64,
    pub advisor_id: String,
    pub decision: ApprovalDecision,
    pub comments: String,
    pub created_at: NaiveDateTime,
}

impl ApprovalRecord {
    pub fn new(
        draft_id: &str,
        semester_no: i64,
        advisor_id: &str,
        decision: ApprovalDecision,
        comments: &str,
    ) -> Self {
        Self {
            approval_id: uuid::Uuid::new_v4().to_string(),
            draft_id: draft_id.to_string(),
            semester_no,
            advisor_id: advisor_id.to_string(),
            decision,
            comments: comments.to_string(),
            created_at: chrono::Local::now().naive_local(),
        }
    }
}
