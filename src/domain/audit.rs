// ==========================================
// 修业计划审核系统 - 审核报告结构
// ==========================================
// DegreeAuditEngine / RequirementSatisfactionEngine 的输出 DTO
// 红线: "已确认"与"预计"两套满足度分开上报, 不得混淆
// ==========================================

use crate::domain::types::ProgramType;
use serde::{Deserialize, Serialize};

// ==========================================
// AuditWarning - 审核告警
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditWarning {
    /// 告警类型 (MINOR_FORBIDDEN / MISSING_CONCENTRATION / ...)
    pub warning_type: String,
    pub message: String,
}

impl AuditWarning {
    pub fn new(warning_type: &str, message: String) -> Self {
        Self {
            warning_type: warning_type.to_string(),
            message,
        }
    }
}

// ==========================================
// GroupReport - 单个课程组的满足度
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_id: String,
    pub group_name: String,
    pub credits_required: f64,
    pub min_courses_required: i64,

    /// 未满足的必修课程 (按课程代码上报)
    pub mandatory_unmet: Vec<String>,
    /// 选修池选中的课程代码 (学分最大化, 代码升序破平)
    pub bucket_selected: Vec<String>,
    /// 选修池缺口课程数
    pub bucket_shortfall: i64,
    /// 选修池缺口学分
    pub bucket_credit_gap: f64,

    /// 已确认满足学分 (成绩单 COMPLETED/TRANSFER + 计划 APPROVED)
    pub credits_confirmed: f64,
    /// 预计满足学分 (另含 SUBMITTED/DRAFT, 配置可关)
    pub credits_projected: f64,
    pub satisfied_confirmed: bool,
    pub satisfied_projected: bool,

    pub children: Vec<GroupReport>,
}

// ==========================================
// RequirementReport - 单个方案的满足度
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementReport {
    pub program_id: String,
    pub program_name: String,
    pub program_type: ProgramType,
    pub total_credits_required: f64,

    pub credits_confirmed: f64,
    pub credits_projected: f64,
    pub satisfied_confirmed: bool,
    pub satisfied_projected: bool,

    /// 自由选修剩余学分 = max(0, 方案总学分 - 各组已满足学分)
    /// 只是剩余量提示, 不是 pass/fail 判定
    pub free_elective_remaining: f64,

    pub groups: Vec<GroupReport>,
}

// ==========================================
// AuditReport - 学位审核总报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub student_id: String,
    pub per_program: Vec<RequirementReport>,

    /// GPA (两位小数); 无任何等第学分时为 None, 不报错
    pub gpa: Option<f64>,
    pub completed_credits: f64,
    pub in_progress_credits: f64,
    pub planned_credits: f64,

    pub warnings: Vec<AuditWarning>,
}
