// ==========================================
// 修业计划审核系统 - 培养方案实体
// ==========================================
// Program / RequirementGroup / MinorCompatibilityRule
// 课程组 parent_group_id 构成树, 必须无环 (写前校验)
// ==========================================

use crate::domain::types::{CompatibilityRule, ConcentrationPolicy, MinorPolicy, ProgramType};
use serde::{Deserialize, Serialize};

// ==========================================
// Program - 培养方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub program_id: String,
    pub program_name: String,
    pub program_type: ProgramType,
    /// 专业方向必须挂靠主修方案
    pub parent_program_id: Option<String>,
    pub total_credits_required: f64,
    pub minor_policy: MinorPolicy,
    pub concentration_policy: ConcentrationPolicy,
}

// ==========================================
// RequirementGroup - 课程要求组
// ==========================================
// 归属唯一方案; parent_group_id 可嵌套成树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementGroup {
    pub group_id: String,
    pub program_id: String,
    pub parent_group_id: Option<String>,
    pub group_name: String,
    /// 学分门槛; 0 表示无显式门槛 (仅汇总子组)
    pub credits_required: f64,
    /// 选修池最少课程数; 0 表示无选修池要求
    pub min_courses_required: i64,
}

// ==========================================
// GroupCourse - 课程组成员
// ==========================================
// 课程池按 is_mandatory 分为必修成员与选修池成员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCourse {
    pub group_id: String,
    pub course_id: String,
    pub is_mandatory: bool,
}

// ==========================================
// MinorCompatibilityRule - 主辅修兼容规则
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinorCompatibilityRule {
    pub major_program_id: String,
    pub minor_program_id: String,
    pub rule: CompatibilityRule,
}
