// ==========================================
// 修业计划审核系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、报告结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod course;
pub mod plan;
pub mod program;
pub mod student;
pub mod types;

// 重导出核心类型
pub use audit::{AuditReport, AuditWarning, GroupReport, RequirementReport};
pub use course::{Course, CourseDependency};
pub use plan::{ApprovalRecord, PlanDraft, PlanEntry, PlanSemester};
pub use program::{GroupCourse, MinorCompatibilityRule, Program, RequirementGroup};
pub use student::{ProgramAssignment, Student, TranscriptEntry};
pub use types::{
    ApprovalDecision, ClassStanding, CompatibilityRule, ConcentrationPolicy, DependencyKind,
    MinorPolicy, PlanEntryStatus, ProgramType, Term, TranscriptStatus,
};
