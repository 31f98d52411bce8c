// ==========================================
// 修业计划审核系统 - 业务引擎层
// ==========================================
// 红线: 引擎只做计算与规则裁决, 状态落库走仓储层
// ==========================================
// 职责: 先修图检查 / 满足度评估 / 学位审核 / 状态机 / 草稿管理
// ==========================================

pub mod audit;
pub mod draft_manager;
pub mod plan_state;
pub mod prereq_graph;
pub mod requirement;

// 重导出核心引擎
pub use audit::DegreeAuditEngine;
pub use draft_manager::DraftManager;
pub use plan_state::SemesterAction;
pub use prereq_graph::{
    CreditStanding, PlacementCheck, PlacementViolation, PrerequisiteGraph, StandingEvaluator,
    StudentHistory, ViolationSeverity,
};
pub use requirement::{evaluate_program, RequirementTree, StudentRecordView};
