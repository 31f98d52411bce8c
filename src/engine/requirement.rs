// ==========================================
// 修业计划审核系统 - 课程要求满足度引擎
// ==========================================
// 职责: 课程组树构建/校验 + 自底向上满足度评估
// 红线: "已确认"与"预计"两套口径分开计算, 分开上报
// ==========================================

mod core;
mod report;
#[cfg(test)]
mod tests;

pub use self::core::{RequirementTree, RequirementTreeError, Satisfaction, StudentRecordView};
pub use self::report::evaluate_program;
