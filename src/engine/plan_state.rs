// ==========================================
// 修业计划审核系统 - 计划状态机
// ==========================================
// 状态机: DRAFT → SUBMITTED → {APPROVED, REJECTED}; REJECTED → DRAFT
// 红线: 转换表是唯一合法性来源, 调用方不得绕过自行改状态
// ==========================================

use crate::domain::types::PlanEntryStatus;
use crate::repository::{RepositoryError, RepositoryResult};
use std::fmt;

// ==========================================
// 学期级动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemesterAction {
    /// 学生提交学期待审批
    Submit,
    /// 导师批准
    Approve,
    /// 导师驳回
    Reject,
    /// 学生把驳回的学期改回草稿重新编辑
    Revise,
}

impl fmt::Display for SemesterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SemesterAction::Submit => "SUBMIT",
            SemesterAction::Approve => "APPROVE",
            SemesterAction::Reject => "REJECT",
            SemesterAction::Revise => "REVISE",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 转换表
// ==========================================

/// 动作要求的当前状态
pub fn required_from(action: SemesterAction) -> PlanEntryStatus {
    match action {
        SemesterAction::Submit => PlanEntryStatus::Draft,
        SemesterAction::Approve | SemesterAction::Reject => PlanEntryStatus::Submitted,
        SemesterAction::Revise => PlanEntryStatus::Rejected,
    }
}

/// 动作完成后的目标状态
pub fn target_status(action: SemesterAction) -> PlanEntryStatus {
    match action {
        SemesterAction::Submit => PlanEntryStatus::Submitted,
        SemesterAction::Approve => PlanEntryStatus::Approved,
        SemesterAction::Reject => PlanEntryStatus::Rejected,
        SemesterAction::Revise => PlanEntryStatus::Draft,
    }
}

/// 校验 (当前状态, 动作) 是否合法; 非法返回 InvalidStateTransition
pub fn validate_transition(
    current: PlanEntryStatus,
    action: SemesterAction,
) -> RepositoryResult<PlanEntryStatus> {
    if current != required_from(action) {
        return Err(RepositoryError::InvalidStateTransition {
            from: current.to_db_str().to_string(),
            to: target_status(action).to_db_str().to_string(),
        });
    }
    Ok(target_status(action))
}

/// 状态是否允许学生编辑 (加课/移课/删课)
pub fn is_editable(status: PlanEntryStatus) -> bool {
    matches!(status, PlanEntryStatus::Draft)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            validate_transition(PlanEntryStatus::Draft, SemesterAction::Submit).unwrap(),
            PlanEntryStatus::Submitted
        );
        assert_eq!(
            validate_transition(PlanEntryStatus::Submitted, SemesterAction::Approve).unwrap(),
            PlanEntryStatus::Approved
        );
        assert_eq!(
            validate_transition(PlanEntryStatus::Submitted, SemesterAction::Reject).unwrap(),
            PlanEntryStatus::Rejected
        );
        assert_eq!(
            validate_transition(PlanEntryStatus::Rejected, SemesterAction::Revise).unwrap(),
            PlanEntryStatus::Draft
        );
    }

    #[test]
    fn test_approved_is_terminal() {
        for action in [
            SemesterAction::Submit,
            SemesterAction::Approve,
            SemesterAction::Reject,
            SemesterAction::Revise,
        ] {
            assert!(matches!(
                validate_transition(PlanEntryStatus::Approved, action),
                Err(RepositoryError::InvalidStateTransition { .. })
            ));
        }
    }

    #[test]
    fn test_cannot_skip_submission() {
        assert!(validate_transition(PlanEntryStatus::Draft, SemesterAction::Approve).is_err());
        assert!(validate_transition(PlanEntryStatus::Draft, SemesterAction::Reject).is_err());
        assert!(validate_transition(PlanEntryStatus::Submitted, SemesterAction::Submit).is_err());
        assert!(validate_transition(PlanEntryStatus::Rejected, SemesterAction::Submit).is_err());
    }

    #[test]
    fn test_editability() {
        assert!(is_editable(PlanEntryStatus::Draft));
        assert!(!is_editable(PlanEntryStatus::Submitted));
        assert!(!is_editable(PlanEntryStatus::Approved));
        assert!(!is_editable(PlanEntryStatus::Rejected));
    }
}
