// ==========================================
// 计划生命周期: 提交 / 批准 / 驳回 / 退回修改
// ==========================================
// 红线: 学期内全部条目同进同退, 状态转换在单事务内校验并落库;
//       并发双写以 StateConflict 失败, 不产生半截状态
// 红线: 审批记录只追加; 提交本身不产生审批记录
// ==========================================

use super::PlanApi;
use crate::api::error::{ApiError, ApiResult, PlanWarning};
use crate::domain::plan::ApprovalRecord;
use crate::domain::types::ApprovalDecision;
use crate::engine::plan_state::{required_from, target_status, SemesterAction};
use crate::engine::prereq_graph::CreditStanding;
use tracing::info;

impl PlanApi {
    /// 提交学期待审批 (严格先修检查 + 学分负荷检查)
    ///
    /// # 返回
    /// 学分负荷告警 (低于下限/高于上限); 先修违规在严格模式下直接报错
    pub fn submit_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
    ) -> ApiResult<Vec<PlanWarning>> {
        let draft = self.require_draft(draft_id)?;
        let semester = self.require_semester(draft_id, semester_no)?;
        if semester.is_locked {
            return Err(ApiError::ConflictError(format!(
                "学期 {} 已锁定, 不允许提交",
                semester_no
            )));
        }

        let entries = self.entry_repo.list_by_semester(draft_id, semester_no)?;
        if entries.is_empty() {
            return Err(ApiError::ConflictError(format!(
                "学期 {} 没有计划条目, 不允许提交",
                semester_no
            )));
        }

        // === 严格模式先修检查: 任一硬违规即拒绝整次提交 ===
        let (graph, history) = self.placement_context(&draft.student_id, draft_id, None)?;
        let standing = CreditStanding::new(history.completed_credits());

        let mut reasons = Vec::new();
        for entry in &entries {
            let check = graph.can_place(&entry.course_id, semester_no, &history, true, &standing);
            if !check.ok {
                reasons.extend(check.violations.into_iter().map(|v| v.message));
            }
        }
        if !reasons.is_empty() {
            return Err(ApiError::ValidationError(reasons.join("; ")));
        }

        // === 学分负荷: 越界只告警, 不阻断 ===
        let mut warnings = Vec::new();
        let credits = self.semester_credits(&entries)?;
        let min_load = self
            .config
            .get_min_load_credits()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
        let max_load = self
            .config
            .get_max_load_credits()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
        if credits < min_load {
            warnings.push(PlanWarning::new(
                super::WARN_CREDIT_LOAD,
                format!("学期 {} 学分 {:.1} 低于下限 {:.1}", semester_no, credits, min_load),
            ));
        } else if credits > max_load {
            warnings.push(PlanWarning::new(
                super::WARN_CREDIT_LOAD,
                format!("学期 {} 学分 {:.1} 高于上限 {:.1}", semester_no, credits, max_load),
            ));
        }

        // 检查已通过: 状态转换与快照刷新在同一事务内落库
        self.entry_repo.transition_and_refresh_met(
            draft_id,
            semester_no,
            required_from(SemesterAction::Submit),
            target_status(SemesterAction::Submit),
        )?;

        info!(
            "提交学期: draft={} semester={} credits={:.1}",
            draft_id, semester_no, credits
        );
        Ok(warnings)
    }

    /// 导师批准学期
    pub fn approve_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
        advisor_id: &str,
        comments: &str,
    ) -> ApiResult<()> {
        self.decide_semester(
            draft_id,
            semester_no,
            advisor_id,
            comments,
            SemesterAction::Approve,
            ApprovalDecision::Approved,
        )
    }

    /// 导师驳回学期; 驳回意见必填
    pub fn reject_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
        advisor_id: &str,
        comments: &str,
    ) -> ApiResult<()> {
        if comments.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "驳回必须填写意见".to_string(),
            ));
        }
        self.decide_semester(
            draft_id,
            semester_no,
            advisor_id,
            comments,
            SemesterAction::Reject,
            ApprovalDecision::Rejected,
        )
    }

    /// 学生把驳回的学期退回草稿重新编辑
    pub fn revise_semester(&self, draft_id: &str, semester_no: i64) -> ApiResult<()> {
        self.require_draft(draft_id)?;
        self.require_semester(draft_id, semester_no)?;
        self.transition(draft_id, semester_no, SemesterAction::Revise)?;

        info!("退回修改: draft={} semester={}", draft_id, semester_no);
        Ok(())
    }

    /// 学期的审批历史 (时间升序)
    pub fn list_approvals(
        &self,
        draft_id: &str,
        semester_no: i64,
    ) -> ApiResult<Vec<ApprovalRecord>> {
        self.require_draft(draft_id)?;
        Ok(self.approval_repo.list_by_semester(draft_id, semester_no)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 审批裁决: 权限校验后, 状态转换与审批记录在单事务内落库
    fn decide_semester(
        &self,
        draft_id: &str,
        semester_no: i64,
        advisor_id: &str,
        comments: &str,
        action: SemesterAction,
        decision: ApprovalDecision,
    ) -> ApiResult<()> {
        let draft = self.require_draft(draft_id)?;
        self.require_semester(draft_id, semester_no)?;

        if !self.advisor_repo.is_assigned(advisor_id, &draft.student_id)? {
            return Err(ApiError::AuthorizationError(format!(
                "导师 {} 未指派给学生 {}",
                advisor_id, draft.student_id
            )));
        }

        // 状态转换与审批记录追加同一事务, 任一失败整体回滚
        let record = ApprovalRecord::new(draft_id, semester_no, advisor_id, decision, comments);
        self.entry_repo.transition_with_approval(
            draft_id,
            semester_no,
            required_from(action),
            target_status(action),
            &record,
        )?;

        info!(
            "审批裁决: draft={} semester={} advisor={} decision={}",
            draft_id, semester_no, advisor_id, decision
        );
        Ok(())
    }

    /// 学期整体状态转换 (事务内校验全部条目处于期望状态)
    fn transition(
        &self,
        draft_id: &str,
        semester_no: i64,
        action: SemesterAction,
    ) -> ApiResult<usize> {
        let changed = self.entry_repo.transition_semester(
            draft_id,
            semester_no,
            required_from(action),
            target_status(action),
        )?;
        Ok(changed)
    }

    fn semester_credits(&self, entries: &[crate::domain::plan::PlanEntry]) -> ApiResult<f64> {
        let courses = self.course_credit_map()?;
        Ok(entries
            .iter()
            .filter_map(|e| courses.get(&e.course_id))
            .sum())
    }
}
