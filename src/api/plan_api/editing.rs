// ==========================================
// 计划编辑: 加课 / 移课 / 删课 / 学期增删
// ==========================================
// 红线: 只有 DRAFT 状态的学期可编辑; 锁定学期一律拒绝
// 宽松模式先修检查: 软违规随结果返回, 不阻断编辑
// ==========================================

use super::PlanApi;
use crate::api::error::{ApiError, ApiResult, PlanWarning};
use crate::domain::plan::{PlanEntry, PlanSemester};
use crate::domain::types::PlanEntryStatus;
use crate::engine::prereq_graph::CreditStanding;
use tracing::{debug, info};

impl PlanApi {
    /// 向草稿学期加入课程 (宽松先修检查)
    ///
    /// # 返回
    /// 软违规告警列表; 年级门槛等硬违规直接报错
    pub fn add_course(
        &self,
        draft_id: &str,
        course_id: &str,
        semester_no: i64,
    ) -> ApiResult<Vec<PlanWarning>> {
        let draft = self.require_draft(draft_id)?;
        let semester = self.require_semester(draft_id, semester_no)?;
        self.ensure_semester_editable(draft_id, &semester)?;

        let course = self
            .course_repo
            .find_by_id(course_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "课程".to_string(),
                id: course_id.to_string(),
            })?;
        if !course.is_active {
            return Err(ApiError::ValidationError(format!(
                "课程 {} 已停开, 不允许加入计划",
                course.course_code
            )));
        }

        // 同一草稿内课程跨学期唯一
        if self.entry_repo.find(draft_id, course_id)?.is_some() {
            return Err(ApiError::ConflictError(format!(
                "课程 {} 已在本草稿中",
                course.course_code
            )));
        }
        // 已确认修读的课程不允许重复计划
        let transcript = self.transcript_repo.list_by_student(&draft.student_id)?;
        if transcript
            .iter()
            .any(|e| e.course_id == course_id && e.status.is_confirmed())
        {
            return Err(ApiError::ConflictError(format!(
                "课程 {} 已在成绩单中完成",
                course.course_code
            )));
        }

        let (graph, history) =
            self.placement_context(&draft.student_id, draft_id, None)?;
        let standing = CreditStanding::new(history.completed_credits());
        let check = graph.can_place(course_id, semester_no, &history, false, &standing);

        if !check.ok {
            let reasons: Vec<String> =
                check.violations.iter().map(|v| v.message.clone()).collect();
            return Err(ApiError::ValidationError(reasons.join("; ")));
        }

        let warnings: Vec<PlanWarning> = check
            .violations
            .iter()
            .map(|v| PlanWarning::new(super::WARN_PREREQ, v.message.clone()))
            .collect();

        let sort_order = self.entry_repo.list_by_semester(draft_id, semester_no)?.len() as i64;
        let mut entry = PlanEntry::new(draft_id, course_id, semester_no, sort_order);
        entry.prereqs_met = warnings.is_empty();
        self.entry_repo.insert(&entry)?;

        debug!(
            "加课: draft={} course={} semester={} warnings={}",
            draft_id,
            course_id,
            semester_no,
            warnings.len()
        );
        Ok(warnings)
    }

    /// 把课程移到另一学期 (宽松先修检查, 刷新快照)
    pub fn move_course(
        &self,
        draft_id: &str,
        course_id: &str,
        to_semester_no: i64,
    ) -> ApiResult<Vec<PlanWarning>> {
        let draft = self.require_draft(draft_id)?;

        let entry = self
            .entry_repo
            .find(draft_id, course_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "PlanEntry".to_string(),
                id: format!("{}#{}", draft_id, course_id),
            })?;

        // 只看锁定标记; 移动不触发状态转换, 条目保持原状态
        let source = self.require_semester(draft_id, entry.semester_no)?;
        let target = self.require_semester(draft_id, to_semester_no)?;
        if source.is_locked || target.is_locked {
            return Err(ApiError::ConflictError(
                "锁定学期的课程不允许移动".to_string(),
            ));
        }

        // 宽松检查只用于刷新快照与告警, 不阻断移动 (提交时再严格复查)
        let (graph, history) =
            self.placement_context(&draft.student_id, draft_id, Some(course_id))?;
        let standing = CreditStanding::new(history.completed_credits());
        let check = graph.can_place(course_id, to_semester_no, &history, false, &standing);

        let warnings: Vec<PlanWarning> = check
            .violations
            .iter()
            .map(|v| PlanWarning::new(super::WARN_PREREQ, v.message.clone()))
            .collect();

        let sort_order = self
            .entry_repo
            .list_by_semester(draft_id, to_semester_no)?
            .len() as i64;
        self.entry_repo
            .update_placement(draft_id, course_id, to_semester_no, sort_order)?;
        self.entry_repo
            .set_prereqs_met(draft_id, course_id, warnings.is_empty())?;

        debug!(
            "移课: draft={} course={} {} → {}",
            draft_id, course_id, entry.semester_no, to_semester_no
        );
        Ok(warnings)
    }

    /// 从草稿移除课程
    pub fn remove_course(&self, draft_id: &str, course_id: &str) -> ApiResult<()> {
        self.require_draft(draft_id)?;

        let entry = self
            .entry_repo
            .find(draft_id, course_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "PlanEntry".to_string(),
                id: format!("{}#{}", draft_id, course_id),
            })?;
        if entry.status != PlanEntryStatus::Draft {
            return Err(ApiError::ConflictError(format!(
                "条目状态为 {}, 不允许移除",
                entry.status
            )));
        }

        let semester = self.require_semester(draft_id, entry.semester_no)?;
        if semester.is_locked {
            return Err(ApiError::ConflictError(
                "锁定学期的课程不允许移除".to_string(),
            ));
        }

        self.entry_repo.delete(draft_id, course_id)?;
        debug!("删课: draft={} course={}", draft_id, course_id);
        Ok(())
    }

    /// 在草稿末尾追加学期; `summer` 为 true 时插入夏季学期
    pub fn add_semester(&self, draft_id: &str, summer: bool) -> ApiResult<PlanSemester> {
        let semester = self.draft_manager.add_semester(draft_id, summer)?;
        info!(
            "追加学期: draft={} no={} {} {}",
            draft_id, semester.semester_no, semester.term, semester.year
        );
        Ok(semester)
    }

    /// 删除草稿末尾学期 (守卫见草稿管理器)
    pub fn remove_semester(&self, draft_id: &str, semester_no: i64) -> ApiResult<()> {
        self.draft_manager.remove_semester(draft_id, semester_no)?;
        info!("删除学期: draft={} no={}", draft_id, semester_no);
        Ok(())
    }

    /// 学期可编辑守卫: 未锁定且条目全为 DRAFT
    fn ensure_semester_editable(
        &self,
        draft_id: &str,
        semester: &PlanSemester,
    ) -> ApiResult<()> {
        if semester.is_locked {
            return Err(ApiError::ConflictError(format!(
                "学期 {} 已锁定, 不允许编辑",
                semester.semester_no
            )));
        }
        let entries = self
            .entry_repo
            .list_by_semester(draft_id, semester.semester_no)?;
        if entries.iter().any(|e| e.status != PlanEntryStatus::Draft) {
            return Err(ApiError::ConflictError(format!(
                "学期 {} 已提交或已审批, 不允许编辑",
                semester.semester_no
            )));
        }
        Ok(())
    }
}
