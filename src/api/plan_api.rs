// ==========================================
// 修业计划审核系统 - 计划 API
// ==========================================
// 职责: 草稿/学期/条目的编辑入口 + 提交/审批生命周期入口
// 红线: 软违规随成功结果返回告警, 硬违规直接报错, 不落半截数据
// ==========================================

mod editing;
mod lifecycle;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::plan::{PlanDraft, PlanEntry, PlanSemester};
use crate::domain::types::{PlanEntryStatus, Term};
use crate::engine::draft_manager::DraftManager;
use crate::engine::prereq_graph::{PrerequisiteGraph, StudentHistory};
use crate::repository::{
    AdvisorAssignmentRepository, ApprovalRecordRepository, CourseDependencyRepository,
    CourseRepository, PlanDraftRepository, PlanEntryRepository, PlanSemesterRepository,
    TranscriptRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// 告警类型常量
pub const WARN_PREREQ: &str = "PREREQ_SOFT";
pub const WARN_CREDIT_LOAD: &str = "CREDIT_LOAD";

// ==========================================
// SemesterView - 学期查询 DTO
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterView {
    pub semester_no: i64,
    pub term: Term,
    pub year: i32,
    pub is_locked: bool,
    /// 条目状态一致时为该状态; 空学期为 DRAFT; 混合时取首条目状态并置 has_mixed_status
    pub status: PlanEntryStatus,
    /// 移动操作可把不同状态的条目放进同一学期
    pub has_mixed_status: bool,
    pub total_credits: f64,
    pub entries: Vec<PlanEntry>,
}

// ==========================================
// PlanApi
// ==========================================
pub struct PlanApi {
    config: ConfigManager,
    draft_manager: DraftManager,
    draft_repo: PlanDraftRepository,
    semester_repo: PlanSemesterRepository,
    entry_repo: PlanEntryRepository,
    approval_repo: ApprovalRecordRepository,
    advisor_repo: AdvisorAssignmentRepository,
    transcript_repo: TranscriptRepository,
    course_repo: CourseRepository,
    dependency_repo: CourseDependencyRepository,
}

impl PlanApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(format!("初始化配置失败: {}", e)))?;

        Ok(Self {
            config,
            draft_manager: DraftManager::new(conn.clone()),
            draft_repo: PlanDraftRepository::new(conn.clone()),
            semester_repo: PlanSemesterRepository::new(conn.clone()),
            entry_repo: PlanEntryRepository::new(conn.clone()),
            approval_repo: ApprovalRecordRepository::new(conn.clone()),
            advisor_repo: AdvisorAssignmentRepository::new(conn.clone()),
            transcript_repo: TranscriptRepository::new(conn.clone()),
            course_repo: CourseRepository::new(conn.clone()),
            dependency_repo: CourseDependencyRepository::new(conn),
        })
    }

    // ==========================================
    // 草稿入口
    // ==========================================

    /// 取学生默认草稿, 不存在则创建并播种学期
    pub fn get_or_create_default_draft(&self, student_id: &str) -> ApiResult<PlanDraft> {
        Ok(self.draft_manager.ensure_default_draft(student_id, &self.config)?)
    }

    /// 创建命名草稿
    pub fn create_draft(&self, student_id: &str, draft_name: &str) -> ApiResult<PlanDraft> {
        Ok(self
            .draft_manager
            .create_named_draft(student_id, draft_name, &self.config)?)
    }

    /// 重命名草稿 (默认草稿受保护)
    pub fn rename_draft(&self, draft_id: &str, new_name: &str) -> ApiResult<()> {
        Ok(self.draft_manager.rename_draft(draft_id, new_name)?)
    }

    /// 删除草稿 (默认草稿受保护)
    pub fn delete_draft(&self, draft_id: &str) -> ApiResult<()> {
        Ok(self.draft_manager.delete_draft(draft_id)?)
    }

    /// 列出学生全部草稿 (默认草稿在前)
    pub fn list_drafts(&self, student_id: &str) -> ApiResult<Vec<PlanDraft>> {
        Ok(self.draft_repo.list_by_student(student_id)?)
    }

    // ==========================================
    // 学期查询
    // ==========================================

    /// 草稿的学期视图 (含条目与学分合计)
    ///
    /// 学期状态取条目状态的一致值; 空学期视为 DRAFT;
    /// 条目状态不一致时置 has_mixed_status (移动不改状态, 允许混合)
    pub fn get_semester_views(&self, draft_id: &str) -> ApiResult<Vec<SemesterView>> {
        self.require_draft(draft_id)?;

        let semesters = self.semester_repo.list_by_draft(draft_id)?;
        let courses = self.course_credit_map()?;

        let mut views = Vec::with_capacity(semesters.len());
        for semester in semesters {
            let entries = self
                .entry_repo
                .list_by_semester(draft_id, semester.semester_no)?;
            let total_credits = entries
                .iter()
                .filter_map(|e| courses.get(&e.course_id))
                .sum();
            let status = entries
                .first()
                .map(|e| e.status)
                .unwrap_or(PlanEntryStatus::Draft);
            let has_mixed_status = entries.iter().any(|e| e.status != status);

            views.push(SemesterView {
                semester_no: semester.semester_no,
                term: semester.term,
                year: semester.year,
                is_locked: semester.is_locked,
                status,
                has_mixed_status,
                total_credits,
                entries,
            });
        }

        Ok(views)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn require_draft(&self, draft_id: &str) -> ApiResult<PlanDraft> {
        self.draft_repo
            .find_by_id(draft_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "PlanDraft".to_string(),
                id: draft_id.to_string(),
            })
    }

    fn require_semester(&self, draft_id: &str, semester_no: i64) -> ApiResult<PlanSemester> {
        self.semester_repo
            .find(draft_id, semester_no)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "PlanSemester".to_string(),
                id: format!("{}#{}", draft_id, semester_no),
            })
    }

    /// course_id → credits, 学分合计与负荷检查的数据源
    fn course_credit_map(&self) -> ApiResult<std::collections::HashMap<String, f64>> {
        Ok(self
            .course_repo
            .list_all()?
            .into_iter()
            .map(|c| (c.course_id, c.credits))
            .collect())
    }

    /// 放置判定上下文: 依赖图 + 修读历史 (成绩单 + 草稿条目)
    ///
    /// `exclude_course` 用于移动场景, 把该课程从历史中剔除后再判定
    fn placement_context(
        &self,
        student_id: &str,
        draft_id: &str,
        exclude_course: Option<&str>,
    ) -> ApiResult<(PrerequisiteGraph, StudentHistory)> {
        let transcript = self.transcript_repo.list_by_student(student_id)?;
        let mut entries = self.entry_repo.list_by_draft(draft_id)?;
        if let Some(course_id) = exclude_course {
            entries.retain(|e| e.course_id != course_id);
        }

        let graph = PrerequisiteGraph::from_edges(self.dependency_repo.list_all()?);
        let history = StudentHistory::from_parts(&transcript, &entries);

        Ok((graph, history))
    }
}
