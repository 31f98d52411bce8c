// ==========================================
// 修业计划审核系统 - 学位审核引擎
// ==========================================
// 职责: 汇总成绩单 + 默认草稿, 对主修/辅修/方向逐一评估满足度,
//       计算 GPA 与学分汇总, 产出审核总报告
// 红线: 主修缺失是硬错误; 辅修禁配/方向缺失只产生告警, 不阻断审核
// ==========================================

use crate::config::ConfigManager;
use crate::domain::audit::{AuditReport, AuditWarning, RequirementReport};
use crate::domain::course::Course;
use crate::domain::plan::PlanEntry;
use crate::domain::student::{ProgramAssignment, TranscriptEntry};
use crate::domain::types::{ProgramType, TranscriptStatus};
use crate::engine::requirement::{evaluate_program, RequirementTreeError, StudentRecordView};
use crate::repository::{
    CourseRepository, MinorCompatibilityRepository, PlanDraftRepository, PlanEntryRepository,
    ProgramAssignmentRepository, ProgramRepository, RequirementGroupRepository,
    RepositoryError, RepositoryResult, StudentRepository, TranscriptRepository,
};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

// ==========================================
// 告警类型常量
// ==========================================
pub const WARN_MINOR_FORBIDDEN: &str = "MINOR_FORBIDDEN";
pub const WARN_MISSING_CONCENTRATION: &str = "MISSING_CONCENTRATION";

// ==========================================
// DegreeAuditEngine
// ==========================================
pub struct DegreeAuditEngine {
    student_repo: StudentRepository,
    assignment_repo: ProgramAssignmentRepository,
    transcript_repo: TranscriptRepository,
    program_repo: ProgramRepository,
    group_repo: RequirementGroupRepository,
    compat_repo: MinorCompatibilityRepository,
    course_repo: CourseRepository,
    draft_repo: PlanDraftRepository,
    entry_repo: PlanEntryRepository,
}

impl DegreeAuditEngine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            student_repo: StudentRepository::new(conn.clone()),
            assignment_repo: ProgramAssignmentRepository::new(conn.clone()),
            transcript_repo: TranscriptRepository::new(conn.clone()),
            program_repo: ProgramRepository::new(conn.clone()),
            group_repo: RequirementGroupRepository::new(conn.clone()),
            compat_repo: MinorCompatibilityRepository::new(conn.clone()),
            course_repo: CourseRepository::new(conn.clone()),
            draft_repo: PlanDraftRepository::new(conn.clone()),
            entry_repo: PlanEntryRepository::new(conn),
        }
    }

    /// 执行学位审核
    ///
    /// # 参数
    /// - `student_id`: 学生ID
    /// - `config`: 读取 count_projected 开关
    ///
    /// # 返回
    /// 审核总报告; 学生缺失主修方案时返回 ValidationError
    pub fn run_audit(
        &self,
        student_id: &str,
        config: &ConfigManager,
    ) -> RepositoryResult<AuditReport> {
        let student = self
            .student_repo
            .find_by_id(student_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "学生".to_string(),
                id: student_id.to_string(),
            })?;

        let assignments = self.assignment_repo.list_by_student(student_id)?;
        let transcript = self.transcript_repo.list_by_student(student_id)?;

        // 默认草稿的条目参与"预计"口径与计划学分汇总
        let plan_entries = match self.draft_repo.find_default(student_id)? {
            Some(draft) => self.entry_repo.list_by_draft(&draft.draft_id)?,
            None => Vec::new(),
        };

        let count_projected = config
            .get_count_projected()
            .map_err(|e| RepositoryError::InternalError(format!("读取配置失败: {}", e)))?;

        // === 审核槽位: 唯一主修 + 至多一个辅修/方向 (按指派顺序取首个) ===
        let primary_major = assignments
            .iter()
            .find(|a| a.assignment_type == ProgramType::Major && a.is_primary);
        let primary_major = match primary_major {
            Some(a) => a,
            None => {
                return Err(RepositoryError::ValidationError(format!(
                    "学生 {} 没有主修方案, 无法审核",
                    student_id
                )));
            }
        };
        let minor = assignments
            .iter()
            .find(|a| a.assignment_type == ProgramType::Minor);
        let concentration = assignments
            .iter()
            .find(|a| a.assignment_type == ProgramType::Concentration);

        info!(
            "开始学位审核: student={} major={} minor={:?} concentration={:?}",
            student_id,
            primary_major.program_id,
            minor.map(|a| a.program_id.as_str()),
            concentration.map(|a| a.program_id.as_str()),
        );

        let courses = self.load_course_map()?;
        let view = StudentRecordView::from_parts(&transcript, &plan_entries, count_projected);

        let mut per_program = Vec::new();
        let mut warnings = Vec::new();

        for assignment in [Some(primary_major), minor, concentration].into_iter().flatten() {
            per_program.push(self.evaluate_assignment(assignment, &courses, &view)?);
        }

        // === 审核告警: 辅修禁配 / 方向缺失 ===
        if let Some(minor) = minor {
            self.check_minor_compatibility(&primary_major.program_id, &minor.program_id, &mut warnings)?;
        }
        self.check_concentration_policy(&primary_major.program_id, concentration, &mut warnings)?;

        // === GPA 与学分汇总 ===
        let gpa = compute_gpa(&transcript);
        let (completed_credits, in_progress_credits) = summarize_transcript(&transcript);
        let planned_credits = summarize_plan(&transcript, &plan_entries, &courses);

        debug!(
            "审核完成: student={} gpa={:?} completed={} in_progress={} planned={}",
            student.student_id, gpa, completed_credits, in_progress_credits, planned_credits
        );

        Ok(AuditReport {
            student_id: student.student_id,
            per_program,
            gpa,
            completed_credits,
            in_progress_credits,
            planned_credits,
            warnings,
        })
    }

    /// 评估单个方案指派的满足度
    fn evaluate_assignment(
        &self,
        assignment: &ProgramAssignment,
        courses: &HashMap<String, Course>,
        view: &StudentRecordView,
    ) -> RepositoryResult<RequirementReport> {
        let program = self
            .program_repo
            .find_by_id(&assignment.program_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "培养方案".to_string(),
                id: assignment.program_id.clone(),
            })?;

        let groups = self.group_repo.list_by_program(&program.program_id)?;
        let memberships = self.group_repo.list_courses_by_program(&program.program_id)?;

        evaluate_program(&program, groups, &memberships, courses, view).map_err(|e| match e {
            RequirementTreeError::MissingParent { .. } | RequirementTreeError::CycleDetected(_) => {
                RepositoryError::ValidationError(format!(
                    "方案 {} 的课程组树不合法: {}",
                    program.program_id, e
                ))
            }
        })
    }

    /// 辅修兼容规则: FORBIDDEN 产生告警, 未配置视为允许
    fn check_minor_compatibility(
        &self,
        major_program_id: &str,
        minor_program_id: &str,
        warnings: &mut Vec<AuditWarning>,
    ) -> RepositoryResult<()> {
        use crate::domain::types::CompatibilityRule;

        if let Some(CompatibilityRule::Forbidden) =
            self.compat_repo.find(major_program_id, minor_program_id)?
        {
            warn!(
                "辅修禁配组合: major={} minor={}",
                major_program_id, minor_program_id
            );
            warnings.push(AuditWarning::new(
                WARN_MINOR_FORBIDDEN,
                format!(
                    "主修 {} 与辅修 {} 为禁止组合",
                    major_program_id, minor_program_id
                ),
            ));
        }
        Ok(())
    }

    /// 主修要求选方向但学生未指派时产生告警
    fn check_concentration_policy(
        &self,
        major_program_id: &str,
        concentration: Option<&ProgramAssignment>,
        warnings: &mut Vec<AuditWarning>,
    ) -> RepositoryResult<()> {
        use crate::domain::types::ConcentrationPolicy;

        let major = self
            .program_repo
            .find_by_id(major_program_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "培养方案".to_string(),
                id: major_program_id.to_string(),
            })?;

        if major.concentration_policy == ConcentrationPolicy::Required && concentration.is_none() {
            warnings.push(AuditWarning::new(
                WARN_MISSING_CONCENTRATION,
                format!("主修 {} 要求选择专业方向, 但学生尚未指派", major_program_id),
            ));
        }
        Ok(())
    }

    fn load_course_map(&self) -> RepositoryResult<HashMap<String, Course>> {
        Ok(self
            .course_repo
            .list_all()?
            .into_iter()
            .map(|c| (c.course_id.clone(), c))
            .collect())
    }
}

// ==========================================
// GPA 计算
// ==========================================

/// 字母等第换算绩点; 非等第标记 (如 P/NP) 返回 None
fn grade_points(grade: &str) -> Option<f64> {
    match grade.trim().to_uppercase().as_str() {
        "A" | "A+" => Some(4.0),
        "A-" => Some(3.7),
        "B+" => Some(3.3),
        "B" => Some(3.0),
        "B-" => Some(2.7),
        "C+" => Some(2.3),
        "C" => Some(2.0),
        "C-" => Some(1.7),
        "D+" => Some(1.3),
        "D" => Some(1.0),
        "F" => Some(0.0),
        _ => None,
    }
}

/// 学分加权 GPA, 两位小数
///
/// 转学分 (TRANSFER) 与无等第条目不计入; 无任何等第学分返回 None
pub(crate) fn compute_gpa(transcript: &[TranscriptEntry]) -> Option<f64> {
    let mut quality_points = 0.0_f64;
    let mut graded_credits = 0.0_f64;

    for entry in transcript {
        if entry.status != TranscriptStatus::Completed {
            continue;
        }
        let points = match entry.grade.as_deref().and_then(grade_points) {
            Some(p) => p,
            None => continue,
        };
        quality_points += points * entry.credits_earned;
        graded_credits += entry.credits_earned;
    }

    if graded_credits <= 0.0 {
        return None;
    }
    Some((quality_points / graded_credits * 100.0).round() / 100.0)
}

/// 返回 (已完成学分, 修读中学分); 已完成含转学分
fn summarize_transcript(transcript: &[TranscriptEntry]) -> (f64, f64) {
    let mut completed = 0.0_f64;
    let mut in_progress = 0.0_f64;
    for entry in transcript {
        match entry.status {
            TranscriptStatus::Completed | TranscriptStatus::Transfer => {
                completed += entry.credits_earned
            }
            TranscriptStatus::InProgress => in_progress += entry.credits_earned,
        }
    }
    (completed, in_progress)
}

/// 计划学分: 默认草稿中未出现在成绩单的课程, 按目录学分累计
///
/// 驳回条目不计入
fn summarize_plan(
    transcript: &[TranscriptEntry],
    plan_entries: &[PlanEntry],
    courses: &HashMap<String, Course>,
) -> f64 {
    use crate::domain::types::PlanEntryStatus;
    use std::collections::HashSet;

    let taken: HashSet<&str> = transcript.iter().map(|e| e.course_id.as_str()).collect();

    plan_entries
        .iter()
        .filter(|e| e.status != PlanEntryStatus::Rejected)
        .filter(|e| !taken.contains(e.course_id.as_str()))
        .filter_map(|e| courses.get(&e.course_id))
        .map(|c| c.credits)
        .sum()
}
