// ==========================================
// 修业计划审核系统 - 编目 API
// ==========================================
// 职责: 课程目录 / 依赖边 / 培养方案结构 / 学生注册的管理入口
// 红线: 先修图与课程组树的成环校验发生在写入之前
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::course::{Course, CourseDependency};
use crate::domain::program::{GroupCourse, MinorCompatibilityRule, Program, RequirementGroup};
use crate::domain::student::{ProgramAssignment, Student, TranscriptEntry};
use crate::domain::types::{ClassStanding, DependencyKind, ProgramType};
use crate::engine::prereq_graph::PrerequisiteGraph;
use crate::engine::requirement::RequirementTree;
use crate::repository::{
    AdvisorAssignmentRepository, CourseDependencyRepository, CourseRepository,
    MinorCompatibilityRepository, ProgramAssignmentRepository, ProgramRepository,
    RequirementGroupRepository, StudentRepository, TranscriptRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct CatalogApi {
    course_repo: CourseRepository,
    dependency_repo: CourseDependencyRepository,
    program_repo: ProgramRepository,
    group_repo: RequirementGroupRepository,
    compat_repo: MinorCompatibilityRepository,
    student_repo: StudentRepository,
    assignment_repo: ProgramAssignmentRepository,
    advisor_repo: AdvisorAssignmentRepository,
    transcript_repo: TranscriptRepository,
}

impl CatalogApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            course_repo: CourseRepository::new(conn.clone()),
            dependency_repo: CourseDependencyRepository::new(conn.clone()),
            program_repo: ProgramRepository::new(conn.clone()),
            group_repo: RequirementGroupRepository::new(conn.clone()),
            compat_repo: MinorCompatibilityRepository::new(conn.clone()),
            student_repo: StudentRepository::new(conn.clone()),
            assignment_repo: ProgramAssignmentRepository::new(conn.clone()),
            advisor_repo: AdvisorAssignmentRepository::new(conn.clone()),
            transcript_repo: TranscriptRepository::new(conn),
        }
    }

    // ==========================================
    // 课程与依赖
    // ==========================================

    /// 新增课程
    pub fn create_course(&self, course: &Course) -> ApiResult<()> {
        if course.course_code.trim().is_empty() {
            return Err(ApiError::ValidationError("课程代码不能为空".to_string()));
        }
        if course.credits < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "课程学分不能为负: {}",
                course.credits
            )));
        }
        self.course_repo.insert(course)?;
        debug!("新增课程: {} ({})", course.course_code, course.course_id);
        Ok(())
    }

    /// 新增课程依赖边 (先修边写前成环校验)
    pub fn add_dependency(&self, dep: &CourseDependency) -> ApiResult<()> {
        self.require_course(&dep.course_id)?;

        match dep.kind {
            DependencyKind::Prerequisite | DependencyKind::Corequisite => {
                let dep_course = dep.dependency_course_id.as_deref().ok_or_else(|| {
                    ApiError::ValidationError(format!("{} 依赖缺少目标课程", dep.kind))
                })?;
                self.require_course(dep_course)?;

                if dep.kind == DependencyKind::Prerequisite {
                    let graph =
                        PrerequisiteGraph::from_edges(self.dependency_repo.list_all()?);
                    if graph.would_create_cycle(&dep.course_id, dep_course) {
                        return Err(ApiError::ConsistencyError(format!(
                            "先修边 {} → {} 会使依赖图成环",
                            dep.course_id, dep_course
                        )));
                    }
                }
            }
            DependencyKind::Status => {
                let required = dep.required_status.as_deref().unwrap_or("");
                if ClassStanding::from_str(required).is_none() {
                    return Err(ApiError::ValidationError(format!(
                        "无效的年级要求: {}",
                        required
                    )));
                }
            }
        }

        self.dependency_repo.insert(dep)?;
        debug!(
            "新增依赖边: {} → {:?} kind={}",
            dep.course_id, dep.dependency_course_id, dep.kind
        );
        Ok(())
    }

    // ==========================================
    // 培养方案与课程组
    // ==========================================

    /// 新增培养方案; 专业方向必须挂靠已存在的主修方案
    pub fn create_program(&self, program: &Program) -> ApiResult<()> {
        if program.program_type == ProgramType::Concentration {
            let parent_id = program.parent_program_id.as_deref().ok_or_else(|| {
                ApiError::ValidationError("专业方向必须指定所属主修方案".to_string())
            })?;
            let parent = self
                .program_repo
                .find_by_id(parent_id)?
                .ok_or_else(|| ApiError::NotFound {
                    entity: "培养方案".to_string(),
                    id: parent_id.to_string(),
                })?;
            if parent.program_type != ProgramType::Major {
                return Err(ApiError::ValidationError(format!(
                    "专业方向只能挂靠主修方案, {} 是 {}",
                    parent_id, parent.program_type
                )));
            }
        }

        self.program_repo.insert(program)?;
        info!(
            "新增培养方案: {} type={} total={}",
            program.program_id, program.program_type, program.total_credits_required
        );
        Ok(())
    }

    /// 删除培养方案; 仍有学生指派时拒绝
    pub fn delete_program(&self, program_id: &str) -> ApiResult<()> {
        let assigned = self.program_repo.count_assigned_students(program_id)?;
        if assigned > 0 {
            return Err(ApiError::ConflictError(format!(
                "方案 {} 仍有 {} 名学生指派, 不允许删除",
                program_id, assigned
            )));
        }
        self.program_repo.delete(program_id)?;
        info!("删除培养方案: {}", program_id);
        Ok(())
    }

    /// 新增课程组; 父组须存在且属于同一方案
    pub fn create_group(&self, group: &RequirementGroup) -> ApiResult<()> {
        self.require_program(&group.program_id)?;

        if let Some(parent_id) = &group.parent_group_id {
            let parent = self.require_group(parent_id)?;
            if parent.program_id != group.program_id {
                return Err(ApiError::ValidationError(format!(
                    "父组 {} 属于另一方案, 不允许跨方案嵌套",
                    parent_id
                )));
            }
        }

        self.group_repo.insert(group)?;
        debug!("新增课程组: {} program={}", group.group_id, group.program_id);
        Ok(())
    }

    /// 调整课程组的父指针 (写前成环校验)
    pub fn reparent_group(
        &self,
        group_id: &str,
        new_parent_id: Option<&str>,
    ) -> ApiResult<()> {
        let group = self.require_group(group_id)?;

        if let Some(parent_id) = new_parent_id {
            let parent = self.require_group(parent_id)?;
            if parent.program_id != group.program_id {
                return Err(ApiError::ValidationError(format!(
                    "父组 {} 属于另一方案, 不允许跨方案嵌套",
                    parent_id
                )));
            }

            let groups = self.group_repo.list_by_program(&group.program_id)?;
            if !RequirementTree::validate_reparent(&groups, group_id, parent_id) {
                return Err(ApiError::ConsistencyError(format!(
                    "把组 {} 挂到 {} 下会使课程组树成环",
                    group_id, parent_id
                )));
            }
        }

        self.group_repo.update_parent(group_id, new_parent_id)?;
        debug!("调整课程组父指针: {} → {:?}", group_id, new_parent_id);
        Ok(())
    }

    /// 删除课程组; 仍有子组时拒绝 (成员关系随组删除)
    pub fn delete_group(&self, group_id: &str) -> ApiResult<()> {
        self.require_group(group_id)?;
        if self.group_repo.has_children(group_id)? {
            return Err(ApiError::ConflictError(format!(
                "组 {} 仍有子组, 不允许删除",
                group_id
            )));
        }
        self.group_repo.delete(group_id)?;
        debug!("删除课程组: {}", group_id);
        Ok(())
    }

    /// 把课程加入课程组
    pub fn add_course_to_group(&self, membership: &GroupCourse) -> ApiResult<()> {
        self.require_group(&membership.group_id)?;
        self.require_course(&membership.course_id)?;
        self.group_repo.add_course(membership)?;
        Ok(())
    }

    /// 配置 (主修, 辅修) 兼容规则
    pub fn set_minor_compatibility(&self, rule: &MinorCompatibilityRule) -> ApiResult<()> {
        self.require_program(&rule.major_program_id)?;
        self.require_program(&rule.minor_program_id)?;
        self.compat_repo.upsert(rule)?;
        Ok(())
    }

    // ==========================================
    // 学生注册侧
    // ==========================================

    /// 注册学生
    pub fn register_student(&self, student: &Student) -> ApiResult<()> {
        self.student_repo.insert(student)?;
        info!("注册学生: {} ({})", student.student_name, student.student_id);
        Ok(())
    }

    /// 指派培养方案; 主修 primary 每生唯一
    pub fn assign_program(&self, assignment: &ProgramAssignment) -> ApiResult<()> {
        self.require_program(&assignment.program_id)?;

        if assignment.is_primary {
            if assignment.assignment_type != ProgramType::Major {
                return Err(ApiError::ValidationError(
                    "只有主修方案可以标记为 primary".to_string(),
                ));
            }
            let existing = self.assignment_repo.list_by_student(&assignment.student_id)?;
            if existing
                .iter()
                .any(|a| a.assignment_type == ProgramType::Major && a.is_primary)
            {
                return Err(ApiError::ConflictError(format!(
                    "学生 {} 已有 primary 主修方案",
                    assignment.student_id
                )));
            }
        }

        self.assignment_repo.insert(assignment)?;
        debug!(
            "指派方案: student={} program={} type={}",
            assignment.student_id, assignment.program_id, assignment.assignment_type
        );
        Ok(())
    }

    /// 指派导师 (幂等)
    pub fn assign_advisor(&self, advisor_id: &str, student_id: &str) -> ApiResult<()> {
        self.advisor_repo.assign(advisor_id, student_id)?;
        Ok(())
    }

    /// 录入成绩单条目
    pub fn add_transcript_entry(&self, entry: &TranscriptEntry) -> ApiResult<()> {
        self.require_course(&entry.course_id)?;
        self.transcript_repo.insert(entry)?;
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn require_course(&self, course_id: &str) -> ApiResult<Course> {
        self.course_repo
            .find_by_id(course_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "课程".to_string(),
                id: course_id.to_string(),
            })
    }

    fn require_program(&self, program_id: &str) -> ApiResult<Program> {
        self.program_repo
            .find_by_id(program_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "培养方案".to_string(),
                id: program_id.to_string(),
            })
    }

    fn require_group(&self, group_id: &str) -> ApiResult<RequirementGroup> {
        self.group_repo
            .find_by_id(group_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "课程组".to_string(),
                id: group_id.to_string(),
            })
    }
}
