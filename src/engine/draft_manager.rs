// ==========================================
// 修业计划审核系统 - 草稿管理器
// ==========================================
// 职责: 默认草稿懒创建与学期播种, 命名草稿的增删改名,
//       学期的追加/删除守卫
// 红线: 每个学生任一时刻恰有一个默认草稿; 默认草稿不可删除/改名
// 红线: 锁定标记在播种时一次性计算, 此后编辑不得触碰已锁学期
// ==========================================

use crate::config::ConfigManager;
use crate::domain::plan::{PlanDraft, PlanSemester};
use crate::domain::student::Student;
use crate::domain::types::{PlanEntryStatus, Term};
use crate::repository::{
    PlanDraftRepository, PlanEntryRepository, PlanSemesterRepository, RepositoryError,
    RepositoryResult, StudentRepository, TranscriptRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// 草稿名最大长度
pub const MAX_DRAFT_NAME_LEN: usize = 100;
/// 默认草稿的保留名
pub const DEFAULT_DRAFT_NAME: &str = "默认计划";

// ==========================================
// DraftManager
// ==========================================
pub struct DraftManager {
    student_repo: StudentRepository,
    transcript_repo: TranscriptRepository,
    draft_repo: PlanDraftRepository,
    semester_repo: PlanSemesterRepository,
    entry_repo: PlanEntryRepository,
}

impl DraftManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            student_repo: StudentRepository::new(conn.clone()),
            transcript_repo: TranscriptRepository::new(conn.clone()),
            draft_repo: PlanDraftRepository::new(conn.clone()),
            semester_repo: PlanSemesterRepository::new(conn.clone()),
            entry_repo: PlanEntryRepository::new(conn),
        }
    }

    // ==========================================
    // 默认草稿
    // ==========================================

    /// 取默认草稿, 不存在则懒创建并播种学期
    ///
    /// 学期序列: 入学年秋季起 Fall/Spring 交替, 共配置的默认学期数;
    /// 前 N 个学期锁定, N = 成绩单中不同 (year, term) 的个数
    pub fn ensure_default_draft(
        &self,
        student_id: &str,
        config: &ConfigManager,
    ) -> RepositoryResult<PlanDraft> {
        if let Some(existing) = self.draft_repo.find_default(student_id)? {
            return Ok(existing);
        }

        let student = self.require_student(student_id)?;

        let semester_count = config
            .get_default_semester_count()
            .map_err(|e| RepositoryError::InternalError(format!("读取配置失败: {}", e)))?;
        let locked_count = self.transcript_repo.count_distinct_semesters(student_id)?;

        let draft = PlanDraft::new(student_id, DEFAULT_DRAFT_NAME, true);
        let semesters = seed_semesters(&draft.draft_id, &student, semester_count, locked_count);

        // 草稿与学期序列单事务落库
        self.draft_repo.insert_seeded(&draft, &semesters)?;

        info!(
            "创建默认草稿: student={} draft={} semesters={} locked={}",
            student_id,
            draft.draft_id,
            semesters.len(),
            locked_count.min(semester_count)
        );

        Ok(draft)
    }

    // ==========================================
    // 命名草稿
    // ==========================================

    /// 创建命名草稿 (空学期序列, 与默认草稿同规则播种)
    pub fn create_named_draft(
        &self,
        student_id: &str,
        draft_name: &str,
        config: &ConfigManager,
    ) -> RepositoryResult<PlanDraft> {
        validate_draft_name(draft_name)?;

        let student = self.require_student(student_id)?;

        if self.draft_repo.find_by_name(student_id, draft_name)?.is_some() {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "学生 {} 已有同名草稿: {}",
                student_id, draft_name
            )));
        }

        let semester_count = config
            .get_default_semester_count()
            .map_err(|e| RepositoryError::InternalError(format!("读取配置失败: {}", e)))?;
        let locked_count = self.transcript_repo.count_distinct_semesters(student_id)?;

        let draft = PlanDraft::new(student_id, draft_name, false);
        let semesters = seed_semesters(&draft.draft_id, &student, semester_count, locked_count);

        self.draft_repo.insert_seeded(&draft, &semesters)?;

        debug!("创建命名草稿: student={} name={}", student_id, draft_name);
        Ok(draft)
    }

    /// 重命名草稿; 默认草稿受保护
    pub fn rename_draft(&self, draft_id: &str, new_name: &str) -> RepositoryResult<()> {
        validate_draft_name(new_name)?;

        let draft = self.require_draft(draft_id)?;
        if draft.is_default {
            return Err(RepositoryError::BusinessRuleViolation(
                "默认草稿不允许重命名".to_string(),
            ));
        }
        if self
            .draft_repo
            .find_by_name(&draft.student_id, new_name)?
            .is_some()
        {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "学生 {} 已有同名草稿: {}",
                draft.student_id, new_name
            )));
        }

        self.draft_repo.rename(draft_id, new_name)
    }

    /// 删除草稿及其全部学期/条目/审批记录; 默认草稿受保护
    pub fn delete_draft(&self, draft_id: &str) -> RepositoryResult<()> {
        let draft = self.require_draft(draft_id)?;
        if draft.is_default {
            return Err(RepositoryError::BusinessRuleViolation(
                "默认草稿不允许删除".to_string(),
            ));
        }

        info!("删除草稿: draft={} student={}", draft_id, draft.student_id);
        self.draft_repo.delete(draft_id)
    }

    // ==========================================
    // 学期追加/删除
    // ==========================================

    /// 在草稿末尾追加一个学期
    ///
    /// # 参数
    /// - `summer`: true 时插入紧随其后的夏季学期, 否则常规推进
    pub fn add_semester(&self, draft_id: &str, summer: bool) -> RepositoryResult<PlanSemester> {
        self.require_draft(draft_id)?;

        let last = self
            .semester_repo
            .list_by_draft(draft_id)?
            .into_iter()
            .last()
            .ok_or_else(|| RepositoryError::StateConflict {
                message: format!("草稿 {} 没有任何学期", draft_id),
            })?;

        let (term, year) = if summer {
            last.term.next_summer(last.year)
        } else {
            last.term.next_regular(last.year)
        };

        let semester = PlanSemester {
            draft_id: draft_id.to_string(),
            semester_no: last.semester_no + 1,
            term,
            year,
            is_locked: false,
        };
        self.semester_repo.insert(&semester)?;

        debug!(
            "追加学期: draft={} no={} {} {}",
            draft_id, semester.semester_no, semester.term, semester.year
        );
        Ok(semester)
    }

    /// 删除草稿的最后一个学期
    ///
    /// 守卫: 只能删末尾学期; 已锁学期不可删; 学期内条目必须全为 DRAFT
    pub fn remove_semester(&self, draft_id: &str, semester_no: i64) -> RepositoryResult<()> {
        self.require_draft(draft_id)?;

        let max_no = self
            .semester_repo
            .max_semester_no(draft_id)?
            .ok_or_else(|| RepositoryError::StateConflict {
                message: format!("草稿 {} 没有任何学期", draft_id),
            })?;
        if semester_no != max_no {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "只能删除末尾学期 (当前末尾为 {})",
                max_no
            )));
        }

        let semester = self
            .semester_repo
            .find(draft_id, semester_no)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "PlanSemester".to_string(),
                id: format!("{}#{}", draft_id, semester_no),
            })?;
        if semester.is_locked {
            return Err(RepositoryError::StateConflict {
                message: format!("学期 {} 已锁定, 不允许删除", semester_no),
            });
        }

        let entries = self.entry_repo.list_by_semester(draft_id, semester_no)?;
        if entries.iter().any(|e| e.status != PlanEntryStatus::Draft) {
            return Err(RepositoryError::StateConflict {
                message: format!("学期 {} 存在非草稿状态的条目, 不允许删除", semester_no),
            });
        }

        self.semester_repo.delete_with_entries(draft_id, semester_no)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn require_student(&self, student_id: &str) -> RepositoryResult<Student> {
        self.student_repo
            .find_by_id(student_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "学生".to_string(),
                id: student_id.to_string(),
            })
    }

    fn require_draft(&self, draft_id: &str) -> RepositoryResult<PlanDraft> {
        self.draft_repo
            .find_by_id(draft_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "PlanDraft".to_string(),
                id: draft_id.to_string(),
            })
    }
}

/// 草稿名校验: 非空且不超过最大长度 (按字符计)
fn validate_draft_name(name: &str) -> RepositoryResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::FieldValueError {
            field: "draft_name".to_string(),
            message: "草稿名不能为空".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_DRAFT_NAME_LEN {
        return Err(RepositoryError::FieldValueError {
            field: "draft_name".to_string(),
            message: format!("草稿名不能超过 {} 个字符", MAX_DRAFT_NAME_LEN),
        });
    }
    Ok(())
}

/// 播种学期序列: 入学年秋季起 Fall/Spring 交替, 前 locked_count 个锁定
fn seed_semesters(
    draft_id: &str,
    student: &Student,
    semester_count: i64,
    locked_count: i64,
) -> Vec<PlanSemester> {
    let mut semesters = Vec::with_capacity(semester_count.max(0) as usize);
    let mut term = Term::Fall;
    let mut year = student.enrollment_year;

    for no in 1..=semester_count.max(0) {
        semesters.push(PlanSemester {
            draft_id: draft_id.to_string(),
            semester_no: no,
            term,
            year,
            is_locked: no <= locked_count,
        });
        let next = term.next_regular(year);
        term = next.0;
        year = next.1;
    }

    semesters
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn student(year: i32) -> Student {
        Student {
            student_id: "S1".to_string(),
            student_name: "张三".to_string(),
            enrollment_year: year,
        }
    }

    #[test]
    fn test_seed_alternates_fall_spring() {
        let semesters = seed_semesters("d1", &student(2024), 8, 0);
        assert_eq!(semesters.len(), 8);
        assert_eq!((semesters[0].term, semesters[0].year), (Term::Fall, 2024));
        assert_eq!((semesters[1].term, semesters[1].year), (Term::Spring, 2025));
        assert_eq!((semesters[2].term, semesters[2].year), (Term::Fall, 2025));
        assert_eq!((semesters[7].term, semesters[7].year), (Term::Spring, 2028));
        assert!(semesters.iter().all(|s| !s.is_locked));
    }

    #[test]
    fn test_seed_locks_prefix() {
        let semesters = seed_semesters("d1", &student(2023), 8, 3);
        assert!(semesters[0].is_locked);
        assert!(semesters[1].is_locked);
        assert!(semesters[2].is_locked);
        assert!(!semesters[3].is_locked);
    }

    #[test]
    fn test_seed_lock_count_capped_by_length() {
        // 修读学期数超过模板长度时全部锁定, 不越界
        let semesters = seed_semesters("d1", &student(2020), 4, 10);
        assert_eq!(semesters.len(), 4);
        assert!(semesters.iter().all(|s| s.is_locked));
    }

    #[test]
    fn test_draft_name_validation() {
        assert!(validate_draft_name("秋季备选").is_ok());
        assert!(validate_draft_name("  ").is_err());
        let long: String = std::iter::repeat('甲').take(101).collect();
        assert!(validate_draft_name(&long).is_err());
        let exact: String = std::iter::repeat('甲').take(100).collect();
        assert!(validate_draft_name(&exact).is_ok());
    }
}
