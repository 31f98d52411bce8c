// ==========================================
// 修业计划审核系统 - 课程依赖图引擎
// ==========================================
// 职责: 回答"课程 C 能否放入学期 S" + 编目时先修边成环校验
// 红线: 不直接写库, 只计算和返回判定结果
// ==========================================
// 判定口径:
// - PREREQUISITE: 依赖课须 COMPLETED/TRANSFER 于更早学期, 或计划
//   (APPROVED/SUBMITTED/DRAFT) 在更早学期 (计划课程按期完成假设);
//   宽松模式给软告警, 严格模式 (提交时) 升级为硬阻断
// - COREQUISITE: 依赖课须在同学期或更早学期出现
// - STATUS: 年级门槛, 由调用方提供判定器, 恒为硬前置条件
// ==========================================

use crate::domain::course::CourseDependency;
use crate::domain::student::TranscriptEntry;
use crate::domain::plan::PlanEntry;
use crate::domain::types::{ClassStanding, DependencyKind, Term, TranscriptStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// 违规严重度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Soft, // 告警, 不阻断
    Hard, // 阻断
}

// ==========================================
// PlacementViolation - 放置违规
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementViolation {
    pub course_id: String,
    pub dependency_course_id: Option<String>,
    pub kind: DependencyKind,
    pub severity: ViolationSeverity,
    pub message: String,
}

// ==========================================
// PlacementCheck - 放置判定结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementCheck {
    /// 无硬违规即为 true; 软违规只进 violations 列表
    pub ok: bool,
    pub violations: Vec<PlacementViolation>,
}

// ==========================================
// 修读记录视图 (StudentHistory)
// ==========================================

/// 单门课程的修读来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Completed,  // 成绩单 COMPLETED
    Transfer,   // 成绩单 TRANSFER
    InProgress, // 成绩单 IN_PROGRESS (不满足先修口径)
    Planned,    // 计划条目 (APPROVED/SUBMITTED/DRAFT 均按期完成假设)
}

#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub course_id: String,
    /// 学期序号: 成绩单学期按 (year, term) 升序映射到 1..N; 计划条目取 semester_no
    pub semester_no: i64,
    pub kind: HistoryKind,
}

/// 学生修读历史 (成绩单 + 当前草稿计划), 先修/同修判定的数据源
#[derive(Debug, Clone, Default)]
pub struct StudentHistory {
    records: HashMap<String, HistoryRecord>,
    completed_credits: f64,
}

/// 学期在学年内的排序 (春 < 夏 < 秋): 秋季开启学年, 次年春/夏在其后
fn term_sort_key(year: i32, term: Term) -> (i32, u8) {
    match term {
        Term::Spring => (year, 0),
        Term::Summer => (year, 1),
        Term::Fall => (year, 2),
    }
}

impl StudentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由成绩单与草稿条目构建修读历史
    ///
    /// 成绩单 distinct 学期按时间升序编号 1..N, 与默认草稿的锁定学期对齐
    pub fn from_parts(transcript: &[TranscriptEntry], plan: &[PlanEntry]) -> Self {
        let mut semesters: Vec<(i32, u8)> = transcript
            .iter()
            .map(|e| term_sort_key(e.year, e.term))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        semesters.sort();

        let ordinal: HashMap<(i32, u8), i64> = semesters
            .into_iter()
            .enumerate()
            .map(|(i, key)| (key, (i as i64) + 1))
            .collect();

        let mut history = Self::new();

        for entry in transcript {
            let semester_no = ordinal[&term_sort_key(entry.year, entry.term)];
            let kind = match entry.status {
                TranscriptStatus::Completed => HistoryKind::Completed,
                TranscriptStatus::Transfer => HistoryKind::Transfer,
                TranscriptStatus::InProgress => HistoryKind::InProgress,
            };
            history.add_record(&entry.course_id, semester_no, kind);
            if entry.status.is_confirmed() {
                history.completed_credits += entry.credits_earned;
            }
        }

        for entry in plan {
            // 成绩单记录优先; 同一课程不重复计入
            if !history.records.contains_key(&entry.course_id) {
                history.add_record(&entry.course_id, entry.semester_no, HistoryKind::Planned);
            }
        }

        history
    }

    pub fn add_record(&mut self, course_id: &str, semester_no: i64, kind: HistoryKind) {
        self.records.insert(
            course_id.to_string(),
            HistoryRecord {
                course_id: course_id.to_string(),
                semester_no,
                kind,
            },
        );
    }

    pub fn set_completed_credits(&mut self, credits: f64) {
        self.completed_credits = credits;
    }

    pub fn completed_credits(&self) -> f64 {
        self.completed_credits
    }

    fn find(&self, course_id: &str) -> Option<&HistoryRecord> {
        self.records.get(course_id)
    }
}

// ==========================================
// 年级判定器
// ==========================================

/// STATUS 依赖的判定接口, 允许调用方替换判定口径
pub trait StandingEvaluator {
    fn satisfies(&self, required_status: &str) -> bool;
}

/// 默认判定器: 按已确认学分换算年级 (0/30/60/90)
pub struct CreditStanding {
    completed_credits: f64,
}

impl CreditStanding {
    pub fn new(completed_credits: f64) -> Self {
        Self { completed_credits }
    }
}

impl StandingEvaluator for CreditStanding {
    fn satisfies(&self, required_status: &str) -> bool {
        match ClassStanding::from_str(required_status) {
            Some(required) => ClassStanding::from_completed_credits(self.completed_credits) >= required,
            // 未知的年级要求按不满足处理
            None => false,
        }
    }
}

// ==========================================
// PrerequisiteGraph - 课程依赖图
// ==========================================
// 邻接表按 course_id 组织出边; 边类型显式打标
pub struct PrerequisiteGraph {
    edges: HashMap<String, Vec<CourseDependency>>,
}

impl PrerequisiteGraph {
    /// 由依赖边集合构建邻接表
    pub fn from_edges(deps: Vec<CourseDependency>) -> Self {
        let mut edges: HashMap<String, Vec<CourseDependency>> = HashMap::new();
        for dep in deps {
            edges.entry(dep.course_id.clone()).or_default().push(dep);
        }
        Self { edges }
    }

    /// 判定课程能否放入目标学期
    ///
    /// # 参数
    /// - `course_id`: 待放置课程
    /// - `target_semester_no`: 目标学期序号
    /// - `history`: 修读历史 (成绩单 + 计划)
    /// - `strict`: 严格模式 (提交时); 先修/同修违规升级为硬阻断
    /// - `standing`: 年级门槛判定器
    pub fn can_place(
        &self,
        course_id: &str,
        target_semester_no: i64,
        history: &StudentHistory,
        strict: bool,
        standing: &dyn StandingEvaluator,
    ) -> PlacementCheck {
        let mut violations = Vec::new();
        let course_severity = if strict {
            ViolationSeverity::Hard
        } else {
            ViolationSeverity::Soft
        };

        for dep in self.edges.get(course_id).map(|v| v.as_slice()).unwrap_or(&[]) {
            match dep.kind {
                DependencyKind::Prerequisite => {
                    let dep_course = match &dep.dependency_course_id {
                        Some(c) => c,
                        None => continue,
                    };
                    if !self.prerequisite_satisfied(dep_course, target_semester_no, history) {
                        violations.push(PlacementViolation {
                            course_id: course_id.to_string(),
                            dependency_course_id: Some(dep_course.clone()),
                            kind: DependencyKind::Prerequisite,
                            severity: course_severity,
                            message: format!(
                                "先修课{}未在学期{}之前完成或计划",
                                dep_course, target_semester_no
                            ),
                        });
                    }
                }
                DependencyKind::Corequisite => {
                    let dep_course = match &dep.dependency_course_id {
                        Some(c) => c,
                        None => continue,
                    };
                    if !Self::corequisite_satisfied(dep_course, target_semester_no, history) {
                        violations.push(PlacementViolation {
                            course_id: course_id.to_string(),
                            dependency_course_id: Some(dep_course.clone()),
                            kind: DependencyKind::Corequisite,
                            severity: course_severity,
                            message: format!(
                                "同修课{}未在学期{}或更早学期出现",
                                dep_course, target_semester_no
                            ),
                        });
                    }
                }
                DependencyKind::Status => {
                    let required = dep.required_status.as_deref().unwrap_or("");
                    if !standing.satisfies(required) {
                        violations.push(PlacementViolation {
                            course_id: course_id.to_string(),
                            dependency_course_id: None,
                            kind: DependencyKind::Status,
                            // 年级门槛恒为硬前置条件
                            severity: ViolationSeverity::Hard,
                            message: format!("不满足年级要求: {}", required),
                        });
                    }
                }
            }
        }

        let ok = violations
            .iter()
            .all(|v| v.severity != ViolationSeverity::Hard);

        PlacementCheck { ok, violations }
    }

    /// 先修口径: COMPLETED/TRANSFER 或计划条目, 且严格早于目标学期
    ///
    /// IN_PROGRESS 不计入 (完成与否尚无定论)
    fn prerequisite_satisfied(
        &self,
        dep_course: &str,
        target_semester_no: i64,
        history: &StudentHistory,
    ) -> bool {
        match history.find(dep_course) {
            Some(record) => {
                record.semester_no < target_semester_no
                    && matches!(
                        record.kind,
                        HistoryKind::Completed | HistoryKind::Transfer | HistoryKind::Planned
                    )
            }
            None => false,
        }
    }

    /// 同修口径: 同学期或更早学期出现即可 (来源不限)
    fn corequisite_satisfied(
        dep_course: &str,
        target_semester_no: i64,
        history: &StudentHistory,
    ) -> bool {
        match history.find(dep_course) {
            Some(record) => record.semester_no <= target_semester_no,
            None => false,
        }
    }

    /// 编目校验: 新增 PREREQUISITE 边 (course → dependency) 是否成环
    ///
    /// 从 dependency 沿既有 PREREQUISITE 边深度优先; 能回到 course 即成环
    pub fn would_create_cycle(&self, course_id: &str, dependency_course_id: &str) -> bool {
        if course_id == dependency_course_id {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![dependency_course_id];

        while let Some(current) = stack.pop() {
            if current == course_id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(deps) = self.edges.get(current) {
                for dep in deps {
                    if dep.kind == DependencyKind::Prerequisite {
                        if let Some(next) = &dep.dependency_course_id {
                            stack.push(next);
                        }
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::CourseDependency;

    fn graph(edges: Vec<CourseDependency>) -> PrerequisiteGraph {
        PrerequisiteGraph::from_edges(edges)
    }

    fn history_with(records: &[(&str, i64, HistoryKind)]) -> StudentHistory {
        let mut h = StudentHistory::new();
        for (course, sem, kind) in records {
            h.add_record(course, *sem, *kind);
        }
        h
    }

    #[test]
    fn test_prerequisite_met_by_completed_earlier() {
        let g = graph(vec![CourseDependency::course_edge(
            "C201", "C101", DependencyKind::Prerequisite,
        )]);
        let h = history_with(&[("C101", 1, HistoryKind::Completed)]);
        let standing = CreditStanding::new(0.0);

        let check = g.can_place("C201", 2, &h, true, &standing);
        assert!(check.ok);
        assert!(check.violations.is_empty());
    }

    #[test]
    fn test_prerequisite_same_semester_fails() {
        let g = graph(vec![CourseDependency::course_edge(
            "C201", "C101", DependencyKind::Prerequisite,
        )]);
        // 同学期不满足"严格更早"
        let h = history_with(&[("C101", 2, HistoryKind::Planned)]);
        let standing = CreditStanding::new(0.0);

        let check = g.can_place("C201", 2, &h, false, &standing);
        assert!(check.ok); // 宽松模式: 软告警不阻断
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].severity, ViolationSeverity::Soft);

        let strict = g.can_place("C201", 2, &h, true, &standing);
        assert!(!strict.ok); // 严格模式: 硬阻断
    }

    #[test]
    fn test_in_progress_does_not_satisfy_prerequisite() {
        let g = graph(vec![CourseDependency::course_edge(
            "C201", "C101", DependencyKind::Prerequisite,
        )]);
        let h = history_with(&[("C101", 1, HistoryKind::InProgress)]);
        let standing = CreditStanding::new(0.0);

        let check = g.can_place("C201", 3, &h, true, &standing);
        assert!(!check.ok);
    }

    #[test]
    fn test_corequisite_same_semester_ok() {
        let g = graph(vec![CourseDependency::course_edge(
            "PHY102", "MAT102", DependencyKind::Corequisite,
        )]);
        let h = history_with(&[("MAT102", 3, HistoryKind::Planned)]);
        let standing = CreditStanding::new(0.0);

        assert!(g.can_place("PHY102", 3, &h, true, &standing).ok);
        // 更晚学期不满足
        assert!(!g.can_place("PHY102", 2, &h, true, &standing).ok);
    }

    #[test]
    fn test_status_edge_is_hard_even_in_lenient_mode() {
        let g = graph(vec![CourseDependency::status_edge("CAP400", "JUNIOR")]);
        let h = StudentHistory::new();

        let fresh = CreditStanding::new(15.0);
        let check = g.can_place("CAP400", 5, &h, false, &fresh);
        assert!(!check.ok);
        assert_eq!(check.violations[0].severity, ViolationSeverity::Hard);

        let junior = CreditStanding::new(60.0);
        assert!(g.can_place("CAP400", 5, &h, false, &junior).ok);
    }

    #[test]
    fn test_cycle_detection() {
        let g = graph(vec![
            CourseDependency::course_edge("B", "A", DependencyKind::Prerequisite),
            CourseDependency::course_edge("C", "B", DependencyKind::Prerequisite),
        ]);

        // A → C 会形成 A→C→B→A 环
        assert!(g.would_create_cycle("A", "C"));
        // 自环
        assert!(g.would_create_cycle("A", "A"));
        // D → A 无环
        assert!(!g.would_create_cycle("D", "A"));
        // A → D: D 无出边, 到不了 A
        assert!(!g.would_create_cycle("A", "D"));
    }

    #[test]
    fn test_history_from_parts_orders_transcript_semesters() {
        use crate::domain::student::TranscriptEntry;
        use crate::domain::types::TranscriptStatus;

        let transcript = vec![
            TranscriptEntry {
                entry_id: "t1".into(),
                student_id: "S1".into(),
                course_id: "C101".into(),
                term: Term::Fall,
                year: 2022,
                status: TranscriptStatus::Completed,
                grade: Some("A".into()),
                credits_earned: 3.0,
            },
            TranscriptEntry {
                entry_id: "t2".into(),
                student_id: "S1".into(),
                course_id: "C102".into(),
                term: Term::Spring,
                year: 2023,
                status: TranscriptStatus::Completed,
                grade: Some("B".into()),
                credits_earned: 3.0,
            },
        ];

        let h = StudentHistory::from_parts(&transcript, &[]);
        assert_eq!(h.find("C101").unwrap().semester_no, 1);
        assert_eq!(h.find("C102").unwrap().semester_no, 2);
        assert_eq!(h.completed_credits(), 6.0);
    }
}
