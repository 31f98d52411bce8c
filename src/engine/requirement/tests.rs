// ==========================================
// 满足度引擎单元测试
// ==========================================

use super::core::{RequirementTree, RequirementTreeError, Satisfaction, StudentRecordView};
use super::report::evaluate_program;
use crate::domain::course::Course;
use crate::domain::program::{GroupCourse, Program, RequirementGroup};
use crate::domain::types::{ConcentrationPolicy, MinorPolicy, ProgramType};
use std::collections::HashMap;

fn course(id: &str, code: &str, credits: f64) -> Course {
    Course {
        course_id: id.to_string(),
        course_code: code.to_string(),
        title: code.to_string(),
        credits,
        is_active: true,
    }
}

fn group(id: &str, parent: Option<&str>, credits_required: f64, min_courses: i64) -> RequirementGroup {
    RequirementGroup {
        group_id: id.to_string(),
        program_id: "P1".to_string(),
        parent_group_id: parent.map(|s| s.to_string()),
        group_name: id.to_string(),
        credits_required,
        min_courses_required: min_courses,
    }
}

fn member(group_id: &str, course_id: &str, mandatory: bool) -> GroupCourse {
    GroupCourse {
        group_id: group_id.to_string(),
        course_id: course_id.to_string(),
        is_mandatory: mandatory,
    }
}

fn program(total: f64) -> Program {
    Program {
        program_id: "P1".to_string(),
        program_name: "计算机科学".to_string(),
        program_type: ProgramType::Major,
        parent_program_id: None,
        total_credits_required: total,
        minor_policy: MinorPolicy::No,
        concentration_policy: ConcentrationPolicy::NotAvailable,
    }
}

fn course_map(courses: Vec<Course>) -> HashMap<String, Course> {
    courses.into_iter().map(|c| (c.course_id.clone(), c)).collect()
}

#[test]
fn test_tree_rejects_unknown_parent() {
    let groups = vec![group("G1", Some("MISSING"), 0.0, 0)];
    match RequirementTree::build(groups) {
        Err(RequirementTreeError::MissingParent { parent_id, .. }) => {
            assert_eq!(parent_id, "MISSING");
        }
        other => panic!("期望 MissingParent, 得到 {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_tree_rejects_cycle() {
    let groups = vec![
        group("G1", Some("G2"), 0.0, 0),
        group("G2", Some("G1"), 0.0, 0),
    ];
    assert!(matches!(
        RequirementTree::build(groups),
        Err(RequirementTreeError::CycleDetected(_))
    ));
}

#[test]
fn test_validate_reparent_blocks_descendant_parent() {
    let groups = vec![
        group("ROOT", None, 0.0, 0),
        group("MID", Some("ROOT"), 0.0, 0),
        group("LEAF", Some("MID"), 0.0, 0),
    ];

    // ROOT 挂到自己的后代 LEAF 下会成环
    assert!(!RequirementTree::validate_reparent(&groups, "ROOT", "LEAF"));
    // 自指
    assert!(!RequirementTree::validate_reparent(&groups, "MID", "MID"));
    // LEAF 挂到 ROOT 下合法
    assert!(RequirementTree::validate_reparent(&groups, "LEAF", "ROOT"));
}

#[test]
fn test_bucket_selection_maximizes_credits_with_code_tiebreak() {
    // 选修池要求 2 门: X(3cr) / Y(3cr) / Z(4cr) 全满足
    // 按学分最大化应选 Z, 再按代码升序在 X/Y 中取 X
    let courses = course_map(vec![
        course("x", "CS-X", 3.0),
        course("y", "CS-Y", 3.0),
        course("z", "CS-Z", 4.0),
    ]);
    let groups = vec![group("G1", None, 7.0, 2)];
    let memberships = vec![
        member("G1", "x", false),
        member("G1", "y", false),
        member("G1", "z", false),
    ];

    let mut view = StudentRecordView::new();
    view.set("x", Satisfaction::Confirmed);
    view.set("y", Satisfaction::Confirmed);
    view.set("z", Satisfaction::Confirmed);

    let report = evaluate_program(&program(7.0), groups, &memberships, &courses, &view).unwrap();
    let g = &report.groups[0];

    assert_eq!(g.bucket_selected, vec!["CS-Z".to_string(), "CS-X".to_string()]);
    assert_eq!(g.credits_confirmed, 7.0);
    assert!(g.satisfied_confirmed);
    assert_eq!(g.bucket_shortfall, 0);
}

#[test]
fn test_bucket_shortfall_reported() {
    let courses = course_map(vec![course("x", "CS-X", 3.0), course("y", "CS-Y", 3.0)]);
    let groups = vec![group("G1", None, 9.0, 3)];
    let memberships = vec![member("G1", "x", false), member("G1", "y", false)];

    let mut view = StudentRecordView::new();
    view.set("x", Satisfaction::Confirmed);
    // y 未满足

    let report = evaluate_program(&program(9.0), groups, &memberships, &courses, &view).unwrap();
    let g = &report.groups[0];

    assert_eq!(g.bucket_shortfall, 2); // 要求3门, 只满足1门
    assert_eq!(g.bucket_credit_gap, 6.0); // 9 - 3
    assert!(!g.satisfied_confirmed);
    assert!(!g.satisfied_projected);
}

#[test]
fn test_mandatory_unmet_reported_by_code() {
    let courses = course_map(vec![
        course("a", "CS101", 3.0),
        course("b", "CS102", 3.0),
    ]);
    let groups = vec![group("G1", None, 6.0, 0)];
    let memberships = vec![member("G1", "a", true), member("G1", "b", true)];

    let mut view = StudentRecordView::new();
    view.set("a", Satisfaction::Confirmed);

    let report = evaluate_program(&program(6.0), groups, &memberships, &courses, &view).unwrap();
    let g = &report.groups[0];

    assert_eq!(g.mandatory_unmet, vec!["CS102".to_string()]);
    assert_eq!(g.credits_confirmed, 3.0);
    assert!(!g.satisfied_confirmed);
}

#[test]
fn test_confirmed_and_projected_not_conflated() {
    let courses = course_map(vec![
        course("a", "CS101", 3.0),
        course("b", "CS102", 3.0),
    ]);
    let groups = vec![group("G1", None, 6.0, 0)];
    let memberships = vec![member("G1", "a", true), member("G1", "b", true)];

    let mut view = StudentRecordView::new();
    view.set("a", Satisfaction::Confirmed);
    view.set("b", Satisfaction::Projected); // 已提交未批准

    let report = evaluate_program(&program(6.0), groups, &memberships, &courses, &view).unwrap();
    let g = &report.groups[0];

    assert_eq!(g.credits_confirmed, 3.0);
    assert_eq!(g.credits_projected, 6.0);
    assert!(!g.satisfied_confirmed);
    assert!(g.satisfied_projected);
    assert!(g.mandatory_unmet.is_empty()); // 预计口径下无缺口
}

#[test]
fn test_parent_aggregates_children() {
    let courses = course_map(vec![
        course("a", "CS101", 3.0),
        course("b", "MA101", 4.0),
    ]);
    // 父组无自有门槛, 两个叶子各一门必修
    let groups = vec![
        group("ROOT", None, 0.0, 0),
        group("CS", Some("ROOT"), 3.0, 0),
        group("MA", Some("ROOT"), 4.0, 0),
    ];
    let memberships = vec![member("CS", "a", true), member("MA", "b", true)];

    let mut view = StudentRecordView::new();
    view.set("a", Satisfaction::Confirmed);
    // b 未满足 → MA 组不满足 → ROOT 不满足

    let report = evaluate_program(&program(7.0), groups, &memberships, &courses, &view).unwrap();
    assert_eq!(report.groups.len(), 1);
    let root = &report.groups[0];

    assert_eq!(root.children.len(), 2);
    assert_eq!(root.credits_confirmed, 3.0);
    assert!(!root.satisfied_confirmed);

    // b 批准后父组整体满足
    let mut view2 = view.clone();
    let groups2 = vec![
        group("ROOT", None, 0.0, 0),
        group("CS", Some("ROOT"), 3.0, 0),
        group("MA", Some("ROOT"), 4.0, 0),
    ];
    view2.set("b", Satisfaction::Confirmed);
    let report2 = evaluate_program(&program(7.0), groups2, &memberships, &courses, &view2).unwrap();
    assert!(report2.groups[0].satisfied_confirmed);
    assert_eq!(report2.groups[0].credits_confirmed, 7.0);
}

#[test]
fn test_free_elective_remaining_bounded_at_zero() {
    let courses = course_map(vec![course("a", "CS101", 3.0)]);
    let groups = vec![group("G1", None, 3.0, 0)];
    let memberships = vec![member("G1", "a", true)];

    let mut view = StudentRecordView::new();
    view.set("a", Satisfaction::Confirmed);

    // 方案总学分 10 → 剩余 7
    let report = evaluate_program(&program(10.0), groups, &memberships, &courses, &view).unwrap();
    assert_eq!(report.free_elective_remaining, 7.0);

    // 方案总学分低于已满足学分 → 下界为零
    let groups2 = vec![group("G1", None, 3.0, 0)];
    let report2 = evaluate_program(&program(2.0), groups2, &memberships, &courses, &view).unwrap();
    assert_eq!(report2.free_elective_remaining, 0.0);
}

#[test]
fn test_view_confirmed_takes_precedence() {
    let mut view = StudentRecordView::new();
    view.set("a", Satisfaction::Confirmed);
    view.set("a", Satisfaction::Projected); // 不得降级

    assert!(view.confirmed("a"));
    assert!(view.projected("a"));
}
