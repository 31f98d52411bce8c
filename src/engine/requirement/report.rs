// ==========================================
// 满足度评估与报告组装
// ==========================================
// 后序遍历 (children 先于 parent); 选修池按学分最大化选取,
// 学分相同按课程代码升序破平, 保证输出确定性
// ==========================================

use crate::domain::audit::{GroupReport, RequirementReport};
use crate::domain::course::Course;
use crate::domain::program::{GroupCourse, Program};
use crate::engine::requirement::core::{GroupNode, RequirementTree, RequirementTreeError, StudentRecordView};
use std::collections::HashMap;

/// 评估单个方案的满足度
///
/// # 参数
/// - `program`: 方案
/// - `tree`: 该方案的课程组树
/// - `memberships`: 方案下全部课程组成员关系
/// - `courses`: course_id → Course (学分与代码的来源)
/// - `view`: 学生修读视图
pub fn evaluate_program(
    program: &Program,
    groups: Vec<crate::domain::program::RequirementGroup>,
    memberships: &[GroupCourse],
    courses: &HashMap<String, Course>,
    view: &StudentRecordView,
) -> Result<RequirementReport, RequirementTreeError> {
    let tree = RequirementTree::build(groups)?;

    let mut by_group: HashMap<&str, Vec<&GroupCourse>> = HashMap::new();
    for m in memberships {
        by_group.entry(m.group_id.as_str()).or_default().push(m);
    }

    let mut group_reports = Vec::new();
    let mut credits_confirmed = 0.0_f64;
    let mut credits_projected = 0.0_f64;
    let mut satisfied_confirmed = true;
    let mut satisfied_projected = true;

    for &root in tree.roots() {
        let report = evaluate_group(&tree, root, &by_group, courses, view);
        credits_confirmed += report.credits_confirmed;
        credits_projected += report.credits_projected;
        satisfied_confirmed &= report.satisfied_confirmed;
        satisfied_projected &= report.satisfied_projected;
        group_reports.push(report);
    }

    // 自由选修剩余学分: 只是剩余量提示, 以已确认口径计算, 下界为零
    let free_elective_remaining = (program.total_credits_required - credits_confirmed).max(0.0);

    Ok(RequirementReport {
        program_id: program.program_id.clone(),
        program_name: program.program_name.clone(),
        program_type: program.program_type,
        total_credits_required: program.total_credits_required,
        credits_confirmed,
        credits_projected,
        satisfied_confirmed,
        satisfied_projected,
        free_elective_remaining,
        groups: group_reports,
    })
}

/// 后序评估单个课程组
fn evaluate_group(
    tree: &RequirementTree,
    idx: usize,
    by_group: &HashMap<&str, Vec<&GroupCourse>>,
    courses: &HashMap<String, Course>,
    view: &StudentRecordView,
) -> GroupReport {
    let node: &GroupNode = tree.node(idx);
    let group = &node.group;

    // === 子组先行 ===
    let mut children = Vec::new();
    let mut child_credits_confirmed = 0.0_f64;
    let mut child_credits_projected = 0.0_f64;
    let mut children_satisfied_confirmed = true;
    let mut children_satisfied_projected = true;

    for &child in &node.children {
        let report = evaluate_group(tree, child, by_group, courses, view);
        child_credits_confirmed += report.credits_confirmed;
        child_credits_projected += report.credits_projected;
        children_satisfied_confirmed &= report.satisfied_confirmed;
        children_satisfied_projected &= report.satisfied_projected;
        children.push(report);
    }

    // === 自有课程池: 必修 / 选修池划分 ===
    let members = by_group
        .get(group.group_id.as_str())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

    let mut mandatory_unmet = Vec::new();
    let mut own_confirmed = 0.0_f64;
    let mut own_projected = 0.0_f64;
    let mut mandatory_all_confirmed = true;
    let mut mandatory_all_projected = true;

    // 选修池候选: (course_code, credits, confirmed)
    let mut bucket_candidates: Vec<(&Course, bool)> = Vec::new();

    for member in members {
        let course = match courses.get(&member.course_id) {
            Some(c) => c,
            // 未知课程不参与评估 (目录数据缺失按零学分缺口处理)
            None => continue,
        };

        if member.is_mandatory {
            let confirmed = view.confirmed(&course.course_id);
            let projected = view.projected(&course.course_id);
            if confirmed {
                own_confirmed += course.credits;
            }
            if projected {
                own_projected += course.credits;
            } else {
                mandatory_unmet.push(course.course_code.clone());
            }
            mandatory_all_confirmed &= confirmed;
            mandatory_all_projected &= projected;
        } else if view.projected(&course.course_id) {
            bucket_candidates.push((course, view.confirmed(&course.course_id)));
        }
    }

    mandatory_unmet.sort();

    // === 选修池选取: 学分降序, 代码升序破平, 取前 min_courses_required ===
    let take = group.min_courses_required.max(0) as usize;

    bucket_candidates.sort_by(|a, b| {
        b.0.credits
            .partial_cmp(&a.0.credits)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.course_code.cmp(&b.0.course_code))
    });

    let selected_projected: Vec<&(&Course, bool)> =
        bucket_candidates.iter().take(take).collect();
    let selected_confirmed: Vec<&(&Course, bool)> = bucket_candidates
        .iter()
        .filter(|(_, confirmed)| *confirmed)
        .take(take)
        .collect();

    let bucket_selected: Vec<String> = selected_projected
        .iter()
        .map(|(c, _)| c.course_code.clone())
        .collect();
    let bucket_credits_projected: f64 = selected_projected.iter().map(|(c, _)| c.credits).sum();
    let bucket_credits_confirmed: f64 = selected_confirmed.iter().map(|(c, _)| c.credits).sum();

    let bucket_shortfall = (take as i64) - (selected_projected.len() as i64);
    let bucket_shortfall = bucket_shortfall.max(0);
    let bucket_filled_projected = selected_projected.len() == take;
    let bucket_filled_confirmed = selected_confirmed.len() == take;

    // === 学分汇总与门槛比较 ===
    let credits_confirmed = own_confirmed + bucket_credits_confirmed + child_credits_confirmed;
    let credits_projected = own_projected + bucket_credits_projected + child_credits_projected;

    let bucket_credit_gap = (group.credits_required - credits_projected).max(0.0);

    let threshold_met_confirmed = credits_confirmed >= group.credits_required;
    let threshold_met_projected = credits_projected >= group.credits_required;

    let satisfied_confirmed = mandatory_all_confirmed
        && bucket_filled_confirmed
        && threshold_met_confirmed
        && children_satisfied_confirmed;
    let satisfied_projected = mandatory_all_projected
        && bucket_filled_projected
        && threshold_met_projected
        && children_satisfied_projected;

    GroupReport {
        group_id: group.group_id.clone(),
        group_name: group.group_name.clone(),
        credits_required: group.credits_required,
        min_courses_required: group.min_courses_required,
        mandatory_unmet,
        bucket_selected,
        bucket_shortfall,
        bucket_credit_gap,
        credits_confirmed,
        credits_projected,
        satisfied_confirmed,
        satisfied_projected,
        children,
    }
}
