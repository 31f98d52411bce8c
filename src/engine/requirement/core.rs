// ==========================================
// 课程组树 (arena) 与学生修读视图
// ==========================================
// 课程组以稳定 group_id 索引的 arena 组织, 不使用可变回指
// 成环校验是显式的写前校验 (validate_reparent)
// ==========================================

use crate::domain::plan::PlanEntry;
use crate::domain::program::RequirementGroup;
use crate::domain::student::TranscriptEntry;
use crate::domain::types::PlanEntryStatus;
use std::collections::HashMap;
use thiserror::Error;

// ==========================================
// 树构建错误
// ==========================================
#[derive(Error, Debug)]
pub enum RequirementTreeError {
    #[error("课程组父指针指向未知组: group={group_id} parent={parent_id}")]
    MissingParent { group_id: String, parent_id: String },

    #[error("课程组树存在环, 涉及组: {0}")]
    CycleDetected(String),
}

// ==========================================
// RequirementTree - 课程组 arena
// ==========================================
pub struct RequirementTree {
    nodes: Vec<GroupNode>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

pub(crate) struct GroupNode {
    pub group: RequirementGroup,
    pub children: Vec<usize>,
}

impl RequirementTree {
    /// 构建 arena 并校验树形 (无环、父指针有效)
    pub fn build(groups: Vec<RequirementGroup>) -> Result<Self, RequirementTreeError> {
        let index: HashMap<String, usize> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.group_id.clone(), i))
            .collect();

        let mut nodes: Vec<GroupNode> = groups
            .into_iter()
            .map(|group| GroupNode {
                group,
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for i in 0..nodes.len() {
            match nodes[i].group.parent_group_id.clone() {
                None => roots.push(i),
                Some(parent_id) => {
                    let parent_idx = *index.get(&parent_id).ok_or_else(|| {
                        RequirementTreeError::MissingParent {
                            group_id: nodes[i].group.group_id.clone(),
                            parent_id: parent_id.clone(),
                        }
                    })?;
                    if parent_idx == i {
                        return Err(RequirementTreeError::CycleDetected(
                            nodes[i].group.group_id.clone(),
                        ));
                    }
                    nodes[parent_idx].children.push(i);
                }
            }
        }

        // 从根可达的节点数不足说明有环 (环上节点无法从任何根到达)
        let mut reachable = vec![false; nodes.len()];
        let mut stack: Vec<usize> = roots.clone();
        while let Some(i) = stack.pop() {
            if reachable[i] {
                continue;
            }
            reachable[i] = true;
            stack.extend(nodes[i].children.iter().copied());
        }
        if let Some(i) = reachable.iter().position(|r| !r) {
            return Err(RequirementTreeError::CycleDetected(
                nodes[i].group.group_id.clone(),
            ));
        }

        Ok(Self { nodes, roots, index })
    }

    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn node(&self, idx: usize) -> &GroupNode {
        &self.nodes[idx]
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.index.contains_key(group_id)
    }

    /// 写前校验: 把 group_id 挂到 new_parent_id 下是否成环
    ///
    /// 从候选父组沿 parent 链向根回溯, 途中遇到 group_id 即成环
    pub fn validate_reparent(
        groups: &[RequirementGroup],
        group_id: &str,
        new_parent_id: &str,
    ) -> bool {
        if group_id == new_parent_id {
            return false;
        }

        let by_id: HashMap<&str, &RequirementGroup> =
            groups.iter().map(|g| (g.group_id.as_str(), g)).collect();

        let mut current = new_parent_id;
        let mut hops = 0usize;
        while let Some(group) = by_id.get(current) {
            if group.group_id == group_id {
                return false;
            }
            match &group.parent_group_id {
                Some(parent) => {
                    current = parent.as_str();
                    hops += 1;
                    // 既有数据若已含环, 回溯在节点数内必然终止
                    if hops > groups.len() {
                        return false;
                    }
                }
                None => break,
            }
        }

        true
    }
}

// ==========================================
// 学生修读视图 (StudentRecordView)
// ==========================================

/// 单门课程的满足口径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfaction {
    /// 成绩单 COMPLETED/TRANSFER 或计划 APPROVED
    Confirmed,
    /// 计划 SUBMITTED/DRAFT (配置可关)
    Projected,
}

/// 成绩单 + 当前草稿合并后的课程满足视图
#[derive(Debug, Clone, Default)]
pub struct StudentRecordView {
    map: HashMap<String, Satisfaction>,
}

impl StudentRecordView {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由成绩单与计划条目构建
    ///
    /// # 参数
    /// - `count_projected`: false 时 SUBMITTED/DRAFT 不计入任何口径
    pub fn from_parts(
        transcript: &[TranscriptEntry],
        plan: &[PlanEntry],
        count_projected: bool,
    ) -> Self {
        let mut view = Self::new();

        for entry in transcript {
            if entry.status.is_confirmed() {
                view.set(&entry.course_id, Satisfaction::Confirmed);
            }
        }

        for entry in plan {
            match entry.status {
                PlanEntryStatus::Approved => view.set(&entry.course_id, Satisfaction::Confirmed),
                PlanEntryStatus::Submitted | PlanEntryStatus::Draft => {
                    if count_projected {
                        view.set(&entry.course_id, Satisfaction::Projected);
                    }
                }
                // 驳回的条目不计入任何口径
                PlanEntryStatus::Rejected => {}
            }
        }

        view
    }

    /// 设置课程口径; Confirmed 优先于 Projected
    pub fn set(&mut self, course_id: &str, level: Satisfaction) {
        match self.map.get(course_id) {
            Some(Satisfaction::Confirmed) => {}
            _ => {
                self.map.insert(course_id.to_string(), level);
            }
        }
    }

    /// 已确认口径
    pub fn confirmed(&self, course_id: &str) -> bool {
        matches!(self.map.get(course_id), Some(Satisfaction::Confirmed))
    }

    /// 预计口径 (包含已确认)
    pub fn projected(&self, course_id: &str) -> bool {
        self.map.contains_key(course_id)
    }
}
