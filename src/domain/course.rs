// ==========================================
// 修业计划审核系统 - 课程目录实体
// ==========================================
// 课程目录数据由外部协作方维护, 本核心只读消费
// ==========================================

use crate::domain::types::DependencyKind;
use serde::{Deserialize, Serialize};

// ==========================================
// Course - 课程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    /// 课程代码 (如 "CS101"), 全局唯一, 也是审核报告的展示键
    pub course_code: String,
    pub title: String,
    pub credits: f64,
    pub is_active: bool,
}

// ==========================================
// CourseDependency - 课程依赖边
// ==========================================
// 课程有向图的边; PREREQUISITE 边集合必须无环 (编目时校验)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDependency {
    pub dependency_id: String,
    /// 受约束课程
    pub course_id: String,
    /// 依赖课程; STATUS 边无依赖课程
    pub dependency_course_id: Option<String>,
    pub kind: DependencyKind,
    /// STATUS 边的年级要求 (如 "JUNIOR")
    pub required_status: Option<String>,
    pub note: Option<String>,
}

impl CourseDependency {
    /// 创建先修/同修边
    pub fn course_edge(course_id: &str, dependency_course_id: &str, kind: DependencyKind) -> Self {
        Self {
            dependency_id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            dependency_course_id: Some(dependency_course_id.to_string()),
            kind,
            required_status: None,
            note: None,
        }
    }

    /// 创建年级门槛边
    pub fn status_edge(course_id: &str, required_status: &str) -> Self {
        Self {
            dependency_id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            dependency_course_id: None,
            kind: DependencyKind::Status,
            required_status: Some(required_status.to_string()),
            note: None,
        }
    }
}
