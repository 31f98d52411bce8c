// ==========================================
// 修业计划审核系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 培养方案类型 (Program Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramType {
    Major,         // 主修
    Minor,         // 辅修
    Concentration, // 专业方向 (必须挂靠主修)
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProgramType {
    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MAJOR" => Some(ProgramType::Major),
            "MINOR" => Some(ProgramType::Minor),
            "CONCENTRATION" => Some(ProgramType::Concentration),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProgramType::Major => "MAJOR",
            ProgramType::Minor => "MINOR",
            ProgramType::Concentration => "CONCENTRATION",
        }
    }
}

// ==========================================
// 辅修政策 (Minor Policy)
// ==========================================
// 方案级配置: 该主修是否要求/允许辅修
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MinorPolicy {
    Yes,         // 要求辅修
    No,          // 不要求辅修
    Conditional, // 视方向而定
}

impl fmt::Display for MinorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MinorPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "YES" => Some(MinorPolicy::Yes),
            "NO" => Some(MinorPolicy::No),
            "CONDITIONAL" => Some(MinorPolicy::Conditional),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MinorPolicy::Yes => "YES",
            MinorPolicy::No => "NO",
            MinorPolicy::Conditional => "CONDITIONAL",
        }
    }
}

// ==========================================
// 专业方向政策 (Concentration Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConcentrationPolicy {
    Required,     // 必须选择方向
    Optional,     // 可选方向
    NotAvailable, // 无方向设置
}

impl fmt::Display for ConcentrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ConcentrationPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "REQUIRED" => Some(ConcentrationPolicy::Required),
            "OPTIONAL" => Some(ConcentrationPolicy::Optional),
            "NOT_AVAILABLE" => Some(ConcentrationPolicy::NotAvailable),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConcentrationPolicy::Required => "REQUIRED",
            ConcentrationPolicy::Optional => "OPTIONAL",
            ConcentrationPolicy::NotAvailable => "NOT_AVAILABLE",
        }
    }
}

// ==========================================
// 课程依赖类型 (Dependency Kind)
// ==========================================
// 先修/同修构成课程有向图; STATUS 依赖挂接年级门槛
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyKind {
    Prerequisite, // 先修课: 必须在更早学期完成
    Corequisite,  // 同修课: 同学期或更早
    Status,       // 年级门槛: 按已修学分判定
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DependencyKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PREREQUISITE" => Some(DependencyKind::Prerequisite),
            "COREQUISITE" => Some(DependencyKind::Corequisite),
            "STATUS" => Some(DependencyKind::Status),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DependencyKind::Prerequisite => "PREREQUISITE",
            DependencyKind::Corequisite => "COREQUISITE",
            DependencyKind::Status => "STATUS",
        }
    }
}

// ==========================================
// 成绩单状态 (Transcript Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranscriptStatus {
    Completed,  // 已完成
    InProgress, // 修读中
    Transfer,   // 转学分认定
}

impl fmt::Display for TranscriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TranscriptStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "COMPLETED" => Some(TranscriptStatus::Completed),
            "IN_PROGRESS" => Some(TranscriptStatus::InProgress),
            "TRANSFER" => Some(TranscriptStatus::Transfer),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TranscriptStatus::Completed => "COMPLETED",
            TranscriptStatus::InProgress => "IN_PROGRESS",
            TranscriptStatus::Transfer => "TRANSFER",
        }
    }

    /// 是否计入"已确认"课程 (Completed/Transfer)
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TranscriptStatus::Completed | TranscriptStatus::Transfer)
    }
}

// ==========================================
// 计划条目状态 (Plan Entry Status)
// ==========================================
// 状态机: DRAFT → SUBMITTED → {APPROVED, REJECTED}; REJECTED → DRAFT (revise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanEntryStatus {
    Draft,     // 草稿 (可编辑)
    Submitted, // 已提交 (待导师审批)
    Approved,  // 已批准 (终态)
    Rejected,  // 已驳回 (可 revise 回草稿)
}

impl fmt::Display for PlanEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PlanEntryStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(PlanEntryStatus::Draft),
            "SUBMITTED" => Some(PlanEntryStatus::Submitted),
            "APPROVED" => Some(PlanEntryStatus::Approved),
            "REJECTED" => Some(PlanEntryStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanEntryStatus::Draft => "DRAFT",
            PlanEntryStatus::Submitted => "SUBMITTED",
            PlanEntryStatus::Approved => "APPROVED",
            PlanEntryStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 学期类型 (Term)
// ==========================================
// 常规推进: Fall → Spring → Fall; Summer 只能显式插入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Term {
    Fall,   // 秋季
    Spring, // 春季
    Summer, // 夏季
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Term {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FALL" => Some(Term::Fall),
            "SPRING" => Some(Term::Spring),
            "SUMMER" => Some(Term::Summer),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Term::Fall => "FALL",
            Term::Spring => "SPRING",
            Term::Summer => "SUMMER",
        }
    }

    /// 常规学期推进: 返回下一个 (term, year)
    ///
    /// - Fall Y  → Spring Y+1
    /// - Spring Y → Fall Y
    /// - Summer Y → Fall Y
    pub fn next_regular(&self, year: i32) -> (Term, i32) {
        match self {
            Term::Fall => (Term::Spring, year + 1),
            Term::Spring => (Term::Fall, year),
            Term::Summer => (Term::Fall, year),
        }
    }

    /// 显式插入夏季学期: 返回紧随其后的 (SUMMER, year)
    ///
    /// - Spring Y → Summer Y
    /// - Fall Y   → Summer Y+1
    /// - Summer Y → Summer Y+1 (连续夏季视为下一年)
    pub fn next_summer(&self, year: i32) -> (Term, i32) {
        match self {
            Term::Spring => (Term::Summer, year),
            Term::Fall => (Term::Summer, year + 1),
            Term::Summer => (Term::Summer, year + 1),
        }
    }
}

// ==========================================
// 审批决定 (Approval Decision)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approved, // 批准
    Rejected, // 驳回
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ApprovalDecision {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "APPROVED" => Some(ApprovalDecision::Approved),
            "REJECTED" => Some(ApprovalDecision::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "APPROVED",
            ApprovalDecision::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 辅修兼容规则 (Compatibility Rule)
// ==========================================
// 按 (主修, 辅修) 键值查表; FORBIDDEN 产生审核告警, 不阻断审核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityRule {
    Allowed,   // 允许组合
    Forbidden, // 禁止组合
}

impl fmt::Display for CompatibilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CompatibilityRule {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALLOWED" => Some(CompatibilityRule::Allowed),
            "FORBIDDEN" => Some(CompatibilityRule::Forbidden),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CompatibilityRule::Allowed => "ALLOWED",
            CompatibilityRule::Forbidden => "FORBIDDEN",
        }
    }
}

// ==========================================
// 年级 (Class Standing)
// ==========================================
// STATUS 依赖的判定目标; 默认按已修学分阈值换算
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassStanding {
    Freshman,  // 一年级
    Sophomore, // 二年级
    Junior,    // 三年级
    Senior,    // 四年级
}

impl fmt::Display for ClassStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ClassStanding {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FRESHMAN" => Some(ClassStanding::Freshman),
            "SOPHOMORE" => Some(ClassStanding::Sophomore),
            "JUNIOR" => Some(ClassStanding::Junior),
            "SENIOR" => Some(ClassStanding::Senior),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ClassStanding::Freshman => "FRESHMAN",
            ClassStanding::Sophomore => "SOPHOMORE",
            ClassStanding::Junior => "JUNIOR",
            ClassStanding::Senior => "SENIOR",
        }
    }

    /// 按已修学分换算年级 (0/30/60/90 学分阈值)
    pub fn from_completed_credits(credits: f64) -> Self {
        if credits >= 90.0 {
            ClassStanding::Senior
        } else if credits >= 60.0 {
            ClassStanding::Junior
        } else if credits >= 30.0 {
            ClassStanding::Sophomore
        } else {
            ClassStanding::Freshman
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_progression() {
        assert_eq!(Term::Fall.next_regular(2022), (Term::Spring, 2023));
        assert_eq!(Term::Spring.next_regular(2023), (Term::Fall, 2023));
        assert_eq!(Term::Summer.next_regular(2023), (Term::Fall, 2023));

        assert_eq!(Term::Spring.next_summer(2023), (Term::Summer, 2023));
        assert_eq!(Term::Fall.next_summer(2022), (Term::Summer, 2023));
    }

    #[test]
    fn test_standing_thresholds() {
        assert_eq!(ClassStanding::from_completed_credits(0.0), ClassStanding::Freshman);
        assert_eq!(ClassStanding::from_completed_credits(29.9), ClassStanding::Freshman);
        assert_eq!(ClassStanding::from_completed_credits(30.0), ClassStanding::Sophomore);
        assert_eq!(ClassStanding::from_completed_credits(60.0), ClassStanding::Junior);
        assert_eq!(ClassStanding::from_completed_credits(95.0), ClassStanding::Senior);
    }

    #[test]
    fn test_db_round_trip() {
        assert_eq!(PlanEntryStatus::from_str("SUBMITTED"), Some(PlanEntryStatus::Submitted));
        assert_eq!(PlanEntryStatus::Submitted.to_db_str(), "SUBMITTED");
        assert_eq!(DependencyKind::from_str("corequisite"), Some(DependencyKind::Corequisite));
        assert_eq!(TranscriptStatus::from_str("BOGUS"), None);
    }
}
