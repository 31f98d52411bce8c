// ==========================================
// 修业计划审核系统 - 选课计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 状态机转换必须在单事务内完成 (见 entry.rs transition_semester)
// ==========================================

mod approval;
mod draft;
mod entry;
mod semester;

pub use approval::ApprovalRecordRepository;
pub use draft::PlanDraftRepository;
pub use entry::PlanEntryRepository;
pub use semester::PlanSemesterRepository;

use chrono::NaiveDateTime;

/// 统一时间戳存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 解析时间戳列, 失败时转换为 rusqlite 行映射错误
pub(crate) fn parse_ts_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 枚举列解析失败时转换为 rusqlite 行映射错误
pub(crate) fn enum_parse_failure(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析枚举值: {}", value).into(),
    )
}
