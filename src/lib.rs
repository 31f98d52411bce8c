// ==========================================
// 修业计划审核系统 - 核心库
// ==========================================
// 分层: domain (实体) → repository (数据访问) → engine (业务计算)
//       → api (对外入口); config 与 db 为横切支撑
// 红线: 上层只依赖下层, 引擎不落库, 仓储不含业务规则
// ==========================================

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod repository;
