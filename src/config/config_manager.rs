// ==========================================
// 修业计划审核系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键与默认值
// ==========================================

/// 单学期学分下限 (低于则提交时产生告警, 不阻断)
pub const KEY_MIN_LOAD_CREDITS: &str = "min_load_credits";
pub const DEFAULT_MIN_LOAD_CREDITS: f64 = 12.0;

/// 单学期学分上限 (超过则提交时产生告警, 不阻断)
pub const KEY_MAX_LOAD_CREDITS: &str = "max_load_credits";
pub const DEFAULT_MAX_LOAD_CREDITS: f64 = 18.0;

/// 默认草稿播种学期数
pub const KEY_DEFAULT_SEMESTER_COUNT: &str = "default_semester_count";
pub const DEFAULT_SEMESTER_COUNT: i64 = 8;

/// 满足度计算是否把 SUBMITTED/DRAFT 计入"预计"口径
pub const KEY_COUNT_PROJECTED: &str = "count_projected";
pub const DEFAULT_COUNT_PROJECTED: bool = true;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置值
    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 学期学分下限
    pub fn get_min_load_credits(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(KEY_MIN_LOAD_CREDITS)? {
            Some(v) => Ok(v.parse::<f64>()?),
            None => Ok(DEFAULT_MIN_LOAD_CREDITS),
        }
    }

    /// 学期学分上限
    pub fn get_max_load_credits(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(KEY_MAX_LOAD_CREDITS)? {
            Some(v) => Ok(v.parse::<f64>()?),
            None => Ok(DEFAULT_MAX_LOAD_CREDITS),
        }
    }

    /// 默认草稿播种学期数
    pub fn get_default_semester_count(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(KEY_DEFAULT_SEMESTER_COUNT)? {
            Some(v) => Ok(v.parse::<i64>()?),
            None => Ok(DEFAULT_SEMESTER_COUNT),
        }
    }

    /// 是否在满足度计算中上报"预计"口径 (SUBMITTED/DRAFT)
    pub fn get_count_projected(&self) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(KEY_COUNT_PROJECTED)? {
            Some(v) => Ok(v == "true" || v == "1"),
            None => Ok(DEFAULT_COUNT_PROJECTED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn make_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_without_rows() {
        let mgr = make_manager();
        assert_eq!(mgr.get_min_load_credits().unwrap(), DEFAULT_MIN_LOAD_CREDITS);
        assert_eq!(mgr.get_max_load_credits().unwrap(), DEFAULT_MAX_LOAD_CREDITS);
        assert_eq!(mgr.get_default_semester_count().unwrap(), DEFAULT_SEMESTER_COUNT);
        assert!(mgr.get_count_projected().unwrap());
    }

    #[test]
    fn test_set_and_override() {
        let mgr = make_manager();
        mgr.set_config(KEY_MAX_LOAD_CREDITS, "21").unwrap();
        mgr.set_config(KEY_COUNT_PROJECTED, "false").unwrap();

        assert_eq!(mgr.get_max_load_credits().unwrap(), 21.0);
        assert!(!mgr.get_count_projected().unwrap());

        // 覆写同键
        mgr.set_config(KEY_MAX_LOAD_CREDITS, "19").unwrap();
        assert_eq!(mgr.get_max_load_credits().unwrap(), 19.0);
    }
}
