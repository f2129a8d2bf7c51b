// ==========================================
// 生产订单排产系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库 (测试/演示)
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化排产方案相关表结构 (幂等)
pub fn init_schedule_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schedule (
            schedule_id   TEXT PRIMARY KEY,
            period_start  TEXT NOT NULL,
            period_end    TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'DRAFT',
            version       INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_entry (
            schedule_id    TEXT NOT NULL REFERENCES schedule(schedule_id) ON DELETE CASCADE,
            work_order_id  TEXT NOT NULL,
            work_center_id TEXT NOT NULL,
            start_time     TEXT NOT NULL,
            end_time       TEXT NOT NULL,
            duration_hours REAL NOT NULL,
            setup_hours    REAL NOT NULL DEFAULT 0,
            seq_no         INTEGER NOT NULL,
            PRIMARY KEY (schedule_id, work_order_id)
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_entry_center
            ON schedule_entry(schedule_id, work_center_id, seq_no);

        CREATE TABLE IF NOT EXISTS schedule_conflict (
            schedule_id TEXT NOT NULL REFERENCES schedule(schedule_id) ON DELETE CASCADE,
            kind        TEXT NOT NULL,
            subject     TEXT NOT NULL,
            severity    TEXT NOT NULL,
            message     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_conflict_severity
            ON schedule_conflict(schedule_id, severity);
        "#,
    )
}
