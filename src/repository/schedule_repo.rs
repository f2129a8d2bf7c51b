// ==========================================
// 生产订单排产系统 - 排产方案仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: PUBLISHED 方案不可变,发布闸门在事务内判定
// 并发控制: version 字段乐观锁,比较-交换由 UPDATE ... WHERE version = ? 完成
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::domain::schedule::{Schedule, ScheduleEntry, SchedulePeriod};
use crate::domain::types::{ConflictKind, ConflictSeverity, ScheduleStatus};
use crate::engine::conflict::{Conflict, ConflictReport};
use crate::repository::error::{RepositoryError, RepositoryResult};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ScheduleRepository - 排产方案仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 创建新的ScheduleRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存草稿 (插入或乐观锁更新)
    ///
    /// 条目与冲突随方案整体替换,三张表在同一事务内完成。
    ///
    /// # 返回
    /// - `Ok(version)`: 保存后的版本号 (新建返回 schedule.version,覆盖返回 +1)
    ///
    /// # 错误
    /// - `OptimisticLockFailure`: version 不匹配 (其他会话已覆盖)
    /// - `InvalidStateTransition`: 目标方案已发布,不可覆盖
    pub fn save_draft(
        &self,
        schedule: &Schedule,
        conflicts: &ConflictReport,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let existing: Option<(String, i32)> = match tx.query_row(
            "SELECT status, version FROM schedule WHERE schedule_id = ?",
            params![&schedule.id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?)),
        ) {
            Ok(pair) => Some(pair),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let new_version = match existing {
            None => {
                tx.execute(
                    r#"INSERT INTO schedule (
                        schedule_id, period_start, period_end, status, version,
                        created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                    params![
                        &schedule.id,
                        &schedule.period.start.format(DATE_FMT).to_string(),
                        &schedule.period.end.format(DATE_FMT).to_string(),
                        ScheduleStatus::Draft.to_db_str(),
                        &schedule.version,
                        &schedule.created_at.format(DATETIME_FMT).to_string(),
                        &schedule.updated_at.format(DATETIME_FMT).to_string(),
                    ],
                )?;
                schedule.version
            }
            Some((status, actual_version)) => {
                if status != ScheduleStatus::Draft.to_db_str() {
                    return Err(RepositoryError::InvalidStateTransition {
                        schedule_id: schedule.id.clone(),
                        from: status,
                        to: ScheduleStatus::Draft.to_db_str().to_string(),
                    });
                }
                let rows_affected = tx.execute(
                    r#"UPDATE schedule
                       SET period_start = ?, period_end = ?, version = version + 1,
                           updated_at = ?
                       WHERE schedule_id = ? AND version = ?"#,
                    params![
                        &schedule.period.start.format(DATE_FMT).to_string(),
                        &schedule.period.end.format(DATE_FMT).to_string(),
                        &schedule.updated_at.format(DATETIME_FMT).to_string(),
                        &schedule.id,
                        &schedule.version,
                    ],
                )?;
                if rows_affected == 0 {
                    warn!(
                        schedule_id = %schedule.id,
                        expected = schedule.version,
                        actual = actual_version,
                        "乐观锁冲突,放弃覆盖"
                    );
                    return Err(RepositoryError::OptimisticLockFailure {
                        schedule_id: schedule.id.clone(),
                        expected: schedule.version,
                        actual: actual_version,
                    });
                }
                schedule.version + 1
            }
        };

        // 条目与冲突整体替换
        tx.execute(
            "DELETE FROM schedule_entry WHERE schedule_id = ?",
            params![&schedule.id],
        )?;
        for entry in &schedule.entries {
            tx.execute(
                r#"INSERT INTO schedule_entry (
                    schedule_id, work_order_id, work_center_id,
                    start_time, end_time, duration_hours, setup_hours, seq_no
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &schedule.id,
                    &entry.work_order_id,
                    &entry.work_center_id,
                    &entry.start.format(DATETIME_FMT).to_string(),
                    &entry.end.format(DATETIME_FMT).to_string(),
                    &entry.duration_hours,
                    &entry.setup_hours,
                    &entry.seq_no,
                ],
            )?;
        }

        tx.execute(
            "DELETE FROM schedule_conflict WHERE schedule_id = ?",
            params![&schedule.id],
        )?;
        for conflict in conflicts.iter() {
            tx.execute(
                r#"INSERT INTO schedule_conflict (
                    schedule_id, kind, subject, severity, message
                ) VALUES (?, ?, ?, ?, ?)"#,
                params![
                    &schedule.id,
                    conflict.kind.to_db_str(),
                    &conflict.subject,
                    conflict.severity.to_db_str(),
                    &conflict.message,
                ],
            )?;
        }

        tx.commit()?;
        info!(
            schedule_id = %schedule.id,
            version = new_version,
            entries = schedule.entries.len(),
            conflicts = conflicts.len(),
            "草稿已保存"
        );
        Ok(new_version)
    }

    /// 发布方案
    ///
    /// 发布闸门: 方案存在阻断级冲突时拒绝 (除非 override_blocking 显式放行)。
    /// 状态读取、冲突计数与状态变更在同一事务内完成,跨进程一致。
    ///
    /// # 返回
    /// - `Ok(version)`: 发布后的版本号
    ///
    /// # 错误
    /// - `NotFound`: 方案不存在
    /// - `InvalidStateTransition`: 方案已发布 (PUBLISHED 为终态)
    /// - `OptimisticLockFailure`: version 不匹配
    /// - `PublishBlocked`: 存在阻断级冲突且未放行
    pub fn publish(
        &self,
        schedule_id: &str,
        expected_version: i32,
        override_blocking: bool,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let (status, actual_version): (String, i32) = match tx.query_row(
            "SELECT status, version FROM schedule WHERE schedule_id = ?",
            params![schedule_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ) {
            Ok(pair) => pair,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Schedule".to_string(),
                    id: schedule_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if status != ScheduleStatus::Draft.to_db_str() {
            return Err(RepositoryError::InvalidStateTransition {
                schedule_id: schedule_id.to_string(),
                from: status,
                to: ScheduleStatus::Published.to_db_str().to_string(),
            });
        }
        if actual_version != expected_version {
            return Err(RepositoryError::OptimisticLockFailure {
                schedule_id: schedule_id.to_string(),
                expected: expected_version,
                actual: actual_version,
            });
        }

        let blocking_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM schedule_conflict WHERE schedule_id = ? AND severity = ?",
            params![schedule_id, ConflictSeverity::Blocking.to_db_str()],
            |row| row.get(0),
        )?;
        if blocking_count > 0 && !override_blocking {
            return Err(RepositoryError::PublishBlocked {
                schedule_id: schedule_id.to_string(),
                blocking_count: blocking_count as usize,
            });
        }

        tx.execute(
            r#"UPDATE schedule
               SET status = ?, version = version + 1, updated_at = ?
               WHERE schedule_id = ? AND version = ?"#,
            params![
                ScheduleStatus::Published.to_db_str(),
                chrono::Utc::now().naive_utc().format(DATETIME_FMT).to_string(),
                schedule_id,
                expected_version,
            ],
        )?;

        tx.commit()?;
        info!(
            schedule_id = %schedule_id,
            version = expected_version + 1,
            override_blocking,
            blocking_count,
            "方案已发布"
        );
        Ok(expected_version + 1)
    }

    /// 按schedule_id查询方案 (含条目)
    ///
    /// # 返回
    /// - `Ok(Some(Schedule))`: 找到方案
    /// - `Ok(None)`: 未找到方案
    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<Schedule>> {
        let conn = self.get_conn()?;

        let head = match conn.query_row(
            r#"SELECT schedule_id, period_start, period_end, status, version,
                      created_at, updated_at
               FROM schedule
               WHERE schedule_id = ?"#,
            params![schedule_id],
            |row| self.map_schedule_row(row),
        ) {
            Ok(schedule) => schedule,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            r#"SELECT work_order_id, work_center_id, start_time, end_time,
                      duration_hours, setup_hours, seq_no
               FROM schedule_entry
               WHERE schedule_id = ?
               ORDER BY work_center_id, seq_no"#,
        )?;
        let entries = stmt
            .query_map(params![schedule_id], |row| self.map_entry_row(row))?
            .collect::<Result<Vec<ScheduleEntry>, _>>()?;

        Ok(Some(Schedule { entries, ..head }))
    }

    /// 查询方案的冲突报告 (严重度降序)
    pub fn find_conflicts(&self, schedule_id: &str) -> RepositoryResult<ConflictReport> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT kind, subject, severity, message
               FROM schedule_conflict
               WHERE schedule_id = ?"#,
        )?;
        let conflicts = stmt
            .query_map(params![schedule_id], |row| self.map_conflict_row(row))?
            .collect::<Result<Vec<Conflict>, _>>()?;

        let mut report = ConflictReport::from(conflicts);
        report.sort();
        Ok(report)
    }

    /// 查询所有方案 (不含条目,按created_at降序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Schedule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT schedule_id, period_start, period_end, status, version,
                      created_at, updated_at
               FROM schedule
               ORDER BY created_at DESC"#,
        )?;
        let schedules = stmt
            .query_map([], |row| self.map_schedule_row(row))?
            .collect::<Result<Vec<Schedule>, _>>()?;

        Ok(schedules)
    }

    /// 删除草稿方案
    ///
    /// # 错误
    /// - `InvalidStateTransition`: 已发布方案不可删除
    pub fn delete_draft(&self, schedule_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let status: String = match tx.query_row(
            "SELECT status FROM schedule WHERE schedule_id = ?",
            params![schedule_id],
            |row| row.get(0),
        ) {
            Ok(status) => status,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "Schedule".to_string(),
                    id: schedule_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if status != ScheduleStatus::Draft.to_db_str() {
            return Err(RepositoryError::InvalidStateTransition {
                schedule_id: schedule_id.to_string(),
                from: status,
                to: "DELETED".to_string(),
            });
        }

        tx.execute("DELETE FROM schedule_entry WHERE schedule_id = ?", params![schedule_id])?;
        tx.execute("DELETE FROM schedule_conflict WHERE schedule_id = ?", params![schedule_id])?;
        tx.execute("DELETE FROM schedule WHERE schedule_id = ?", params![schedule_id])?;

        tx.commit()?;
        Ok(())
    }

    /// 映射数据库行到Schedule对象 (条目由调用方补齐)
    fn map_schedule_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Schedule> {
        let status_str: String = row.get(3)?;
        let status = ScheduleStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("未知方案状态: {}", status_str).into(),
            )
        })?;
        Ok(Schedule {
            id: row.get(0)?,
            period: SchedulePeriod::new(
                parse_date(row, 1)?,
                parse_date(row, 2)?,
            ),
            entries: Vec::new(),
            status,
            version: row.get(4)?,
            created_at: parse_datetime(row, 5)?,
            updated_at: parse_datetime(row, 6)?,
        })
    }

    fn map_entry_row(&self, row: &rusqlite::Row) -> rusqlite::Result<ScheduleEntry> {
        Ok(ScheduleEntry {
            work_order_id: row.get(0)?,
            work_center_id: row.get(1)?,
            start: parse_datetime(row, 2)?,
            end: parse_datetime(row, 3)?,
            duration_hours: row.get(4)?,
            setup_hours: row.get(5)?,
            seq_no: row.get(6)?,
        })
    }

    fn map_conflict_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Conflict> {
        let kind_str: String = row.get(0)?;
        let severity_str: String = row.get(2)?;
        Ok(Conflict {
            kind: ConflictKind::from_db_str(&kind_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("未知冲突类型: {}", kind_str).into(),
                )
            })?,
            subject: row.get(1)?,
            severity: ConflictSeverity::from_db_str(&severity_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    format!("未知冲突严重度: {}", severity_str).into(),
                )
            })?,
            message: row.get(3)?,
        })
    }
}

fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let s: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&s, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
