// ==========================================
// 三战同盟助手 - 同盟统计上传仓储
// ==========================================
// 职责: 用户/上传记录/成员明细的数据访问
// 约束: 同一用户同一导出时间的上传唯一
// ==========================================

use crate::domain::member::{MemberSnapshotRow, SnapshotMeta};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 时间戳的落库格式
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// UploadSummary - 上传记录概要
// ==========================================

/// 上传记录概要（列表展示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub id: i64,
    pub ts: NaiveDateTime,
    pub member_count: i64,
}

// ==========================================
// UploadRepository - 上传仓储
// ==========================================
pub struct UploadRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UploadRepository {
    /// 创建新的上传仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 用户
    // ==========================================

    /// 确保用户存在（首次出现时落库）
    pub fn ensure_user(&self, openid: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (openid) VALUES (?1)",
            params![openid],
        )?;
        Ok(())
    }

    // ==========================================
    // 上传记录
    // ==========================================

    /// 写入一次上传及其全部成员明细（单事务）
    ///
    /// # 参数
    /// - `user_openid`: 上传用户
    /// - `ts`: 导出时间（来自文件名）
    /// - `members`: 成员明细，不允许为空
    ///
    /// # 返回
    /// - Ok(upload_id): 新上传记录的主键
    pub fn insert_upload_with_members(
        &self,
        user_openid: &str,
        ts: NaiveDateTime,
        members: &[MemberSnapshotRow],
    ) -> RepositoryResult<i64> {
        if members.is_empty() {
            return Err(RepositoryError::ValidationError(
                "成员数据为空，无法插入".to_string(),
            ));
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO uploads (user_openid, ts, member_count) VALUES (?1, ?2, ?3)",
            params![
                user_openid,
                ts.format(TS_FORMAT).to_string(),
                members.len() as i64
            ],
        )?;
        let upload_id = tx.last_insert_rowid();

        for m in members {
            tx.execute(
                r#"
                INSERT INTO upload_members (
                    upload_id, member_name, contrib_rank, contrib_total, battle_total,
                    assist_total, donate_total, power_value, group_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    upload_id,
                    m.member_name,
                    m.contrib_rank,
                    m.contrib_total,
                    m.battle_total,
                    m.assist_total,
                    m.donate_total,
                    m.power_value,
                    m.group_name,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(upload_id)
    }

    /// 检查同一用户同一导出时间的上传是否已存在
    pub fn upload_exists(&self, user_openid: &str, ts: NaiveDateTime) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM uploads WHERE user_openid = ?1 AND ts = ?2 LIMIT 1",
                params![user_openid, ts.format(TS_FORMAT).to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 列出用户的上传记录（导出时间倒序）
    pub fn list_uploads_by_user(&self, user_openid: &str) -> RepositoryResult<Vec<UploadSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, ts, member_count FROM uploads WHERE user_openid = ?1 ORDER BY ts DESC",
        )?;
        let rows = stmt.query_map(params![user_openid], |row| {
            let id: i64 = row.get(0)?;
            let ts_text: String = row.get(1)?;
            let member_count: i64 = row.get(2)?;
            Ok((id, ts_text, member_count))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, ts_text, member_count) = row?;
            let ts = NaiveDateTime::parse_from_str(&ts_text, TS_FORMAT).map_err(|e| {
                RepositoryError::ValidationError(format!("上传时间戳损坏: {} ({})", ts_text, e))
            })?;
            summaries.push(UploadSummary {
                id,
                ts,
                member_count,
            });
        }
        Ok(summaries)
    }

    /// 读取用户的某次上传及其成员明细
    ///
    /// # 返回
    /// - Ok(Some((meta, members))): 上传存在且归属该用户
    /// - Ok(None): 不存在或不属于该用户
    pub fn get_upload_with_members(
        &self,
        user_openid: &str,
        upload_id: i64,
    ) -> RepositoryResult<Option<(SnapshotMeta, Vec<MemberSnapshotRow>)>> {
        let conn = self.get_conn()?;

        let meta: Option<(String, i64)> = conn
            .query_row(
                "SELECT ts, member_count FROM uploads WHERE id = ?1 AND user_openid = ?2 LIMIT 1",
                params![upload_id, user_openid],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (ts_text, member_count) = match meta {
            Some(v) => v,
            None => return Ok(None),
        };
        let ts = NaiveDateTime::parse_from_str(&ts_text, TS_FORMAT).map_err(|e| {
            RepositoryError::ValidationError(format!("上传时间戳损坏: {} ({})", ts_text, e))
        })?;

        let mut stmt = conn.prepare(
            r#"
            SELECT member_name, contrib_rank, contrib_total, battle_total,
                   assist_total, donate_total, power_value, group_name
            FROM upload_members
            WHERE upload_id = ?1
            ORDER BY battle_total DESC, member_name ASC
            "#,
        )?;
        let rows = stmt.query_map(params![upload_id], |row| {
            Ok(MemberSnapshotRow {
                member_name: row.get(0)?,
                contrib_rank: row.get(1)?,
                contrib_total: row.get(2)?,
                battle_total: row.get(3)?,
                assist_total: row.get(4)?,
                donate_total: row.get(5)?,
                power_value: row.get(6)?,
                group_name: row.get(7)?,
            })
        })?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }

        Ok(Some((
            SnapshotMeta { ts, member_count },
            members,
        )))
    }

    /// 删除用户的某次上传（成员明细级联删除）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在或不属于该用户
    pub fn delete_upload_by_id(
        &self,
        user_openid: &str,
        upload_id: i64,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM uploads WHERE id = ?1 AND user_openid = ?2",
            params![upload_id, user_openid],
        )?;
        Ok(affected > 0)
    }

    /// 查询某成员在该用户全部上传中的历史明细（导出时间升序）
    pub fn get_member_history(
        &self,
        user_openid: &str,
        member_name: &str,
    ) -> RepositoryResult<Vec<(NaiveDateTime, MemberSnapshotRow)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.ts,
                   m.member_name, m.contrib_rank, m.contrib_total, m.battle_total,
                   m.assist_total, m.donate_total, m.power_value, m.group_name
            FROM uploads AS u
            JOIN upload_members AS m ON m.upload_id = u.id
            WHERE u.user_openid = ?1 AND m.member_name = ?2
            ORDER BY u.ts ASC, u.id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![user_openid, member_name], |row| {
            let ts_text: String = row.get(0)?;
            let member = MemberSnapshotRow {
                member_name: row.get(1)?,
                contrib_rank: row.get(2)?,
                contrib_total: row.get(3)?,
                battle_total: row.get(4)?,
                assist_total: row.get(5)?,
                donate_total: row.get(6)?,
                power_value: row.get(7)?,
                group_name: row.get(8)?,
            };
            Ok((ts_text, member))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (ts_text, member) = row?;
            let ts = NaiveDateTime::parse_from_str(&ts_text, TS_FORMAT).map_err(|e| {
                RepositoryError::ValidationError(format!("上传时间戳损坏: {} ({})", ts_text, e))
            })?;
            history.push((ts, member));
        }
        Ok(history)
    }
}
