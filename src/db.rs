// ==========================================
// 三战同盟助手 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，保证各环境 schema 一致
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
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

/// 初始化数据库 schema（幂等）
///
/// 表结构:
/// - users: 机器人用户（以聊天平台 openid 为键）
/// - uploads: 同盟统计上传记录（同一用户同一导出时间唯一）
/// - upload_members: 上传的成员明细（随上传级联删除）
/// - map_resources: 地图资源点目录（全量覆盖式同步）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            openid TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_openid TEXT NOT NULL,
            ts TEXT NOT NULL,
            member_count INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_openid, ts)
        );

        CREATE TABLE IF NOT EXISTS upload_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            upload_id INTEGER NOT NULL,
            member_name TEXT NOT NULL,
            contrib_rank INTEGER NULL,
            contrib_total INTEGER NOT NULL,
            battle_total INTEGER NOT NULL,
            assist_total INTEGER NOT NULL,
            donate_total INTEGER NOT NULL,
            power_value INTEGER NOT NULL,
            group_name TEXT NOT NULL,
            FOREIGN KEY (upload_id) REFERENCES uploads(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS map_resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scenario TEXT NOT NULL,
            prefecture TEXT NOT NULL,
            resource_level TEXT NOT NULL,
            coord_x INTEGER NOT NULL,
            coord_y INTEGER NOT NULL,
            source_file TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_map_resources_scenario
            ON map_resources(scenario);
        CREATE INDEX IF NOT EXISTS idx_upload_members_upload
            ON upload_members(upload_id);
        "#,
    )?;
    Ok(())
}
