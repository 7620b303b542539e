// ==========================================
// 三战同盟助手 - 地图资源仓储
// ==========================================
// 职责: 资源点目录的读取与全量覆盖式同步
// 红线: Repository 不做业务逻辑，只做数据映射
// ==========================================

use crate::domain::coord::HexCoord;
use crate::domain::resource::ResourcePoint;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// MapResourceRow - 同步写入行
// ==========================================

/// 地图资源同步的写入行（来自地图 CSV 解析）
///
/// 坐标保持为原始整数，范围校验属于引擎层关心的事。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapResourceRow {
    pub scenario: String,
    pub prefecture: String,
    pub resource_level: String,
    pub coord_x: i64,
    pub coord_y: i64,
    pub source_file: String,
}

// ==========================================
// MapResourceRepository - 地图资源仓储
// ==========================================
pub struct MapResourceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MapResourceRepository {
    /// 创建新的地图资源仓储
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
    // 读取操作
    // ==========================================

    /// 加载某赛季的全部资源点
    ///
    /// 坐标列损坏（非整数/超出表示范围）的行将被跳过并记录告警，
    /// 不影响整次查询。空结果不是错误，由调用方判定"无数据"。
    ///
    /// # 参数
    /// - `scenario`: 赛季数据集名称
    ///
    /// # 返回
    /// - Ok(points): 该赛季的资源点列表（目录顺序 = 主键顺序）
    pub fn load_by_scenario(&self, scenario: &str) -> RepositoryResult<Vec<ResourcePoint>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT prefecture, resource_level, coord_x, coord_y
            FROM map_resources
            WHERE scenario = ?1
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![scenario], |row| {
            let prefecture: String = row.get(0)?;
            let resource_level: String = row.get(1)?;
            // 坐标按动态值读取，损坏数据不让整个查询失败
            let x_val: Value = row.get(2)?;
            let y_val: Value = row.get(3)?;
            Ok((prefecture, resource_level, x_val, y_val))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (prefecture, resource_level, x_val, y_val) = row?;
            match (extract_coord(&x_val), extract_coord(&y_val)) {
                (Some(x), Some(y)) => {
                    points.push(ResourcePoint::new(
                        scenario,
                        prefecture,
                        resource_level,
                        HexCoord::new(x, y),
                    ));
                }
                _ => {
                    warn!(
                        scenario = scenario,
                        prefecture = %prefecture,
                        "跳过坐标损坏的资源点: x={:?}, y={:?}",
                        x_val,
                        y_val
                    );
                }
            }
        }

        Ok(points)
    }

    /// 列出所有已同步的赛季名称（去重，字典序）
    pub fn list_scenarios(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT DISTINCT scenario FROM map_resources ORDER BY scenario ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut scenarios = Vec::new();
        for row in rows {
            scenarios.push(row?);
        }
        Ok(scenarios)
    }

    /// 某赛季的资源点数量
    pub fn count_by_scenario(&self, scenario: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM map_resources WHERE scenario = ?1",
            params![scenario],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 全量覆盖式同步：清空整表后批量写入
    ///
    /// 与外部同步脚本语义一致：不做增量更新、不做版本管理。
    ///
    /// # 返回
    /// - Ok(count): 写入的行数
    pub fn replace_all(&self, rows: &[MapResourceRow]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM map_resources", [])?;

        let mut count = 0;
        for row in rows {
            tx.execute(
                r#"
                INSERT INTO map_resources (
                    scenario, prefecture, resource_level, coord_x, coord_y, source_file
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    row.scenario,
                    row.prefecture,
                    row.resource_level,
                    row.coord_x,
                    row.coord_y,
                    row.source_file,
                ],
            )?;
            count += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }
}

/// 从动态列值中提取可用坐标
fn extract_coord(value: &Value) -> Option<i32> {
    match value {
        Value::Integer(v) => i32::try_from(*v).ok(),
        // TEXT 列里偶见 "520" 这类可挽救的值，其余一律放弃
        Value::Text(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_repo() -> MapResourceRepository {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        MapResourceRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn sample_row(scenario: &str, prefecture: &str, level: &str, x: i64, y: i64) -> MapResourceRow {
        MapResourceRow {
            scenario: scenario.to_string(),
            prefecture: prefecture.to_string(),
            resource_level: level.to_string(),
            coord_x: x,
            coord_y: y,
            source_file: format!("{}.csv", scenario),
        }
    }

    #[test]
    fn test_replace_all_and_load() {
        let repo = test_repo();

        let rows = vec![
            sample_row("S1", "甲郡", "8铜", 520, 880),
            sample_row("S1", "乙郡", "9铜", 700, 900),
            sample_row("S2", "丙郡", "10铜", 100, 100),
        ];
        assert_eq!(repo.replace_all(&rows).unwrap(), 3);

        let s1 = repo.load_by_scenario("S1").unwrap();
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].prefecture, "甲郡");
        assert_eq!(s1[0].coord, HexCoord::new(520, 880));

        // 未同步的赛季为空列表而非错误
        let missing = repo.load_by_scenario("S9").unwrap();
        assert!(missing.is_empty());

        // 再次全量同步会覆盖旧数据
        let rows2 = vec![sample_row("S3", "丁郡", "8铜", 1, 1)];
        repo.replace_all(&rows2).unwrap();
        assert!(repo.load_by_scenario("S1").unwrap().is_empty());
        assert_eq!(repo.load_by_scenario("S3").unwrap().len(), 1);
    }

    #[test]
    fn test_list_scenarios() {
        let repo = test_repo();
        let rows = vec![
            sample_row("S2", "甲郡", "8铜", 1, 1),
            sample_row("S1", "甲郡", "8铜", 2, 2),
            sample_row("S1", "乙郡", "9铜", 3, 3),
        ];
        repo.replace_all(&rows).unwrap();

        assert_eq!(repo.list_scenarios().unwrap(), vec!["S1", "S2"]);
        assert_eq!(repo.count_by_scenario("S1").unwrap(), 2);
    }

    #[test]
    fn test_malformed_coordinate_row_is_skipped() {
        let repo = test_repo();
        {
            let conn = repo.conn.lock().unwrap();
            // SQLite 动态类型允许往 INTEGER 列塞文本，模拟脏数据
            conn.execute(
                "INSERT INTO map_resources (scenario, prefecture, resource_level, coord_x, coord_y) VALUES ('S1','甲郡','8铜','油污',880)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO map_resources (scenario, prefecture, resource_level, coord_x, coord_y) VALUES ('S1','甲郡','8铜',520,880)",
                [],
            )
            .unwrap();
        }

        let points = repo.load_by_scenario("S1").unwrap();
        // 脏行被跳过，好行保留
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].coord, HexCoord::new(520, 880));
    }

    #[test]
    fn test_text_integer_coordinate_is_salvaged() {
        let repo = test_repo();
        {
            let conn = repo.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO map_resources (scenario, prefecture, resource_level, coord_x, coord_y) VALUES ('S1','甲郡','8铜','520','880')",
                [],
            )
            .unwrap();
        }

        let points = repo.load_by_scenario("S1").unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].coord, HexCoord::new(520, 880));
    }
}
