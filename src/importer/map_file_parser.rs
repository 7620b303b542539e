// ==========================================
// 三战同盟助手 - 地图资源 CSV 解析
// ==========================================
// 输入: 一个目录下的若干地图 CSV（文件名即赛季名）
// 必要列: 所属郡 / 等级 / X / Y
// 语义: 字段缺失或坐标非数字的行跳过并计数；
//       缺列或读取失败的文件记入错误列表；两者都不中断整个扫描
// ==========================================

use crate::repository::map_resource_repo::MapResourceRow;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// 地图 CSV 扫描统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapParseStats {
    pub file_count: usize,
    pub row_count: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// 扫描目录下的全部地图 CSV
///
/// # 参数
/// - `maps_dir`: 存放地图 CSV 的目录
///
/// # 返回
/// - Ok((rows, stats)): 可写入仓储的行与扫描统计
pub fn parse_maps_dir(maps_dir: &Path) -> anyhow::Result<(Vec<MapResourceRow>, MapParseStats)> {
    let mut rows: Vec<MapResourceRow> = Vec::new();
    let mut stats = MapParseStats::default();

    // 文件名排序保证扫描顺序稳定
    let mut csv_paths: Vec<_> = std::fs::read_dir(maps_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    csv_paths.sort();

    for path in csv_paths {
        stats.file_count += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let scenario = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Err(message) = parse_one_map_file(&path, &scenario, &file_name, &mut rows, &mut stats)
        {
            warn!("地图文件解析失败: {}", message);
            stats.errors.push(message);
        }
    }

    Ok((rows, stats))
}

/// 解析单个地图 CSV，行级问题记入 stats，文件级问题返回 Err
fn parse_one_map_file(
    path: &Path,
    scenario: &str,
    file_name: &str,
    rows: &mut Vec<MapResourceRow>,
    stats: &mut MapParseStats,
) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("读取失败 {}: {}", file_name, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("读取失败 {}: {}", file_name, e))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let (prefecture_idx, level_idx, x_idx, y_idx) =
        match (find("所属郡"), find("等级"), find("X"), find("Y")) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return Err(format!("缺少必要列 {}", file_name)),
        };

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                stats.skipped += 1;
                continue;
            }
        };

        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let prefecture = field(prefecture_idx);
        let resource_level = field(level_idx);
        let x_raw = field(x_idx);
        let y_raw = field(y_idx);

        if prefecture.is_empty() || resource_level.is_empty() || x_raw.is_empty() || y_raw.is_empty()
        {
            stats.skipped += 1;
            continue;
        }

        // 源表中的坐标偶见 "520.0" 形态，按截断取整
        let (coord_x, coord_y) = match (parse_coord_cell(&x_raw), parse_coord_cell(&y_raw)) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                stats.skipped += 1;
                continue;
            }
        };

        rows.push(MapResourceRow {
            scenario: scenario.to_string(),
            prefecture,
            resource_level,
            coord_x,
            coord_y,
            source_file: file_name.to_string(),
        });
        stats.row_count += 1;
    }

    Ok(())
}

/// 坐标单元格解析：整数或可截断的小数
fn parse_coord_cell(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    raw.parse::<f64>().ok().map(|v| v.trunc() as i64)
}
