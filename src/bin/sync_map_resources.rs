// ==========================================
// 三战同盟助手 - 地图资源全量同步
// ==========================================
// 用法: sync-map-resources [--dry-run] [maps目录]
// 语义: 解析目录下全部地图 CSV 后清空 map_resources 并整体重写；
//       不做增量，不做版本管理
// 退出码: 0 成功 / 1 目录无效 / 2 无可同步数据
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use sanbot::config::get_default_db_path;
use sanbot::importer::parse_maps_dir;
use sanbot::repository::MapResourceRepository;
use sanbot::{db, logging};

fn main() -> ExitCode {
    logging::init();

    // 参数: 可选 --dry-run 与 maps 目录（默认 ./maps）
    let mut dry_run = false;
    let mut maps_dir = PathBuf::from("./maps");
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            other => maps_dir = PathBuf::from(other),
        }
    }

    if !maps_dir.is_dir() {
        tracing::error!("maps 目录不存在: {}", maps_dir.display());
        return ExitCode::from(1);
    }

    let (rows, stats) = match parse_maps_dir(&maps_dir) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("扫描 maps 目录失败: {}", e);
            return ExitCode::from(1);
        }
    };

    for message in &stats.errors {
        tracing::error!("{}", message);
    }
    tracing::info!(
        "解析完成: {} 个文件，{} 行有效，跳过 {} 行",
        stats.file_count,
        stats.row_count,
        stats.skipped
    );

    if rows.is_empty() {
        tracing::warn!("没有可同步的数据");
        return ExitCode::from(2);
    }

    if dry_run {
        tracing::info!("dry-run 模式，跳过数据库写入");
        return ExitCode::SUCCESS;
    }

    let db_path = get_default_db_path();
    let conn = match db::open_sqlite_connection(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("无法打开数据库 {}: {}", db_path, e);
            return ExitCode::from(1);
        }
    };
    if let Err(e) = db::init_schema(&conn) {
        tracing::error!("初始化数据库schema失败: {}", e);
        return ExitCode::from(1);
    }

    let repo = MapResourceRepository::new(Arc::new(Mutex::new(conn)));
    match repo.replace_all(&rows) {
        Ok(count) => {
            tracing::info!("已同步 {} 行到 map_resources（{}）", count, db_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("同步失败: {}", e);
            ExitCode::from(1)
        }
    }
}
