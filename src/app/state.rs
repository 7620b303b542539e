// ==========================================
// 三战同盟助手 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::messenger::Messenger;
use crate::api::{AnalysisApi, RadarApi, RelocationApi};
use crate::app::session::InteractionStore;
use crate::config::{PlannerConfig, RadarConfig};
use crate::db;
use crate::engine::radar::RadarEngine;
use crate::engine::relocation::RelocationPlanner;
use crate::repository::map_resource_repo::MapResourceRepository;
use crate::repository::upload_repo::UploadRepository;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 周边资源查询API
    pub radar_api: Arc<RadarApi>,

    /// 迁城测算API
    pub relocation_api: Arc<RelocationApi>,

    /// 同盟数据对比API
    pub analysis_api: Arc<AnalysisApi>,

    /// 地图资源仓储（用于同步命令）
    pub map_resource_repo: Arc<MapResourceRepository>,

    /// 上传仓储（用于上传管理）
    pub upload_repo: Arc<UploadRepository>,

    /// 用户交互会话存储
    pub sessions: Arc<InteractionStore>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - messenger: 消息通知通道（由聊天接入层提供）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库连接并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String, messenger: Arc<dyn Messenger>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        db::init_schema(&conn).map_err(|e| format!("无法初始化数据库schema: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let map_resource_repo = Arc::new(MapResourceRepository::new(conn.clone()));
        let upload_repo = Arc::new(UploadRepository::new(conn));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let radar_engine = RadarEngine::new(RadarConfig::default());
        let planner = Arc::new(RelocationPlanner::new(PlannerConfig::default()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let sessions = Arc::new(InteractionStore::new());

        let radar_api = Arc::new(RadarApi::new(map_resource_repo.clone(), radar_engine));
        let relocation_api = Arc::new(RelocationApi::new(
            map_resource_repo.clone(),
            sessions.clone(),
            messenger.clone(),
            planner,
        ));
        let analysis_api = Arc::new(AnalysisApi::new(upload_repo.clone(), messenger));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            radar_api,
            relocation_api,
            analysis_api,
            map_resource_repo,
            upload_repo,
            sessions,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::messenger::NoOpMessenger;

    #[test]
    fn test_app_state_wires_up_on_fresh_db() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("sanbot.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone(), Arc::new(NoOpMessenger)).unwrap();
        assert_eq!(state.get_db_path(), db_path);
        // 新库上赛季列表为空
        assert!(state.map_resource_repo.list_scenarios().unwrap().is_empty());
    }
}
