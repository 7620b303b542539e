// ==========================================
// 地图查询 API 集成测试
// ==========================================
// 覆盖: 找铜交互流程 / single-flight / 重试预算 / 雷达查询
// 手法: 用可拦截的假消息通道控制后台任务的完成时机
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sanbot::api::{ApiError, Messenger, RadarApi, RelocationApi};
use sanbot::app::InteractionStore;
use sanbot::config::{PlannerConfig, RadarConfig};
use sanbot::db;
use sanbot::domain::coord::HexCoord;
use sanbot::engine::{RadarEngine, RelocationPlanner};
use sanbot::repository::map_resource_repo::MapResourceRow;
use sanbot::repository::MapResourceRepository;
use tokio::sync::Notify;

// ==========================================
// 测试用消息通道
// ==========================================

/// 记录消息并可在放行前阻塞发送的假通道
struct GateMessenger {
    /// 放行信号；未放行时 send_text 挂起，测算保持"进行中"
    release: Notify,
    sent: Mutex<Vec<(String, String)>>,
}

impl GateMessenger {
    fn new() -> Self {
        Self {
            release: Notify::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for GateMessenger {
    async fn send_text(&self, user_id: &str, content: &str) {
        self.release.notified().await;
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), content.to_string()));
    }
}

// ==========================================
// 测试脚手架
// ==========================================

struct Fixture {
    relocation_api: RelocationApi,
    radar_api: RadarApi,
    sessions: Arc<InteractionStore>,
    messenger: Arc<GateMessenger>,
}

fn fixture_with_points(points: &[(String, String, i64, i64)]) -> Fixture {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    db::configure_sqlite_connection(&conn).unwrap();
    db::init_schema(&conn).unwrap();
    let repo = Arc::new(MapResourceRepository::new(Arc::new(Mutex::new(conn))));

    let rows: Vec<MapResourceRow> = points
        .iter()
        .map(|(prefecture, level, x, y)| MapResourceRow {
            scenario: "S1".to_string(),
            prefecture: prefecture.clone(),
            resource_level: level.clone(),
            coord_x: *x,
            coord_y: *y,
            source_file: "S1.csv".to_string(),
        })
        .collect();
    repo.replace_all(&rows).unwrap();

    let sessions = Arc::new(InteractionStore::new());
    let messenger = Arc::new(GateMessenger::new());
    let relocation_api = RelocationApi::new(
        repo.clone(),
        sessions.clone(),
        messenger.clone(),
        Arc::new(RelocationPlanner::new(PlannerConfig::default())),
    );
    let radar_api = RadarApi::new(repo, RadarEngine::new(RadarConfig::default()));

    Fixture {
        relocation_api,
        radar_api,
        sessions,
        messenger,
    }
}

fn default_points() -> Vec<(String, String, i64, i64)> {
    vec![
        ("甲郡".to_string(), "8铜".to_string(), 520, 880),
        ("乙郡".to_string(), "9铜".to_string(), 700, 900),
    ]
}

/// 等待在途测算结束（带超时保护）
async fn wait_until_idle(sessions: &InteractionStore, user: &str) {
    for _ in 0..200 {
        if !sessions.is_computing(user) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("computation did not finish in time");
}

// ==========================================
// 找铜流程
// ==========================================

#[tokio::test(flavor = "multi_thread")]
async fn test_happy_path_delivers_result_via_messenger() {
    let fx = fixture_with_points(&default_points());

    let prompt = fx.relocation_api.start_session("user-1", "S1").unwrap();
    assert!(prompt.contains("S1"));

    let ack = fx
        .relocation_api
        .submit_coordinate("user-1", "520,880")
        .await
        .unwrap();
    assert!(ack.contains("测算已开始"));

    // 放行后台任务并等待结束
    fx.messenger.release.notify_one();
    wait_until_idle(&fx.sessions, "user-1").await;

    let sent = fx.messenger.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "user-1");
    // 结果含归属郡与推荐坐标
    assert!(sent[0].1.contains("甲郡"));
    assert!(sent[0].1.contains("520,880"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_flight_rejects_second_submission() {
    let fx = fixture_with_points(&default_points());

    fx.relocation_api.start_session("user-1", "S1").unwrap();
    fx.relocation_api
        .submit_coordinate("user-1", "520,880")
        .await
        .unwrap();

    // 第一次测算仍在途（消息通道未放行），同一用户的新请求被拒
    fx.relocation_api.start_session("user-1", "S1").unwrap_err();
    let err = fx
        .relocation_api
        .submit_coordinate("user-1", "521,881")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ComputationInFlight));

    // 其他用户不受影响
    fx.relocation_api.start_session("user-2", "S1").unwrap();

    // 放行，确认只有一次后台计算发出了一条结果
    fx.messenger.release.notify_one();
    wait_until_idle(&fx.sessions, "user-1").await;
    assert_eq!(fx.messenger.sent_messages().len(), 1);

    // 结束后可以再次发起
    fx.relocation_api.start_session("user-1", "S1").unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validation_retry_budget_cancels_interaction() {
    let fx = fixture_with_points(&default_points());
    fx.relocation_api.start_session("user-1", "S1").unwrap();

    for attempt in 0..3 {
        let err = fx
            .relocation_api
            .submit_coordinate("user-1", "abc,def")
            .await
            .unwrap_err();
        match err {
            ApiError::InvalidCoordinate(msg) => {
                if attempt == 2 {
                    assert!(msg.contains("已取消"));
                } else {
                    assert!(msg.contains("还可重试"));
                }
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // 交互被整体取消：再提交坐标会要求先发起找铜
    let err = fx
        .relocation_api
        .submit_coordinate("user-1", "520,880")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SeasonNotConfigured));
    assert!(fx.messenger.sent_messages().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_inputs_never_crash() {
    let fx = fixture_with_points(&default_points());

    for bad in ["abc,def", "520", "520,880,900", "1501,880", "0,880"] {
        fx.relocation_api.start_session("user-1", "S1").unwrap();
        let err = fx
            .relocation_api
            .submit_coordinate("user-1", bad)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::InvalidCoordinate(_)),
            "{} should be a validation error",
            bad
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsynced_scenario_is_instructive_error() {
    let fx = fixture_with_points(&default_points());

    let err = fx.relocation_api.start_session("user-1", "S9").unwrap_err();
    match err {
        ApiError::ScenarioUnavailable { scenario } => assert_eq!(scenario, "S9"),
        other => panic!("unexpected error: {:?}", other),
    }

    // 没有发起找铜就交坐标
    let err = fx
        .relocation_api
        .submit_coordinate("user-1", "520,880")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SeasonNotConfigured));
}

// ==========================================
// 雷达查询
// ==========================================

#[tokio::test(flavor = "multi_thread")]
async fn test_radar_query_through_api() {
    let fx = fixture_with_points(&default_points());

    let report = fx
        .radar_api
        .radar_query("S1", HexCoord::new(520, 880), None)
        .unwrap();
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].distance, 0);

    // 范围外坐标
    let err = fx
        .radar_api
        .radar_query("S1", HexCoord::new(0, 880), None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidCoordinate(_)));

    // 未同步赛季
    let err = fx
        .radar_api
        .radar_query("S9", HexCoord::new(520, 880), None)
        .unwrap_err();
    assert!(matches!(err, ApiError::ScenarioUnavailable { .. }));
}
