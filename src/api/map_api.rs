// ==========================================
// 三战同盟助手 - 地图查询 API
// ==========================================
// 职责: 周边资源查询（同步）与迁城测算（后台派发）
// 并发: 迁城测算计算量大（数万候选点 x 资源点），
//       校验通过后立即派发 spawn_blocking 并先行应答，
//       结果经消息通道异步送达；同一用户同时只允许一个在途测算
// ==========================================

use std::sync::Arc;

use tokio::task;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::messenger::Messenger;
use crate::app::session::{InteractionStore, RetryOutcome};
use crate::config::MAX_COORD_ATTEMPTS;
use crate::domain::coord::{parse_coordinate_text, HexCoord};
use crate::domain::resource::RadarReport;
use crate::domain::types::RelocationRecommendation;
use crate::engine::radar::RadarEngine;
use crate::engine::relocation::RelocationPlanner;
use crate::repository::map_resource_repo::MapResourceRepository;

// ==========================================
// RadarApi - 周边资源查询
// ==========================================

/// 周边资源查询API（纯读，同步应答）
pub struct RadarApi {
    map_repo: Arc<MapResourceRepository>,
    engine: RadarEngine,
}

impl RadarApi {
    /// 创建新的RadarApi实例
    pub fn new(map_repo: Arc<MapResourceRepository>, engine: RadarEngine) -> Self {
        Self { map_repo, engine }
    }

    /// 查询目标坐标周边最近的资源点
    ///
    /// # 参数
    /// - `scenario`: 赛季名称
    /// - `target`: 目标坐标
    /// - `tier_filter`: 可选的资源等级前缀过滤（如 "8"）
    ///
    /// # 返回
    /// - Ok(RadarReport): 距离升序的查询结果
    /// - Err(ApiError::ScenarioUnavailable): 赛季未同步资源
    pub fn radar_query(
        &self,
        scenario: &str,
        target: HexCoord,
        tier_filter: Option<&str>,
    ) -> ApiResult<RadarReport> {
        if !target.in_map_range() {
            return Err(ApiError::InvalidCoordinate(format!(
                "坐标超出地图范围（1~1500）：{}",
                target
            )));
        }
        let points = self.map_repo.load_by_scenario(scenario)?;
        Ok(self.engine.search(scenario, &points, target, tier_filter)?)
    }
}

// ==========================================
// RelocationApi - 迁城测算
// ==========================================

/// 迁城测算API
///
/// 职责：
/// 1. 找铜交互的发起与坐标校验（带重试预算）
/// 2. single-flight 关卡（同一用户最多一个在途测算）
/// 3. 后台任务派发与结果通知
pub struct RelocationApi {
    map_repo: Arc<MapResourceRepository>,
    sessions: Arc<InteractionStore>,
    messenger: Arc<dyn Messenger>,
    planner: Arc<RelocationPlanner>,
}

impl RelocationApi {
    /// 创建新的RelocationApi实例
    ///
    /// # 参数
    /// - `map_repo`: 地图资源仓储
    /// - `sessions`: 用户交互会话存储
    /// - `messenger`: 消息通知通道
    /// - `planner`: 迁城测算引擎
    pub fn new(
        map_repo: Arc<MapResourceRepository>,
        sessions: Arc<InteractionStore>,
        messenger: Arc<dyn Messenger>,
        planner: Arc<RelocationPlanner>,
    ) -> Self {
        Self {
            map_repo,
            sessions,
            messenger,
            planner,
        }
    }

    /// 发起找铜：锁定赛季并提示用户回复坐标
    ///
    /// # 返回
    /// - Ok(prompt): 回给用户的提示文本
    /// - Err(ScenarioUnavailable): 赛季未同步资源，提示先同步
    /// - Err(ComputationInFlight): 该用户已有在途测算
    pub fn start_session(&self, user_id: &str, scenario: &str) -> ApiResult<String> {
        if self.sessions.is_computing(user_id) {
            return Err(ApiError::ComputationInFlight);
        }
        let count = self.map_repo.count_by_scenario(scenario)?;
        if count == 0 {
            return Err(ApiError::ScenarioUnavailable {
                scenario: scenario.to_string(),
            });
        }
        self.sessions
            .begin_prompt(user_id, scenario)
            .map_err(|_| ApiError::ComputationInFlight)?;

        Ok(format!(
            "已选择赛季「{}」，请发送目标坐标，例如：520,880（支持逗号/斜杠/空格分隔）",
            scenario
        ))
    }

    /// 提交坐标文本，校验通过后派发后台测算
    ///
    /// 校验失败计入重试预算（3 次封顶，超限取消本次找铜）；
    /// 校验通过立即应答"已开始测算"，结果由消息通道异步送达。
    ///
    /// # 返回
    /// - Ok(ack): 立即应答文本
    /// - Err(ComputationInFlight): 上一次测算未结束
    /// - Err(SeasonNotConfigured): 尚未发起找铜
    /// - Err(InvalidCoordinate): 坐标文本无效（含剩余重试次数）
    pub async fn submit_coordinate(&self, user_id: &str, text: &str) -> ApiResult<String> {
        if self.sessions.is_computing(user_id) {
            return Err(ApiError::ComputationInFlight);
        }

        let scenario = self
            .sessions
            .pending_scenario(user_id)
            .ok_or(ApiError::SeasonNotConfigured)?;

        let target = match parse_coordinate_text(text) {
            Ok(coord) => coord,
            Err(parse_err) => {
                return Err(match self.sessions.note_invalid_input(user_id) {
                    RetryOutcome::Retry { remaining } => ApiError::InvalidCoordinate(format!(
                        "{}（还可重试 {} 次）",
                        parse_err, remaining
                    )),
                    RetryOutcome::Cancelled => ApiError::InvalidCoordinate(format!(
                        "{}。连续 {} 次输入无效，本次找铜已取消，请重新发起",
                        parse_err, MAX_COORD_ATTEMPTS
                    )),
                });
            }
        };

        // single-flight 关卡：最新一次有效提交取代等待中的提示
        self.sessions
            .begin_computation(user_id)
            .map_err(|_| ApiError::ComputationInFlight)?;

        let job_id = Uuid::new_v4();
        info!(
            %job_id,
            user = %user_id,
            scenario = %scenario,
            target = %target,
            "迁城测算任务已派发"
        );
        self.dispatch_job(job_id, user_id.to_string(), scenario, target);

        Ok("收到坐标，测算已开始，完成后会单独发你结果，请稍候…".to_string())
    }

    /// 对指定赛季执行一次迁城测算（同步契约）
    ///
    /// 计算量大，调用方应放在后台任务里执行；
    /// `submit_coordinate` 的派发路径走的就是这个函数。
    pub fn plan_relocation(
        &self,
        scenario: &str,
        target: HexCoord,
    ) -> ApiResult<RelocationRecommendation> {
        run_plan(&self.map_repo, &self.planner, scenario, target)
    }

    /// 派发后台测算任务
    ///
    /// 任务运行到结束或失败为止，没有取消口；
    /// 无论结果如何都会释放 single-flight 状态。
    fn dispatch_job(&self, job_id: Uuid, user_id: String, scenario: String, target: HexCoord) {
        let map_repo = self.map_repo.clone();
        let planner = self.planner.clone();
        let sessions = self.sessions.clone();
        let messenger = self.messenger.clone();

        tokio::spawn(async move {
            let tier_label = planner.tier_label();
            let compute = {
                let scenario = scenario.clone();
                let map_repo = map_repo.clone();
                let planner = planner.clone();
                move || run_plan(&map_repo, &planner, &scenario, target)
            };

            let message = match task::spawn_blocking(compute).await {
                Ok(Ok(recommendation)) => {
                    debug!(
                        %job_id,
                        payload = %serde_json::to_string(&recommendation).unwrap_or_default(),
                        "测算结果"
                    );
                    format_recommendation(&recommendation, &tier_label)
                }
                Ok(Err(err)) => {
                    if matches!(err, ApiError::ComputationFailed(_) | ApiError::InternalError(_)) {
                        error!(
                            %job_id,
                            user = %user_id,
                            scenario = %scenario,
                            target = %target,
                            "迁城测算失败: {}",
                            err
                        );
                    }
                    err.to_string()
                }
                Err(join_err) => {
                    error!(%job_id, user = %user_id, "迁城测算任务异常退出: {}", join_err);
                    "测算过程出现异常，请稍后重试".to_string()
                }
            };

            messenger.send_text(&user_id, &message).await;
            sessions.finish_computation(&user_id);
            info!(%job_id, user = %user_id, "迁城测算任务结束");
        });
    }
}

/// 加载赛季目录并执行测算（同步路径与后台路径共用）
fn run_plan(
    map_repo: &MapResourceRepository,
    planner: &RelocationPlanner,
    scenario: &str,
    target: HexCoord,
) -> ApiResult<RelocationRecommendation> {
    let points = map_repo.load_by_scenario(scenario)?;
    if points.is_empty() {
        return Err(ApiError::ScenarioUnavailable {
            scenario: scenario.to_string(),
        });
    }
    Ok(planner.plan(&points, target)?)
}

// ==========================================
// 文本格式化
// ==========================================

/// 迁城推荐的文本回复
pub fn format_recommendation(rec: &RelocationRecommendation, tier_label: &str) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "【迁城推荐】目标 {}（{}）",
        rec.target, rec.prefecture
    ));
    lines.push(format!(
        "推荐坐标：{}（距目标 {} 格）",
        rec.best.coord, rec.best.distance_to_target
    ));
    lines.push(format!(
        "5格内{}：{} 处，20格内{}：{} 处",
        tier_label,
        rec.best.near_count,
        tier_label,
        rec.best.near_count + rec.best.far_count
    ));

    if !rec.runner_ups.is_empty() {
        let alts: Vec<String> = rec
            .runner_ups
            .iter()
            .map(|c| format!("{}（5格内 {} 处）", c.coord, c.near_count))
            .collect();
        lines.push(format!("备选：{}", alts.join("；")));
    }

    if rec.neighbors.is_empty() {
        lines.push(format!("推荐点 20 格内暂无{}资源", tier_label));
    } else {
        let preview: Vec<String> = rec
            .neighbors
            .iter()
            .take(5)
            .map(|n| format!("{}（{}格）", n.coord, n.distance))
            .collect();
        lines.push(format!(
            "周边{}共 {} 处，最近：{}",
            tier_label,
            rec.neighbors.len(),
            preview.join("、")
        ));
    }

    lines.join("\n")
}

/// 周边资源查询的文本回复
pub fn format_radar_report(report: &RadarReport) -> String {
    if report.entries.is_empty() {
        return format!("坐标 {} 周边没有符合条件的资源点", report.target);
    }
    let mut lines = vec![format!(
        "【周边资源】目标 {}（赛季「{}」，最近 {} 处）",
        report.target,
        report.scenario,
        report.entries.len()
    )];
    for (i, entry) in report.entries.iter().enumerate() {
        lines.push(format!(
            "{}. {} {}（{}，{}格）",
            i + 1,
            entry.resource_level,
            entry.coord,
            entry.prefecture,
            entry.distance
        ));
    }
    lines.join("\n")
}
