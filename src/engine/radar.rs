// ==========================================
// 三战同盟助手 - 周边资源查询引擎
// ==========================================
// 职责: 以目标坐标为中心的最近 K 个资源点搜索
// 输入: 某赛季的资源点目录（只读）
// 输出: 距离升序的资源点列表（最多 top_k 条）
// ==========================================

use crate::config::RadarConfig;
use crate::domain::coord::HexCoord;
use crate::domain::resource::{RadarEntry, RadarReport, ResourcePoint};
use crate::engine::error::{EngineError, EngineResult};
use std::cmp::Ordering;

// ==========================================
// RadarEngine - 周边资源查询引擎
// ==========================================
pub struct RadarEngine {
    config: RadarConfig,
}

impl RadarEngine {
    /// 构造函数
    pub fn new(config: RadarConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置构造
    pub fn with_default_config() -> Self {
        Self::new(RadarConfig::default())
    }

    /// 查询目标坐标周边最近的资源点
    ///
    /// 排序键: (距离 升序, 资源等级 升序, 郡名 升序)，截断到 top_k。
    /// tier_filter 为资源等级的前缀匹配（如 "8" 匹配 "8铜"）。
    ///
    /// # 参数
    /// - `scenario`: 赛季名称（仅用于结果与错误展示）
    /// - `points`: 该赛季的全部资源点
    /// - `target`: 目标坐标
    /// - `tier_filter`: 可选的资源等级前缀过滤
    ///
    /// # 返回
    /// - Ok(RadarReport): 查询结果
    /// - Err(EngineError::ScenarioEmpty): 赛季无数据
    pub fn search(
        &self,
        scenario: &str,
        points: &[ResourcePoint],
        target: HexCoord,
        tier_filter: Option<&str>,
    ) -> EngineResult<RadarReport> {
        if points.is_empty() {
            return Err(EngineError::ScenarioEmpty {
                scenario: scenario.to_string(),
            });
        }

        let mut entries: Vec<RadarEntry> = points
            .iter()
            .filter(|p| match tier_filter {
                Some(prefix) => p.resource_level.starts_with(prefix),
                None => true,
            })
            .map(|p| RadarEntry {
                prefecture: p.prefecture.clone(),
                resource_level: p.resource_level.clone(),
                coord: p.coord,
                distance: target.distance(&p.coord),
            })
            .collect();

        entries.sort_by(|a, b| {
            match a.distance.cmp(&b.distance) {
                Ordering::Equal => {}
                other => return other,
            }
            match a.resource_level.cmp(&b.resource_level) {
                Ordering::Equal => {}
                other => return other,
            }
            a.prefecture.cmp(&b.prefecture)
        });
        entries.truncate(self.config.top_k);

        Ok(RadarReport {
            scenario: scenario.to_string(),
            target,
            entries,
        })
    }
}

impl Default for RadarEngine {
    fn default() -> Self {
        Self::with_default_config()
    }
}
