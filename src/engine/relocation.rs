// ==========================================
// 三战同盟助手 - 迁城测算引擎
// ==========================================
// 职责: 资源州找铜的核心算法
// 流程: 归属郡投票 -> 资源点分组与预筛选 -> 候选点枚举
//       -> 距离过滤 -> 郡界过滤 -> 近/远圈计分 -> 多键排序
// 性能: 候选点约 3 万个，距离计算走扁平数组批量求值，
//       不做逐对分配，也不嵌套 Vec
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::coord::{CubeCoord, HexCoord};
use crate::domain::resource::ResourcePoint;
use crate::domain::types::{NeighborPoint, RelocationCandidate, RelocationRecommendation};
use crate::engine::error::{EngineError, EngineResult};
use std::cmp::Ordering;
use tracing::debug;

// ==========================================
// CubeBatch - 扁平化的立方坐标批量
// ==========================================

/// 一组资源点的立方坐标，按轴拆成三条扁平数组
///
/// 距离求值在单次遍历内完成（手工循环融合），
/// 这是候选点 x 资源点规模下唯一可接受的形态。
struct CubeBatch {
    xs: Vec<i64>,
    ys: Vec<i64>,
    zs: Vec<i64>,
}

impl CubeBatch {
    fn from_coords<'a>(coords: impl Iterator<Item = &'a HexCoord>) -> Self {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut zs = Vec::new();
        for coord in coords {
            let cube = coord.to_cube();
            xs.push(cube.x);
            ys.push(cube.y);
            zs.push(cube.z);
        }
        Self { xs, ys, zs }
    }

    fn len(&self) -> usize {
        self.xs.len()
    }

    fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// 到批量内最近点的距离，空批量返回 i64::MAX（视为无穷远）
    fn min_distance(&self, from: CubeCoord) -> i64 {
        let mut best = i64::MAX;
        for i in 0..self.len() {
            let d = (self.xs[i] - from.x)
                .abs()
                .max((self.ys[i] - from.y).abs())
                .max((self.zs[i] - from.z).abs());
            if d < best {
                best = d;
            }
        }
        best
    }

    /// 单次遍历同时统计近圈与远圈的点数
    ///
    /// # 返回
    /// - (near, far): 距离 <= near_radius 的点数，
    ///   以及 near_radius < 距离 <= far_radius 的点数
    fn count_near_far(&self, from: CubeCoord, near_radius: i64, far_radius: i64) -> (usize, usize) {
        let mut near = 0;
        let mut far = 0;
        for i in 0..self.len() {
            let d = (self.xs[i] - from.x)
                .abs()
                .max((self.ys[i] - from.y).abs())
                .max((self.zs[i] - from.z).abs());
            if d <= near_radius {
                near += 1;
            } else if d <= far_radius {
                far += 1;
            }
        }
        (near, far)
    }
}

// ==========================================
// RelocationPlanner - 迁城测算引擎
// ==========================================
pub struct RelocationPlanner {
    config: PlannerConfig,
}

impl RelocationPlanner {
    /// 构造函数
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置构造
    pub fn with_default_config() -> Self {
        Self::new(PlannerConfig::default())
    }

    /// 当前配置
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// 目标资源等级的展示标签（如 "8铜"）
    pub fn tier_label(&self) -> String {
        format!("{}{}", self.config.tier_prefix, self.config.tier_marker)
    }

    /// 对目标坐标执行迁城测算
    ///
    /// 纯函数：结果只取决于资源目录、目标坐标与配置，可安全重试。
    ///
    /// # 参数
    /// - `points`: 赛季的全部资源点（只读目录）
    /// - `target`: 目标坐标（必须在 1..=1500 范围内）
    ///
    /// # 返回
    /// - Ok(RelocationRecommendation): 最优推荐 + 备选 + 周边资源
    /// - Err(EngineError): 见错误类型定义
    pub fn plan(
        &self,
        points: &[ResourcePoint],
        target: HexCoord,
    ) -> EngineResult<RelocationRecommendation> {
        // 入参校验先于一切计算
        if !target.in_map_range() {
            return Err(EngineError::CoordinateOutOfRange { coord: target });
        }
        if points.is_empty() {
            return Err(EngineError::CatalogEmpty);
        }

        let target_cube = target.to_cube();

        // ---- 第 1 步: 归属郡投票（最近资源点） ----
        // 严格小于保证并列时保留目录顺序中先出现的点
        let mut nearest_idx = 0usize;
        let mut nearest_dist = i64::MAX;
        for (i, p) in points.iter().enumerate() {
            let d = target_cube.distance(&p.coord.to_cube());
            if d < nearest_dist {
                nearest_dist = d;
                nearest_idx = i;
            }
        }
        let prefecture = points[nearest_idx].prefecture.clone();

        // ---- 第 2 步: 资源点分组与预筛选 ----
        let mut same_prefecture: Vec<&ResourcePoint> = Vec::new();
        let mut other_prefecture: Vec<&ResourcePoint> = Vec::new();
        for p in points {
            if p.prefecture == prefecture {
                same_prefecture.push(p);
            } else {
                other_prefecture.push(p);
            }
        }

        let tier_points: Vec<&ResourcePoint> = same_prefecture
            .iter()
            .copied()
            .filter(|p| {
                p.resource_level.starts_with(self.config.tier_prefix)
                    && p.resource_level.contains(self.config.tier_marker)
            })
            .collect();

        // 预筛选只是性能优化，不承担正确性
        let narrow_radius = self.config.narrow_radius();
        let other_narrowed: Vec<&ResourcePoint> = other_prefecture
            .iter()
            .copied()
            .filter(|p| target_cube.distance(&p.coord.to_cube()) <= narrow_radius)
            .collect();
        let tier_narrowed: Vec<&ResourcePoint> = tier_points
            .iter()
            .copied()
            .filter(|p| target_cube.distance(&p.coord.to_cube()) <= narrow_radius)
            .collect();

        // 预筛选裁空时回退为全量目标等级点，避免凭空返回零资源的结果
        let tier_used: &[&ResourcePoint] = if tier_narrowed.is_empty() {
            debug!(
                prefecture = %prefecture,
                tier_total = tier_points.len(),
                "目标等级资源点预筛选为空，回退为全量集合"
            );
            &tier_points
        } else {
            &tier_narrowed
        };

        let same_batch = CubeBatch::from_coords(same_prefecture.iter().map(|p| &p.coord));
        let other_batch = CubeBatch::from_coords(other_narrowed.iter().map(|p| &p.coord));
        let tier_batch = CubeBatch::from_coords(tier_used.iter().map(|p| &p.coord));

        // ---- 第 3/4 步: 候选点枚举 + 目标半径过滤 ----
        let radius = self.config.radius_limit;
        let r = radius as i32;
        let x_lo = target.x.saturating_sub(r).max(1);
        let x_hi = (target.x + r).min(1500);
        let y_lo = target.y.saturating_sub(r).max(1);
        let y_hi = (target.y + r).min(1500);

        let mut candidates: Vec<(HexCoord, CubeCoord, i64)> = Vec::new();
        for x in x_lo..=x_hi {
            for y in y_lo..=y_hi {
                let coord = HexCoord::new(x, y);
                let cube = coord.to_cube();
                let d = cube.distance(&target_cube);
                if d <= radius {
                    candidates.push((coord, cube, d));
                }
            }
        }
        if candidates.is_empty() {
            return Err(EngineError::NoCandidateInRange { target, radius });
        }

        // ---- 第 5/6 步: 郡界过滤 + 近/远圈计分 ----
        let mut survivors: Vec<RelocationCandidate> = Vec::new();
        for (coord, cube, dist_to_target) in &candidates {
            let d_same = same_batch.min_distance(*cube);
            let d_other = if other_batch.is_empty() {
                i64::MAX
            } else {
                other_batch.min_distance(*cube)
            };
            // Voronoi 式郡界判定：离本郡不得比离外郡更远
            if d_other < d_same {
                continue;
            }

            let (near_count, far_count) = tier_batch.count_near_far(
                *cube,
                self.config.near_radius,
                self.config.cluster_radius,
            );
            survivors.push(RelocationCandidate {
                coord: *coord,
                distance_to_target: *dist_to_target,
                near_count,
                far_count,
                same_prefecture_distance: d_same,
            });
        }
        if survivors.is_empty() {
            return Err(EngineError::NoCandidateInRange { target, radius });
        }

        debug!(
            prefecture = %prefecture,
            candidates = candidates.len(),
            survivors = survivors.len(),
            tier_points = tier_used.len(),
            other_points = other_narrowed.len(),
            "迁城测算筛选完成"
        );

        // ---- 第 7 步: 多键排序 ----
        survivors.sort_by(compare_candidates);

        let best = survivors[0].clone();
        let runner_ups: Vec<RelocationCandidate> = survivors
            .iter()
            .skip(1)
            .take(self.config.runner_up_count)
            .cloned()
            .collect();

        // ---- 第 8 步: 推荐点周边资源枚举（复用预筛选集合） ----
        let best_cube = best.coord.to_cube();
        let mut neighbors: Vec<NeighborPoint> = tier_used
            .iter()
            .filter_map(|p| {
                let d = best_cube.distance(&p.coord.to_cube());
                (d <= self.config.cluster_radius).then(|| NeighborPoint {
                    coord: p.coord,
                    distance: d,
                })
            })
            .collect();
        neighbors.sort_by(|a, b| {
            match a.distance.cmp(&b.distance) {
                Ordering::Equal => {}
                other => return other,
            }
            match a.coord.x.cmp(&b.coord.x) {
                Ordering::Equal => {}
                other => return other,
            }
            a.coord.y.cmp(&b.coord.y)
        });

        Ok(RelocationRecommendation {
            prefecture,
            target,
            best,
            neighbors,
            runner_ups,
        })
    }
}

impl Default for RelocationPlanner {
    fn default() -> Self {
        Self::with_default_config()
    }
}

/// 候选点排序：
/// 1) near_count 降序
/// 2) far_count 降序
/// 3) 距目标距离 升序
/// 4) 距最近同郡点距离 升序
/// 5) x 升序, 6) y 升序（保证确定性）
fn compare_candidates(a: &RelocationCandidate, b: &RelocationCandidate) -> Ordering {
    match b.near_count.cmp(&a.near_count) {
        Ordering::Equal => {}
        other => return other,
    }
    match b.far_count.cmp(&a.far_count) {
        Ordering::Equal => {}
        other => return other,
    }
    match a.distance_to_target.cmp(&b.distance_to_target) {
        Ordering::Equal => {}
        other => return other,
    }
    match a
        .same_prefecture_distance
        .cmp(&b.same_prefecture_distance)
    {
        Ordering::Equal => {}
        other => return other,
    }
    match a.coord.x.cmp(&b.coord.x) {
        Ordering::Equal => {}
        other => return other,
    }
    a.coord.y.cmp(&b.coord.y)
}
