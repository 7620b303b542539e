// ==========================================
// 三战同盟助手 - 六边形坐标
// ==========================================
// 职责: 偏移坐标 <-> 立方坐标转换与距离计算
// 约定: 地图为 odd-q 垂直偏移布局，坐标范围 1..=1500
// ==========================================

use crate::config::{COORD_MAX, COORD_MIN};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// HexCoord - 偏移坐标
// ==========================================

/// 地图偏移坐标（游戏内展示的 X/Y）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

impl HexCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 坐标是否在游戏地图有效范围内（两轴均为 1..=1500）
    pub fn in_map_range(&self) -> bool {
        (COORD_MIN..=COORD_MAX).contains(&self.x) && (COORD_MIN..=COORD_MAX).contains(&self.y)
    }

    /// 转换为立方坐标
    ///
    /// odd-q 垂直偏移公式（整数运算，无浮点误差）:
    /// - cz = y - (x + (x & 1)) / 2
    /// - cy = -x - cz
    /// - cx = x
    pub fn to_cube(&self) -> CubeCoord {
        let x = i64::from(self.x);
        let y = i64::from(self.y);
        let cz = y - (x + (x & 1)) / 2;
        let cy = -x - cz;
        CubeCoord { x, y: cy, z: cz }
    }

    /// 两坐标间的六边形距离
    pub fn distance(&self, other: &HexCoord) -> i64 {
        self.to_cube().distance(&other.to_cube())
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// ==========================================
// CubeCoord - 立方坐标
// ==========================================

/// 立方坐标，仅用于距离计算，不落库
///
/// 不变量: x + y + z == 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CubeCoord {
    /// 立方坐标距离 = 各轴差绝对值的最大值
    pub fn distance(&self, other: &CubeCoord) -> i64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

// ==========================================
// 坐标文本解析
// ==========================================

/// 坐标文本解析错误（用户可纠正，消息原样回给用户）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    #[error("坐标格式不正确，请发送两个数字，例如：520,880")]
    BadTokenCount { found: usize },

    #[error("坐标必须是整数，无法识别：{token}")]
    NotAnInteger { token: String },

    #[error("坐标超出地图范围（1~1500）：{x},{y}")]
    OutOfRange { x: i64, y: i64 },
}

/// 解析用户输入的坐标文本
///
/// 接受的分隔符: 英文逗号、中文逗号、斜杠、空白，允许连续重复。
/// 必须恰好包含两个整数，且两轴都在 1..=1500 内。
///
/// # 返回
/// - Ok(HexCoord): 解析成功
/// - Err(CoordParseError): 格式/范围错误，消息可直接回给用户
pub fn parse_coordinate_text(text: &str) -> Result<HexCoord, CoordParseError> {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c == '，' || c == '/' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() != 2 {
        return Err(CoordParseError::BadTokenCount {
            found: tokens.len(),
        });
    }

    let mut values = [0i64; 2];
    for (i, token) in tokens.iter().enumerate() {
        values[i] = token
            .parse::<i64>()
            .map_err(|_| CoordParseError::NotAnInteger {
                token: (*token).to_string(),
            })?;
    }

    let (x, y) = (values[0], values[1]);
    let min = i64::from(COORD_MIN);
    let max = i64::from(COORD_MAX);
    if !(min..=max).contains(&x) || !(min..=max).contains(&y) {
        return Err(CoordParseError::OutOfRange { x, y });
    }

    Ok(HexCoord::new(x as i32, y as i32))
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_invariant_holds_exactly() {
        // 全范围抽样验证 x + y + z == 0
        for x in (1..=1500).step_by(37) {
            for y in (1..=1500).step_by(41) {
                let cube = HexCoord::new(x, y).to_cube();
                assert_eq!(
                    cube.x + cube.y + cube.z,
                    0,
                    "invariant broken at ({},{})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_distance_zero_iff_equal() {
        let a = HexCoord::new(520, 880);
        assert_eq!(a.distance(&a), 0);

        let b = HexCoord::new(521, 880);
        assert!(a.distance(&b) > 0);
    }

    #[test]
    fn test_distance_symmetric() {
        let samples = [
            (HexCoord::new(1, 1), HexCoord::new(1500, 1500)),
            (HexCoord::new(520, 880), HexCoord::new(700, 900)),
            (HexCoord::new(3, 7), HexCoord::new(8, 2)),
        ];
        for (a, b) in samples {
            assert_eq!(a.distance(&b), b.distance(&a));
        }
    }

    #[test]
    fn test_distance_triangle_inequality() {
        let points = [
            HexCoord::new(10, 10),
            HexCoord::new(500, 700),
            HexCoord::new(1499, 3),
            HexCoord::new(880, 520),
            HexCoord::new(1, 1500),
        ];
        for a in &points {
            for b in &points {
                for c in &points {
                    assert!(
                        a.distance(c) <= a.distance(b) + b.distance(c),
                        "triangle inequality broken for {} {} {}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_adjacent_distance_is_one() {
        // odd-q 布局下 (2,2) 的六个邻居
        let center = HexCoord::new(2, 2);
        let neighbors = [
            HexCoord::new(2, 1),
            HexCoord::new(2, 3),
            HexCoord::new(1, 2),
            HexCoord::new(1, 3),
            HexCoord::new(3, 2),
            HexCoord::new(3, 3),
        ];
        for n in neighbors {
            assert_eq!(center.distance(&n), 1, "neighbor {} should be at 1", n);
        }
    }

    #[test]
    fn test_parse_round_trip_all_separators() {
        let variants = ["520,880", "520，880", "520/880", "520 880"];
        for text in variants {
            let coord = parse_coordinate_text(text).unwrap();
            assert_eq!(coord, HexCoord::new(520, 880));
            // 文本化后再解析应得到同一坐标
            let round = parse_coordinate_text(&coord.to_string()).unwrap();
            assert_eq!(round, coord);
        }
    }

    #[test]
    fn test_parse_collapses_repeated_separators() {
        let coord = parse_coordinate_text("520,  880").unwrap();
        assert_eq!(coord, HexCoord::new(520, 880));
        let coord = parse_coordinate_text(" 520 ，/ 880 ").unwrap();
        assert_eq!(coord, HexCoord::new(520, 880));
    }

    #[test]
    fn test_parse_rejections() {
        assert!(matches!(
            parse_coordinate_text("abc,def"),
            Err(CoordParseError::NotAnInteger { .. })
        ));
        assert!(matches!(
            parse_coordinate_text("520"),
            Err(CoordParseError::BadTokenCount { found: 1 })
        ));
        assert!(matches!(
            parse_coordinate_text("520,880,900"),
            Err(CoordParseError::BadTokenCount { found: 3 })
        ));
        assert!(matches!(
            parse_coordinate_text("1501,880"),
            Err(CoordParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_coordinate_text("0,880"),
            Err(CoordParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_coordinate_text(""),
            Err(CoordParseError::BadTokenCount { found: 0 })
        ));
    }
}
