// ==========================================
// 三战同盟助手 - 快照对比引擎
// ==========================================
// 职责: 两次同盟统计快照间的成员指标差值计算
// 输入: 已按时间先后排好的两侧成员记录
// 输出: 按 (分组 升序, 差值 降序) 排序的差值行
// ==========================================

use crate::domain::member::{MemberRecord, MetricDiffRow, UNGROUPED};
use std::cmp::Ordering;
use std::collections::HashMap;

// ==========================================
// MetricDiffEngine - 快照对比引擎
// ==========================================
pub struct MetricDiffEngine {
    // 无状态引擎，不需要注入依赖
}

impl MetricDiffEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算两侧快照的成员指标差值
    ///
    /// 规则:
    /// - 两侧各自按成员名去重，重复时保留指标值最大的记录
    ///   （对脏数据的防御性处理）
    /// - 按成员名内连接，任一侧缺席的成员被丢弃
    /// - 差值 = 后侧指标 - 前侧指标（两侧都已是整数）
    /// - 分组优先取后侧，后侧为"未分组"时回退前侧
    /// - 无共同成员时返回空列表，这是合法结果而非错误
    ///
    /// # 参数
    /// - `earlier`: 时间较早一侧的成员记录
    /// - `later`: 时间较晚一侧的成员记录
    ///
    /// # 返回
    /// 按 (group_name 升序, metric_delta 降序) 稳定排序的差值行
    pub fn diff(&self, earlier: &[MemberRecord], later: &[MemberRecord]) -> Vec<MetricDiffRow> {
        let earlier_map = dedup_keep_max(earlier);
        let later_deduped = dedup_keep_max_ordered(later);

        let mut rows: Vec<MetricDiffRow> = Vec::new();
        for record in later_deduped {
            let Some(prev) = earlier_map.get(record.member_name.as_str()) else {
                continue;
            };

            let group_name = if record.group_name != UNGROUPED {
                record.group_name.clone()
            } else if prev.group_name != UNGROUPED {
                prev.group_name.clone()
            } else {
                UNGROUPED.to_string()
            };

            rows.push(MetricDiffRow {
                member_name: record.member_name.clone(),
                group_name,
                metric_delta: record.metric_value - prev.metric_value,
            });
        }

        // 稳定排序：并列时保持连接顺序
        rows.sort_by(|a, b| {
            match a.group_name.cmp(&b.group_name) {
                Ordering::Equal => {}
                other => return other,
            }
            b.metric_delta.cmp(&a.metric_delta)
        });

        rows
    }
}

impl Default for MetricDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 按成员名去重，保留指标值最大的记录
fn dedup_keep_max<'a>(records: &'a [MemberRecord]) -> HashMap<&'a str, &'a MemberRecord> {
    let mut map: HashMap<&str, &MemberRecord> = HashMap::new();
    for record in records {
        match map.get(record.member_name.as_str()) {
            Some(existing) if existing.metric_value >= record.metric_value => {}
            _ => {
                map.insert(record.member_name.as_str(), record);
            }
        }
    }
    map
}

/// 按成员名去重并保持首次出现的顺序，重复时就地替换为指标值更大的记录
fn dedup_keep_max_ordered(records: &[MemberRecord]) -> Vec<&MemberRecord> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ordered: Vec<&MemberRecord> = Vec::new();
    for record in records {
        match index.get(record.member_name.as_str()) {
            Some(&i) => {
                if record.metric_value > ordered[i].metric_value {
                    ordered[i] = record;
                }
            }
            None => {
                index.insert(record.member_name.as_str(), ordered.len());
                ordered.push(record);
            }
        }
    }
    ordered
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, value: i64, group: &str) -> MemberRecord {
        MemberRecord::new(name, value, group)
    }

    #[test]
    fn test_basic_delta_and_sort() {
        let engine = MetricDiffEngine::new();

        let earlier = vec![
            record("张三", 100, "一队"),
            record("李四", 200, "一队"),
            record("王五", 50, "二队"),
        ];
        let later = vec![
            record("张三", 400, "一队"),
            record("李四", 250, "一队"),
            record("王五", 60, "二队"),
        ];

        let rows = engine.diff(&earlier, &later);
        assert_eq!(rows.len(), 3);
        // 同组内差值降序
        assert_eq!(rows[0].member_name, "张三");
        assert_eq!(rows[0].metric_delta, 300);
        assert_eq!(rows[1].member_name, "李四");
        assert_eq!(rows[1].metric_delta, 50);
        // 分组升序（"一队" < "二队" 按码点序即 一(4E00) < 二(4E8C)）
        assert_eq!(rows[2].member_name, "王五");
    }

    #[test]
    fn test_inner_join_drops_one_sided_members() {
        let engine = MetricDiffEngine::new();

        let earlier = vec![record("张三", 100, "一队"), record("退盟者", 999, "一队")];
        let later = vec![record("张三", 150, "一队"), record("新人", 10, "一队")];

        let rows = engine.diff(&earlier, &later);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_name, "张三");
        assert_eq!(rows[0].metric_delta, 50);
    }

    #[test]
    fn test_no_common_members_yields_empty_ok() {
        let engine = MetricDiffEngine::new();

        let earlier = vec![record("张三", 100, "一队")];
        let later = vec![record("李四", 200, "一队")];

        let rows = engine.diff(&earlier, &later);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_swapping_sides_negates_every_delta() {
        let engine = MetricDiffEngine::new();

        let side_a = vec![
            record("张三", 100, "一队"),
            record("李四", 300, "二队"),
            record("王五", 50, "三队"),
        ];
        let side_b = vec![
            record("张三", 250, "一队"),
            record("李四", 120, "二队"),
            record("王五", 50, "三队"),
        ];

        let forward = engine.diff(&side_a, &side_b);
        let backward = engine.diff(&side_b, &side_a);

        let forward_map: HashMap<_, _> = forward
            .iter()
            .map(|r| (r.member_name.clone(), r.metric_delta))
            .collect();
        assert_eq!(forward.len(), backward.len());
        for row in &backward {
            assert_eq!(row.metric_delta, -forward_map[&row.member_name]);
        }
    }

    #[test]
    fn test_dedup_keeps_largest_metric() {
        let engine = MetricDiffEngine::new();

        // 前侧"张三"重复，应保留 180 那条
        let earlier = vec![
            record("张三", 180, "一队"),
            record("张三", 100, "一队"),
        ];
        // 后侧"张三"重复，应保留 400 那条
        let later = vec![
            record("张三", 250, "一队"),
            record("张三", 400, "一队"),
        ];

        let rows = engine.diff(&earlier, &later);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric_delta, 400 - 180);
    }

    #[test]
    fn test_group_prefers_later_then_earlier_then_sentinel() {
        let engine = MetricDiffEngine::new();

        let earlier = vec![
            record("张三", 100, "老队"),
            record("李四", 100, "老队"),
            record("王五", 100, ""),
        ];
        let later = vec![
            record("张三", 200, "新队"),
            record("李四", 200, ""),
            record("王五", 200, ""),
        ];

        let rows = engine.diff(&earlier, &later);
        let by_name: HashMap<_, _> = rows
            .iter()
            .map(|r| (r.member_name.clone(), r.group_name.clone()))
            .collect();
        // 后侧有组用后侧
        assert_eq!(by_name["张三"], "新队");
        // 后侧空白回退前侧
        assert_eq!(by_name["李四"], "老队");
        // 两侧都空白落为未分组
        assert_eq!(by_name["王五"], UNGROUPED);
    }
}
