// ==========================================
// 三战同盟助手 - 同盟数据对比 API
// ==========================================
// 职责: 两次上传的成员指标对比编排
// 要点: 时间先后由快照的顺序键决定（文件名时间戳/落库时间），
//       无法判定先后时整体拒绝——分组取向与报表标注都依赖这个顺序
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::messenger::Messenger;
use crate::domain::member::{MemberRecord, MemberSnapshotRow, MetricDiffRow};
use crate::domain::types::Metric;
use crate::engine::metric_diff::MetricDiffEngine;
use crate::importer::snapshot_parser::parse_snapshot_timestamp;
use crate::repository::upload_repo::UploadRepository;

/// 文本回复中最多展示的差值行数
const DIFF_REPLY_LIMIT: usize = 15;

// ==========================================
// AnalysisApi - 数据对比 API
// ==========================================
pub struct AnalysisApi {
    upload_repo: Arc<UploadRepository>,
    messenger: Arc<dyn Messenger>,
    diff_engine: MetricDiffEngine,
}

impl AnalysisApi {
    /// 创建新的AnalysisApi实例
    pub fn new(upload_repo: Arc<UploadRepository>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            upload_repo,
            messenger,
            diff_engine: MetricDiffEngine::new(),
        }
    }

    /// 对比两组成员明细的指定指标
    ///
    /// 哪一侧算"较早"由顺序键决定，与参数摆放无关。
    ///
    /// # 参数
    /// - `side_a` / `side_b`: 两次快照的成员明细
    /// - `metric`: 对比指标
    /// - `order_key_a` / `order_key_b`: 两侧的顺序键
    ///   （导出文件名或 "YYYY-MM-DD HH:MM:SS"）
    ///
    /// # 返回
    /// - Ok(rows): 按 (分组 升序, 差值 降序) 排序；无共同成员时为空列表
    /// - Err(ChronologyUndetermined): 顺序键无法解析或两键相同
    pub fn diff_metric(
        &self,
        side_a: &[MemberSnapshotRow],
        side_b: &[MemberSnapshotRow],
        metric: Metric,
        order_key_a: &str,
        order_key_b: &str,
    ) -> ApiResult<Vec<MetricDiffRow>> {
        let ts_a = parse_order_key(order_key_a)?;
        let ts_b = parse_order_key(order_key_b)?;
        if ts_a == ts_b {
            return Err(ApiError::ChronologyUndetermined(format!(
                "两侧顺序键相同（{}），无法分辨先后",
                order_key_a
            )));
        }

        let (earlier_rows, later_rows) = if ts_a < ts_b {
            (side_a, side_b)
        } else {
            (side_b, side_a)
        };

        let earlier = to_records(earlier_rows, metric);
        let later = to_records(later_rows, metric);
        Ok(self.diff_engine.diff(&earlier, &later))
    }

    /// 对比用户的两条上传记录，并把结果文本发给用户
    ///
    /// # 参数
    /// - `user_id`: 发起对比的用户
    /// - `upload_id_a` / `upload_id_b`: 两条上传记录的主键
    /// - `metric`: 对比指标
    ///
    /// # 返回
    /// - Ok(ack): 立即应答文本（结果另行通知）
    pub async fn compare_uploads(
        &self,
        user_id: &str,
        upload_id_a: i64,
        upload_id_b: i64,
        metric: Metric,
    ) -> ApiResult<String> {
        if upload_id_a == upload_id_b {
            return Err(ApiError::InvalidInput(
                "请选择两条不同的上传记录".to_string(),
            ));
        }

        let (meta_a, members_a) = self
            .upload_repo
            .get_upload_with_members(user_id, upload_id_a)?
            .ok_or_else(|| ApiError::NotFound("上传记录不存在或已删除".to_string()))?;
        let (meta_b, members_b) = self
            .upload_repo
            .get_upload_with_members(user_id, upload_id_b)?
            .ok_or_else(|| ApiError::NotFound("上传记录不存在或已删除".to_string()))?;

        if meta_a.ts == meta_b.ts {
            return Err(ApiError::ChronologyUndetermined(
                "两条上传记录的导出时间相同".to_string(),
            ));
        }
        let (earlier_ts, later_ts, earlier_members, later_members) = if meta_a.ts < meta_b.ts {
            (meta_a.ts, meta_b.ts, members_a, members_b)
        } else {
            (meta_b.ts, meta_a.ts, members_b, members_a)
        };

        let earlier = to_records(&earlier_members, metric);
        let later = to_records(&later_members, metric);
        let rows = self.diff_engine.diff(&earlier, &later);

        info!(
            user = %user_id,
            metric = %metric,
            rows = rows.len(),
            "上传对比完成"
        );

        let summary = format_diff_summary(metric, earlier_ts, later_ts, &rows);
        self.messenger.send_text(user_id, &summary).await;

        Ok(format!("{}对比完成，结果已发送", metric.label()))
    }
}

/// 顺序键解析，失败归类为"无法确定时间先后"
fn parse_order_key(key: &str) -> ApiResult<NaiveDateTime> {
    parse_snapshot_timestamp(key).ok_or_else(|| {
        ApiError::ChronologyUndetermined(format!("顺序键「{}」中没有可识别的时间", key))
    })
}

/// 上传明细 -> 单指标成员记录（空白分组在此落为"未分组"）
fn to_records(rows: &[MemberSnapshotRow], metric: Metric) -> Vec<MemberRecord> {
    rows.iter()
        .map(|r| MemberRecord::new(r.member_name.clone(), metric.extract(r), &r.group_name))
        .collect()
}

/// 时间窗口的展示格式（去秒，斜杠日期）
fn format_ts_display(ts: NaiveDateTime) -> String {
    ts.format("%Y/%m/%d %H:%M").to_string()
}

/// 对比结果的文本摘要
fn format_diff_summary(
    metric: Metric,
    earlier_ts: NaiveDateTime,
    later_ts: NaiveDateTime,
    rows: &[MetricDiffRow],
) -> String {
    let header = format!(
        "{}对比结果\n{} → {}",
        metric.label(),
        format_ts_display(earlier_ts),
        format_ts_display(later_ts)
    );

    if rows.is_empty() {
        return format!("{}\n两次上传没有共同成员，暂无可比数据。", header);
    }

    let mut lines = vec![header];
    let mut current_group: Option<&str> = None;
    for row in rows.iter().take(DIFF_REPLY_LIMIT) {
        if current_group != Some(row.group_name.as_str()) {
            current_group = Some(row.group_name.as_str());
            lines.push(format!("■ {}", row.group_name));
        }
        lines.push(format!("  {} {:+}", row.member_name, row.metric_delta));
    }
    if rows.len() > DIFF_REPLY_LIMIT {
        lines.push(format!("……其余 {} 行略", rows.len() - DIFF_REPLY_LIMIT));
    }
    lines.join("\n")
}
