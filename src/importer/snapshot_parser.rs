// ==========================================
// 三战同盟助手 - 同盟统计 CSV 解析
// ==========================================
// 输入: 游戏导出的同盟统计 CSV（文件名内嵌导出时间）
// 列匹配: 模糊匹配（表头包含关键字即可），适配导出端措辞变动
// ==========================================

use crate::domain::member::MemberSnapshotRow;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::io::Read;
use thiserror::Error;

/// 同盟统计解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotParseError {
    #[error("缺少必要列: {}", .columns.join(","))]
    MissingColumns { columns: Vec<String> },

    #[error("第{row}行存在空成员名")]
    BlankMemberName { row: usize },

    #[error("第{row}行列「{column}」含非数字值: {value}")]
    BadNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV 读取失败: {0}")]
    ReadFailure(String),
}

/// 解析同盟统计 CSV 的成员明细
///
/// # 参数
/// - `reader`: CSV 数据源
///
/// # 返回
/// - Ok(rows): 成员明细（保持文件行序）
/// - Err(SnapshotParseError): 缺列/空成员/数值损坏
pub fn parse_members_csv<R: Read>(reader: R) -> Result<Vec<MemberSnapshotRow>, SnapshotParseError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| SnapshotParseError::ReadFailure(e.to_string()))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    // 模糊匹配：表头包含关键字即视为命中
    let find = |keyword: &str| headers.iter().position(|h| h.contains(keyword));

    let mut missing = Vec::new();
    let mut required = |keyword: &str| match find(keyword) {
        Some(idx) => idx,
        None => {
            missing.push(keyword.to_string());
            usize::MAX // 占位，缺列时下方整体报错，不会被使用
        }
    };

    let member_idx = required("成员");
    let contrib_idx = required("贡献总量");
    let battle_idx = required("战功总量");
    let assist_idx = required("助攻总量");
    let donate_idx = required("捐献总量");
    let power_idx = required("势力值");
    let group_idx = required("分组");
    if !missing.is_empty() {
        return Err(SnapshotParseError::MissingColumns { columns: missing });
    }
    let rank_idx = find("贡献排行");

    let mut rows = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let row_no = i + 2; // 含表头的自然行号，便于报错定位
        let record = result.map_err(|e| SnapshotParseError::ReadFailure(e.to_string()))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let member_name = field(member_idx);
        if member_name.is_empty() {
            return Err(SnapshotParseError::BlankMemberName { row: row_no });
        }

        let numeric = |idx: usize, column: &str| -> Result<i64, SnapshotParseError> {
            let raw = field(idx);
            parse_numeric_cell(&raw).ok_or_else(|| SnapshotParseError::BadNumeric {
                row: row_no,
                column: column.to_string(),
                value: raw,
            })
        };

        let contrib_rank = rank_idx.and_then(|idx| extract_first_integer(&field(idx)));

        rows.push(MemberSnapshotRow {
            member_name,
            contrib_rank,
            contrib_total: numeric(contrib_idx, "贡献总量")?,
            battle_total: numeric(battle_idx, "战功总量")?,
            assist_total: numeric(assist_idx, "助攻总量")?,
            donate_total: numeric(donate_idx, "捐献总量")?,
            power_value: numeric(power_idx, "势力值")?,
            group_name: field(group_idx),
        });
    }

    Ok(rows)
}

/// 数值单元格解析：整数或向零截断的小数
///
/// 指标统一为整数表示，截断发生在这里（相减之前），
/// 保证差值永远是两个整数之差。
fn parse_numeric_cell(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    raw.parse::<f64>().ok().map(|v| v.trunc() as i64)
}

/// 提取字符串里的第一段连续数字（如 "第3名" -> 3）
fn extract_first_integer(raw: &str) -> Option<i64> {
    let mut digits = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse::<i64>().ok()
}

// ==========================================
// 导出时间解析
// ==========================================

/// 解析快照的导出时间
///
/// 接受两种形态:
/// - 导出文件名内嵌的中文时间戳，如 "同盟统计2025年11月15日23时00分32秒.csv"
///   （秒可缺省）
/// - 标准格式 "2025-11-15 23:00:32" 或 "2025-11-15 23:00"
///
/// # 返回
/// - Some(ts): 解析成功
/// - None: 无法确定时间，由调用方决定如何上报
pub fn parse_snapshot_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Some(ts) = parse_cn_timestamp(text) {
        return Some(ts);
    }
    let trimmed = text.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M").ok()
}

/// 中文时间戳扫描：年/月/日/时/分 必备，秒可缺省
fn parse_cn_timestamp(text: &str) -> Option<NaiveDateTime> {
    let mut year = None;
    let mut month = None;
    let mut day = None;
    let mut hour = None;
    let mut minute = None;
    let mut second = None;

    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            let value: u32 = digits.parse().ok()?;
            match c {
                '年' => year = Some(value),
                '月' => month = Some(value),
                '日' => day = Some(value),
                '时' => hour = Some(value),
                '分' => minute = Some(value),
                '秒' => second = Some(value),
                _ => {}
            }
        }
        digits.clear();
    }

    let date = NaiveDate::from_ymd_opt(i32::try_from(year?).ok()?, month?, day?)?;
    date.and_hms_opt(hour?, minute?, second.unwrap_or(0))
}
