// ==========================================
// 固件发布记录系统 - 仓储层 SQL 辅助
// ==========================================
// 职责: 文本列 <-> 领域类型转换、LIKE 模式转义
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

use crate::db::{DATETIME_FORMAT, DATE_FORMAT};

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// 读取 YYYY-MM-DD 文本列
pub(crate) fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_failure(idx, e))
}

/// 读取 YYYY-MM-DD HH:MM:SS 文本列
pub(crate) fn get_datetime(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| conversion_failure(idx, e))
}

/// 读取枚举文本列 (FirmwareStatus / EntryClassification / Role)
pub(crate) fn get_enum<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_datetime(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// 当前 UTC 时间 (秒精度,与存储格式一致)
pub(crate) fn now_utc() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 转义 LIKE 通配符,配合 `ESCAPE '\'` 使用
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
