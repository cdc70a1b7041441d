use chrono::NaiveDate;

use crate::errors::{Result, TradeInfoError};

/// Strip every character that is not a digit or a decimal point.
///
/// セル文字列には桁区切りカンマ、単位（円、株、%）、全角記号などが混在する。
pub fn clean_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Lenient float conversion: empty or fully stripped input yields `0.0`.
///
/// One malformed scalar cell must not abort extraction of the rest of the
/// record. Callers that need a fully valid row use [`parse_f64`] instead.
pub fn to_f64(text: &str) -> f64 {
    clean_numeric(text).parse::<f64>().unwrap_or(0.0)
}

/// Strict float conversion used for history rows.
pub fn parse_f64(text: &str) -> Result<f64> {
    let cleaned = clean_numeric(text);
    cleaned
        .parse::<f64>()
        .map_err(|_| TradeInfoError::NumericConversion(text.to_string()))
}

/// Strict integer conversion used for history rows.
pub fn parse_i64(text: &str) -> Result<i64> {
    let cleaned = clean_numeric(text);
    cleaned
        .parse::<i64>()
        .map_err(|_| TradeInfoError::NumericConversion(text.to_string()))
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize a scraped date string to ISO `YYYY-MM-DD`.
///
/// 表示用セルは `24/05/17` や `2024/05/17` の形式を取る。`<time datetime>`
/// 属性の値は既にISO形式なのでそのまま通る。解釈できないものは原文を返す。
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() == 3 {
        // 年の桁数で西暦4桁/2桁を判別する
        let fmt = if parts[0].len() == 4 { "%Y/%m/%d" } else { "%y/%m/%d" };
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}
