use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::{Result, TradeInfoError};

/// 未解決フィールドの正準表示値。
///
/// Extraction works with `Option<String>` internally; the sentinel is applied
/// only when a record is assembled, so "not found" and "found empty" stay
/// distinguishable inside the engine.
pub const SENTINEL: &str = "-";

/// Name marker for a stock whose page could not be fetched or interpreted.
pub const NOT_FOUND_NAME: &str = "Error";

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("invalid stock code regex"));

/// 4桁の証券コード。ネットワークアクセス前に検証される。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StockCode(String);

impl StockCode {
    pub fn new(code: &str) -> Result<Self> {
        if CODE_PATTERN.is_match(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(TradeInfoError::InvalidCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for StockCode {
    type Err = TradeInfoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Display for StockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ニュース1件。タイトルは日付セルがあれば `[{日付}] ` を前置済み。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

/// 1営業期間分の四本値と出来高。
///
/// `vwap` is a typical-price approximation `round((high+low+close)/3, 2)`,
/// not an exchange-reported figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ohlcv {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub vwap: f64,
}

/// 株価指数1本分のスナップショット。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
}

impl IndexInfo {
    /// 取得に失敗した指数のプレースホルダ。
    pub fn unavailable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            price: SENTINEL.to_string(),
            change: SENTINEL.to_string(),
            change_percent: SENTINEL.to_string(),
        }
    }
}

/// 三指数の固定スナップショット。各指数は独立に解決される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketIndices {
    pub nikkei225: IndexInfo,
    pub topix: IndexInfo,
    pub futures: IndexInfo,
}

/// 銘柄詳細スナップショット。組み立て後は不変。
///
/// Every scalar field holds either a real value or [`SENTINEL`]; no field is
/// ever left absent. This struct is the serialization contract handed to the
/// API layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDetails {
    pub code: String,
    pub name: String,
    pub market: String,
    pub current_price: String,
    pub change: String,
    pub change_percent: String,
    pub vwap: String,
    pub volume: String,
    pub margin_buy: String,
    pub margin_sell: String,
    pub margin_ratio: String,
    pub ma25_diff: String,
    pub ma75_diff: String,
    pub dividend_yield: String,
    pub ex_dividend_date: String,
    pub benefit_date: String,
    pub settlement_date: String,
    pub news: Vec<NewsItem>,
    pub history: Vec<Ohlcv>,
}

impl StockDetails {
    /// ページを取得・解釈できなかった場合の終端レコード。
    pub fn not_found(code: &StockCode) -> Self {
        Self {
            code: code.to_string(),
            name: NOT_FOUND_NAME.to_string(),
            market: SENTINEL.to_string(),
            current_price: SENTINEL.to_string(),
            change: SENTINEL.to_string(),
            change_percent: SENTINEL.to_string(),
            vwap: SENTINEL.to_string(),
            volume: SENTINEL.to_string(),
            margin_buy: SENTINEL.to_string(),
            margin_sell: SENTINEL.to_string(),
            margin_ratio: SENTINEL.to_string(),
            ma25_diff: SENTINEL.to_string(),
            ma75_diff: SENTINEL.to_string(),
            dividend_yield: SENTINEL.to_string(),
            ex_dividend_date: SENTINEL.to_string(),
            benefit_date: SENTINEL.to_string(),
            settlement_date: SENTINEL.to_string(),
            news: Vec::new(),
            history: Vec::new(),
        }
    }

    /// 「見つからない」終端レコードかどうか。
    pub fn is_not_found(&self) -> bool {
        self.name == NOT_FOUND_NAME
    }
}
