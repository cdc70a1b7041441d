//! kabutan.jp 銘柄ページの取得と構造化データ抽出。
//!
//! ページのマークアップは文書化されておらず頻繁に変わるため、抽出は
//! すべてベストエフォートで行う。見つからないフィールドは内部では
//! `None` のまま持ち回り、レコード組み立て時に番兵値へ変換する。

use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{Result, TradeInfoError};
use crate::extract::locator::{locate, MatchMode};
use crate::extract::{dom, table};
use crate::models::stock::{
    IndexInfo, MarketIndices, NewsItem, Ohlcv, StockCode, StockDetails, SENTINEL,
};
use crate::scrapers::base::StockInfoSource;
use crate::util;

// 市場三指数の銘柄コードと表示名
const NIKKEI_225: (&str, &str) = ("0000", "日経平均株価");
const TOPIX: (&str, &str) = ("0010", "TOPIX");
const NIKKEI_FUTURES: (&str, &str) = ("0950", "日経平均先物");

// 履歴テーブルは 日付/始値/高値/安値/終値/前日比/騰落率/売買高 の8列
const HISTORY_MIN_CELLS: usize = 8;
const HISTORY_VOLUME_CELL: usize = 7;

static COMPANY_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.company_block h3").expect("invalid company selector"));
static MARKET_LABEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.company_block span.market").expect("invalid market selector")
});
static KABUKA: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".kabuka").expect("invalid kabuka selector"));
static CHANGE_PAIR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".si_i1_dl1 dd").expect("invalid change selector"));
static HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2").expect("invalid heading selector"));
static TREND_BLOCK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.kabuka_trend").expect("invalid trend selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("invalid row selector"));
static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("invalid cell selector"));
static DATA_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("invalid data cell selector"));
static BODY_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("invalid body row selector"));
static NEWS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.s_news_list").expect("invalid news table selector"));
static NEWS_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.date").expect("invalid news date selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("invalid link selector"));
static HISTORY_TABLES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.stock_kabuka0, table.stock_kabuka_dwm")
        .expect("invalid history table selector")
});
static TIME_TAG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time").expect("invalid time selector"));

static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\s*").expect("invalid code prefix regex"));

/// 銘柄詳細ページから抽出した生フィールド。
///
/// 組み立て前の中間表現。`None` は「文書中に見つからなかった」を表し、
/// 空文字列の値とは区別される。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DetailFields {
    name: Option<String>,
    market: Option<String>,
    current_price: Option<String>,
    change: Option<String>,
    change_percent: Option<String>,
    vwap: Option<String>,
    volume: Option<String>,
    margin_buy: Option<String>,
    margin_sell: Option<String>,
    margin_ratio: Option<String>,
    ma25_diff: Option<String>,
    ma75_diff: Option<String>,
    dividend_yield: Option<String>,
    ex_dividend_date: Option<String>,
    benefit_date: Option<String>,
    settlement_date: Option<String>,
}

/// kabutan.jp データ抽出器
pub struct KabutanScraper {
    client: Client,
    config: Config,
}

impl KabutanScraper {
    /// 新しい抽出器を生成する。
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, config })
    }

    /// 1回のGETで生マークアップを取得する。リトライはしない。
    async fn fetch_document(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TradeInfoError::HttpStatus(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn fetch_news(&self, code: &StockCode) -> Vec<NewsItem> {
        let url = format!("{}/stock/news?code={}", self.config.base_url, code);
        match self.fetch_document(&url).await {
            Ok(raw) => {
                let items =
                    parse_news(&dom::parse(&raw), &self.config.base_url, self.config.news_limit);
                debug!("{}: {} news items", code, items.len());
                items
            }
            Err(e) => {
                warn!("news fetch failed for {}: {}", code, e);
                Vec::new()
            }
        }
    }

    async fn fetch_history(&self, code: &StockCode) -> Vec<Ohlcv> {
        let url = format!("{}/stock/kabuka?code={}", self.config.base_url, code);
        match self.fetch_document(&url).await {
            Ok(raw) => {
                let history = parse_history(&dom::parse(&raw));
                debug!("{}: {} history records", code, history.len());
                history
            }
            Err(e) => {
                warn!("history fetch failed for {}: {}", code, e);
                Vec::new()
            }
        }
    }

    /// 指数1本分を取得する。失敗しても他の指数には影響しない。
    async fn fetch_index(&self, index_code: &str, name: &str) -> IndexInfo {
        let url = format!("{}/stock/chart?code={}", self.config.base_url, index_code);
        match self.fetch_document(&url).await {
            Ok(raw) => parse_index(&dom::parse(&raw), name),
            Err(e) => {
                warn!("index fetch failed for {}: {}", name, e);
                IndexInfo::unavailable(name)
            }
        }
    }
}

#[async_trait]
impl StockInfoSource for KabutanScraper {
    fn site_code(&self) -> &'static str {
        "KABUTAN"
    }

    async fn stock_details(&self, code: &StockCode) -> StockDetails {
        let url = format!("{}/stock/?code={}", self.config.base_url, code);
        let raw = match self.fetch_document(&url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("details fetch failed for {}: {}", code, e);
                return StockDetails::not_found(code);
            }
        };

        // Htmlツリーは!Sendなので、awaitをまたぐ前に所有データへ落とす
        let fields = extract_detail_fields(&dom::parse(&raw));

        // ニュースと履歴は互いに依存しないので同時に取得する
        let (news, history) = tokio::join!(self.fetch_news(code), self.fetch_history(code));

        info!("assembled details for {}", code);
        assemble_details(code, fields, news, history)
    }

    async fn news(&self, code: &StockCode) -> Vec<NewsItem> {
        self.fetch_news(code).await
    }

    async fn history(&self, code: &StockCode) -> Vec<Ohlcv> {
        self.fetch_history(code).await
    }

    async fn market_indices(&self) -> MarketIndices {
        let (nikkei225, topix, futures) = tokio::join!(
            self.fetch_index(NIKKEI_225.0, NIKKEI_225.1),
            self.fetch_index(TOPIX.0, TOPIX.1),
            self.fetch_index(NIKKEI_FUTURES.0, NIKKEI_FUTURES.1),
        );

        MarketIndices {
            nikkei225,
            topix,
            futures,
        }
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| SENTINEL.to_string())
}

/// 抽出済みフィールドから不変のレコードを組み立てる。
///
/// すべてのスカラーは実値か番兵値のどちらかで必ず埋まる。
fn assemble_details(
    code: &StockCode,
    fields: DetailFields,
    news: Vec<NewsItem>,
    history: Vec<Ohlcv>,
) -> StockDetails {
    StockDetails {
        code: code.to_string(),
        name: or_sentinel(fields.name),
        market: or_sentinel(fields.market),
        current_price: or_sentinel(fields.current_price),
        change: or_sentinel(fields.change),
        change_percent: or_sentinel(fields.change_percent),
        vwap: or_sentinel(fields.vwap),
        volume: or_sentinel(fields.volume),
        margin_buy: or_sentinel(fields.margin_buy),
        margin_sell: or_sentinel(fields.margin_sell),
        margin_ratio: or_sentinel(fields.margin_ratio),
        ma25_diff: or_sentinel(fields.ma25_diff),
        ma75_diff: or_sentinel(fields.ma75_diff),
        dividend_yield: or_sentinel(fields.dividend_yield),
        ex_dividend_date: or_sentinel(fields.ex_dividend_date),
        benefit_date: or_sentinel(fields.benefit_date),
        settlement_date: or_sentinel(fields.settlement_date),
        news,
        history,
    }
}

/// 銘柄詳細ページの固定抽出パイプライン。
fn extract_detail_fields(doc: &Html) -> DetailFields {
    let (change, change_percent) = extract_change_pair(doc);
    let (margin_sell, margin_buy, margin_table_ratio) = extract_margin_row(doc);
    let (ma25_diff, ma75_diff) = extract_ma_deviation(doc);

    DetailFields {
        name: extract_company_name(doc),
        market: extract_market(doc),
        current_price: extract_price(doc),
        change,
        change_percent,
        vwap: locate(doc, "VWAP", MatchMode::Fuzzy),
        volume: locate(doc, "出来高", MatchMode::Fuzzy),
        dividend_yield: locate(doc, "利回り", MatchMode::Fuzzy),
        // 専用テーブルの値を優先し、無ければラベル探索に落ちる
        margin_ratio: margin_table_ratio.or_else(|| locate(doc, "信用倍率", MatchMode::Fuzzy)),
        settlement_date: locate(doc, "決算発表日", MatchMode::Fuzzy),
        ex_dividend_date: locate(doc, "権利落日", MatchMode::Fuzzy),
        benefit_date: locate(doc, "優待権利日", MatchMode::Fuzzy),
        margin_sell,
        margin_buy,
        ma25_diff,
        ma75_diff,
    }
}

/// 見出しテキストから先頭の4桁コードを落とした銘柄名。
fn extract_company_name(doc: &Html) -> Option<String> {
    let h3 = doc.select(&COMPANY_NAME).next()?;
    let name = CODE_PREFIX.replace(&dom::text_of(h3), "").to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn extract_market(doc: &Html) -> Option<String> {
    let span = doc.select(&MARKET_LABEL).next()?;
    let market = dom::text_of(span);
    if market.is_empty() {
        None
    } else {
        Some(market)
    }
}

fn extract_price(doc: &Html) -> Option<String> {
    let el = doc.select(&KABUKA).next()?;
    let price = dom::text_of(el);
    if price.is_empty() {
        None
    } else {
        Some(price)
    }
}

/// 前日比と騰落率の2値定義リストブロック。騰落率は`%`を落とす。
fn extract_change_pair(doc: &Html) -> (Option<String>, Option<String>) {
    let dds: Vec<String> = doc.select(&CHANGE_PAIR).map(dom::text_of).collect();
    if dds.len() < 2 {
        return (None, None);
    }
    let change = (!dds[0].is_empty()).then(|| dds[0].clone());
    let percent = dds[1].replace('%', "");
    let change_percent = (!percent.is_empty()).then_some(percent);
    (change, change_percent)
}

/// 「信用取引」見出しに続くテーブルの先頭本体行から 売残/買残/倍率 を読む。
fn extract_margin_row(doc: &Html) -> (Option<String>, Option<String>, Option<String>) {
    let heading = doc
        .select(&HEADING)
        .find(|h| dom::text_of(*h).contains("信用取引"));
    let first_row = heading
        .and_then(dom::find_next_table)
        .and_then(|t| t.select(&BODY_ROW).next());

    let Some(row) = first_row else {
        return (None, None, None);
    };
    let cells: Vec<String> = row.select(&DATA_CELL).map(dom::text_of).collect();
    if cells.len() < 3 {
        return (None, None, None);
    }
    let value = |s: &String| (!s.is_empty()).then(|| s.clone());
    (value(&cells[0]), value(&cells[1]), value(&cells[2]))
}

/// 株価トレンドブロックの2行（ラベル行/値行）から 25日/75日 乖離率を読む。
fn extract_ma_deviation(doc: &Html) -> (Option<String>, Option<String>) {
    let Some(block) = doc.select(&TREND_BLOCK).next() else {
        return (None, None);
    };
    let rows: Vec<ElementRef> = block.select(&ROW).collect();
    if rows.len() < 2 {
        return (None, None);
    }
    let headers: Vec<String> = rows[0].select(&CELL).map(dom::text_of).collect();
    let values: Vec<String> = rows[1].select(&CELL).map(dom::text_of).collect();

    let mut ma25 = None;
    let mut ma75 = None;
    for (i, header) in headers.iter().enumerate() {
        let value = values.get(i).filter(|v| !v.is_empty());
        if header.contains("25日") {
            ma25 = value.cloned();
        }
        if header.contains("75日") {
            ma75 = value.cloned();
        }
    }
    (ma25, ma75)
}

/// ニューステーブルからリンク付き行を文書順に読む。上限`limit`件。
fn parse_news(doc: &Html, origin: &str, limit: usize) -> Vec<NewsItem> {
    let mut items = Vec::new();
    for row in table::row_elements(doc, &NEWS_TABLE) {
        if items.len() >= limit {
            break;
        }
        let Some(link) = row.select(&LINK).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", origin, href)
        };

        let title = dom::text_of(link);
        let date = row
            .select(&NEWS_DATE)
            .next()
            .map(|td| dom::text_of(td))
            .unwrap_or_default();
        let title = if date.is_empty() {
            title
        } else {
            format!("[{}] {}", date, title)
        };

        items.push(NewsItem { title, url });
    }
    items
}

/// 日足・週/月足の両テーブルを1本の昇順OHLCV列へまとめる。
fn parse_history(doc: &Html) -> Vec<Ohlcv> {
    let mut history = Vec::new();
    for row in table::body_row_elements(doc, &HISTORY_TABLES) {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        if cells.len() < HISTORY_MIN_CELLS {
            continue;
        }
        match history_record(&cells) {
            Ok(record) => history.push(record),
            Err(e) => {
                // 1セルでも数値化できない行はまるごと捨てる
                debug!("dropping history row: {}", e);
            }
        }
    }
    // ISO日付文字列の辞書順は日付順に一致する（安定ソート）
    history.sort_by(|a, b| a.date.cmp(&b.date));
    history
}

/// 1行分のOHLCVレコード。数値変換に1つでも失敗したらエラー。
fn history_record(cells: &[ElementRef]) -> Result<Ohlcv> {
    // 日付は表示テキストより machine-readable な datetime 属性を優先する
    let date_text = cells[0]
        .select(&TIME_TAG)
        .next()
        .and_then(|t| t.value().attr("datetime").map(str::to_string))
        .unwrap_or_else(|| dom::text_of(cells[0]));
    let date = util::normalize_date(&date_text);

    let open = util::parse_f64(&dom::text_of(cells[1]))?;
    let high = util::parse_f64(&dom::text_of(cells[2]))?;
    let low = util::parse_f64(&dom::text_of(cells[3]))?;
    let close = util::parse_f64(&dom::text_of(cells[4]))?;
    let volume = util::parse_i64(&dom::text_of(cells[HISTORY_VOLUME_CELL]))?;

    Ok(Ohlcv {
        date,
        open,
        high,
        low,
        close,
        volume,
        vwap: util::round2((high + low + close) / 3.0),
    })
}

/// 指数ページから価格と前日比を読む。名前は固定。
fn parse_index(doc: &Html, name: &str) -> IndexInfo {
    let (change, change_percent) = extract_change_pair(doc);
    IndexInfo {
        name: name.to_string(),
        price: or_sentinel(extract_price(doc)),
        change: or_sentinel(change),
        change_percent: or_sentinel(change_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const DETAILS_PAGE: &str = r#"
        <div class="company_block">
          <h3>7203 トヨタ自動車</h3>
          <span class="market">東証Ｐ</span>
        </div>
        <div class="si_i1">
          <span class="kabuka">2,803.5円</span>
          <dl class="si_i1_dl1"><dt>前日比</dt><dd>+21.5</dd><dd>+0.77%</dd></dl>
        </div>
        <div id="stockinfo_i2">
          <dl><dt>VWAP</dt><dd>2,795.8円</dd></dl>
          <dl><dt>出来高</dt><dd>25,431,900株</dd></dl>
          <dl><dt>利回り</dt><dd>2.85%</dd></dl>
        </div>
        <table>
          <tr><th>決算発表日</th><td>24/05/08</td></tr>
          <tr><th>権利落日</th><td>24/03/28</td></tr>
          <tr><th>優待権利日</th><td>3月末</td></tr>
        </table>
        <h2>信用取引情報</h2>
        <table>
          <thead><tr><th>売残</th><th>買残</th><th>倍率</th></tr></thead>
          <tbody><tr><td>123,400</td><td>987,600</td><td>8.00</td></tr></tbody>
        </table>
        <div class="kabuka_trend">
          <table>
            <tr><th>25日</th><th>75日</th></tr>
            <tr><td>+2.15%</td><td>-1.08%</td></tr>
          </table>
        </div>
    "#;

    fn code(s: &str) -> StockCode {
        StockCode::new(s).unwrap()
    }

    #[test]
    fn details_pipeline_extracts_all_fields() {
        let doc = dom::parse(DETAILS_PAGE);
        let fields = extract_detail_fields(&doc);
        assert_eq!(fields.name.as_deref(), Some("トヨタ自動車"));
        assert_eq!(fields.market.as_deref(), Some("東証Ｐ"));
        assert_eq!(fields.current_price.as_deref(), Some("2,803.5円"));
        assert_eq!(fields.change.as_deref(), Some("+21.5"));
        assert_eq!(fields.change_percent.as_deref(), Some("+0.77"));
        assert_eq!(fields.vwap.as_deref(), Some("2,795.8円"));
        assert_eq!(fields.volume.as_deref(), Some("25,431,900株"));
        assert_eq!(fields.dividend_yield.as_deref(), Some("2.85%"));
        assert_eq!(fields.margin_sell.as_deref(), Some("123,400"));
        assert_eq!(fields.margin_buy.as_deref(), Some("987,600"));
        assert_eq!(fields.margin_ratio.as_deref(), Some("8.00"));
        assert_eq!(fields.ma25_diff.as_deref(), Some("+2.15%"));
        assert_eq!(fields.ma75_diff.as_deref(), Some("-1.08%"));
        assert_eq!(fields.settlement_date.as_deref(), Some("24/05/08"));
        assert_eq!(fields.ex_dividend_date.as_deref(), Some("24/03/28"));
        assert_eq!(fields.benefit_date.as_deref(), Some("3月末"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = assemble_details(
            &code("7203"),
            extract_detail_fields(&dom::parse(DETAILS_PAGE)),
            Vec::new(),
            Vec::new(),
        );
        let second = assemble_details(
            &code("7203"),
            extract_detail_fields(&dom::parse(DETAILS_PAGE)),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn degraded_page_fills_sentinels() {
        let doc = dom::parse("<html><body><p>メンテナンス中</p></body></html>");
        let details = assemble_details(
            &code("7203"),
            extract_detail_fields(&doc),
            Vec::new(),
            Vec::new(),
        );
        for field in [
            &details.name,
            &details.market,
            &details.current_price,
            &details.change,
            &details.change_percent,
            &details.vwap,
            &details.volume,
            &details.margin_buy,
            &details.margin_sell,
            &details.margin_ratio,
            &details.ma25_diff,
            &details.ma75_diff,
            &details.dividend_yield,
            &details.ex_dividend_date,
            &details.benefit_date,
            &details.settlement_date,
        ] {
            assert_eq!(field.as_str(), SENTINEL);
        }
    }

    #[test]
    fn news_is_capped_in_document_order() {
        let mut rows = String::new();
        for i in 0..30 {
            rows.push_str(&format!(
                "<tr><td class=\"date\">24/05/{:02}</td>\
                 <td><a href=\"/stock/news?b=k2024{:02}\">ニュース{}</a></td></tr>",
                i + 1,
                i,
                i
            ));
        }
        let raw = format!("<table class=\"s_news_list\">{}</table>", rows);
        let items = parse_news(&dom::parse(&raw), "https://kabutan.jp", 15);

        assert_eq!(items.len(), 15);
        assert_eq!(items[0].title, "[24/05/01] ニュース0");
        assert_eq!(items[0].url, "https://kabutan.jp/stock/news?b=k202400");
        assert_eq!(items[14].title, "[24/05/15] ニュース14");
    }

    #[test]
    fn news_keeps_absolute_urls_and_skips_linkless_rows() {
        let raw = "<table class=\"s_news_list\">\
             <tr><td>リンクなし行</td></tr>\
             <tr><td><a href=\"https://example.com/ir.pdf\">決算短信</a></td></tr>\
           </table>";
        let items = parse_news(&dom::parse(raw), "https://kabutan.jp", 15);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "決算短信");
        assert_eq!(items[0].url, "https://example.com/ir.pdf");
    }

    const HISTORY_PAGE: &str = r#"
        <table class="stock_kabuka0">
          <thead><tr><th>日付</th><th>始値</th><th>高値</th><th>安値</th><th>終値</th>
                 <th>前日比</th><th>騰落率</th><th>売買高</th></tr></thead>
          <tbody>
            <tr><th><time datetime="2024-05-17">24/05/17</time></th>
                <td>2,780</td><td>2,815</td><td>2,770</td><td>2,803.5</td>
                <td>+21.5</td><td>+0.77</td><td>25,431,900</td></tr>
            <tr><th><time datetime="2024-05-16">24/05/16</time></th>
                <td>2,760</td><td>2,790</td><td>2,750</td><td>2,782</td>
                <td>-10</td><td>-0.36</td><td>出来ず</td></tr>
          </tbody>
        </table>
        <table class="stock_kabuka_dwm">
          <tbody>
            <tr><th>24/05/10</th>
                <td>2,700</td><td>2,760</td><td>2,690</td><td>2,755</td>
                <td>+55</td><td>+2.04</td><td>98,000,000</td></tr>
          </tbody>
        </table>
    "#;

    #[test]
    fn history_merges_tables_sorted_ascending() {
        let history = parse_history(&dom::parse(HISTORY_PAGE));
        // 売買高が数値化できない 05/16 の行は落ちる
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-05-10");
        assert_eq!(history[1].date, "2024-05-17");
        assert_eq!(history[1].open, 2780.0);
        assert_eq!(history[1].volume, 25_431_900);
    }

    #[test]
    fn history_vwap_is_typical_price() {
        let history = parse_history(&dom::parse(HISTORY_PAGE));
        for record in &history {
            let expected = util::round2((record.high + record.low + record.close) / 3.0);
            assert_eq!(record.vwap, expected);
        }
        // (2815 + 2770 + 2803.5) / 3 = 2796.1666…
        assert_eq!(history[1].vwap, 2796.17);
    }

    const INDEX_PAGE: &str = "<div class=\"si_i1\">\
         <span class=\"kabuka\">38,787.38</span>\
         <dl class=\"si_i1_dl1\"><dt>前日比</dt><dd>-132.88</dd><dd>-0.34%</dd></dl>\
       </div>";

    #[test]
    fn index_page_parses_price_and_change() {
        let info = parse_index(&dom::parse(INDEX_PAGE), "日経平均株価");
        assert_eq!(info.name, "日経平均株価");
        assert_eq!(info.price, "38,787.38");
        assert_eq!(info.change, "-132.88");
        assert_eq!(info.change_percent, "-0.34");
    }

    #[test]
    fn unreadable_index_page_degrades_to_sentinels() {
        let info = parse_index(&dom::parse("<p>503 Service Unavailable</p>"), "TOPIX");
        assert_eq!(info, IndexInfo::unavailable("TOPIX"));
    }

    /// リクエストパスに応じた固定応答を返すローカルHTTPスタブを立て、
    /// そのベースURLを返す。
    async fn spawn_stub_server(respond: fn(&str) -> String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    let _ = socket.write_all(respond(&path).as_bytes()).await;
                });
            }
        });
        format!("http://{}", addr)
    }

    fn http_500() -> String {
        "HTTP/1.1 500 Internal Server Error\r\n\
         content-length: 0\r\nconnection: close\r\n\r\n"
            .to_string()
    }

    fn http_200(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/html; charset=utf-8\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn server_error_yields_not_found_record() {
        let base = spawn_stub_server(|_| http_500()).await;
        let scraper = KabutanScraper::new(Config::new().with_base_url(&base)).unwrap();

        let details = scraper.stock_details(&code("7203")).await;
        assert!(details.is_not_found());
        assert!(details.news.is_empty());
        assert!(details.history.is_empty());

        // 個別取得でも空に劣化するだけでエラーにはならない
        assert!(scraper.news(&code("7203")).await.is_empty());
        assert!(scraper.history(&code("7203")).await.is_empty());
    }

    #[tokio::test]
    async fn topix_fetch_failure_leaves_sibling_indices_populated() {
        let base = spawn_stub_server(|path| {
            if path.contains("code=0010") {
                http_500()
            } else {
                http_200(INDEX_PAGE)
            }
        })
        .await;
        let scraper = KabutanScraper::new(Config::new().with_base_url(&base)).unwrap();

        let indices = scraper.market_indices().await;
        assert_eq!(indices.topix, IndexInfo::unavailable("TOPIX"));
        assert_eq!(indices.nikkei225.name, "日経平均株価");
        assert_eq!(indices.nikkei225.price, "38,787.38");
        assert_eq!(indices.futures.price, "38,787.38");
    }

    #[tokio::test]
    #[ignore] // 実サイトへのアクセスを伴うため通常は実行しない
    async fn live_fetch_toyota() {
        let scraper = KabutanScraper::new(Config::new()).unwrap();
        let details = scraper.stock_details(&code("7203")).await;
        assert!(!details.is_not_found());
        assert_ne!(details.current_price, SENTINEL);
    }
}
