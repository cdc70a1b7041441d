use crate::models::stock::{MarketIndices, NewsItem, Ohlcv, StockCode, StockDetails};
use async_trait::async_trait;

/// Base trait for stock information sources.
///
/// 取得失敗は各実装の内側で吸収され、劣化した（番兵値入りの）結果として
/// 返る。ここのメソッドからエラーが漏れることはない。
#[async_trait]
pub trait StockInfoSource {
    /// Get the site identifier this source scrapes.
    fn site_code(&self) -> &'static str;

    /// Fetch one full stock-details snapshot, news and history included.
    async fn stock_details(&self, code: &StockCode) -> StockDetails;

    /// Fetch the news list for a stock.
    async fn news(&self, code: &StockCode) -> Vec<NewsItem>;

    /// Fetch the OHLCV history for a stock, oldest first.
    async fn history(&self, code: &StockCode) -> Vec<Ohlcv>;

    /// Fetch the fixed market-index triple.
    async fn market_indices(&self) -> MarketIndices;
}
