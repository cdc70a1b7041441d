use crate::errors::Result;
use crate::models::stock::{MarketIndices, NewsItem, Ohlcv, StockCode, StockDetails};
use crate::scrapers::base::StockInfoSource;
use log::info;
use std::sync::Arc;

/// 株式情報サービス。コード検証と情報源への委譲を担う。
///
/// APIレイヤーが消費する4つの入口操作だけを公開する。コード検証は
/// ネットワークアクセスの前に行われ、不正コードだけがエラーになる。
/// 取得・抽出の失敗は情報源の側で劣化データに吸収済み。
pub struct StockService {
    source: Arc<dyn StockInfoSource + Send + Sync>,
}

impl StockService {
    /// 新しいサービスインスタンスを生成する。
    pub fn new(source: Arc<dyn StockInfoSource + Send + Sync>) -> Self {
        Self { source }
    }

    /// 銘柄詳細スナップショットを取得する。
    ///
    /// ページを解釈できなかった場合は `name == "Error"` のレコードが返る。
    pub async fn stock_details(&self, code: &str) -> Result<StockDetails> {
        let code = StockCode::new(code)?;
        info!("Fetching stock details for {} from {}", code, self.source.site_code());
        Ok(self.source.stock_details(&code).await)
    }

    /// 銘柄ニュース一覧を取得する。
    pub async fn news(&self, code: &str) -> Result<Vec<NewsItem>> {
        let code = StockCode::new(code)?;
        Ok(self.source.news(&code).await)
    }

    /// OHLCV履歴を取得する（古い順）。
    pub async fn history(&self, code: &str) -> Result<Vec<Ohlcv>> {
        let code = StockCode::new(code)?;
        Ok(self.source.history(&code).await)
    }

    /// 市場三指数のスナップショットを取得する。
    pub async fn market_indices(&self) -> MarketIndices {
        self.source.market_indices().await
    }
}
