// 公開モジュール。外部（APIレイヤー等）から利用される
pub mod errors;
pub mod models;
pub mod services;

// 主プログラムのために公開しているが、ライブラリ利用では内部モジュール
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod extract;
#[doc(hidden)]
pub mod scrapers;
#[doc(hidden)]
pub mod util;

// よく使う型の再エクスポート
pub use config::Config;
pub use errors::{Result, TradeInfoError};
pub use models::stock::{
    IndexInfo, MarketIndices, NewsItem, Ohlcv, StockCode, StockDetails,
};
pub use scrapers::kabutan::KabutanScraper;
pub use services::stock_service::StockService;
