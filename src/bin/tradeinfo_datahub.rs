use tradeinfo_datahub::config::Config;
use tradeinfo_datahub::scrapers::kabutan::KabutanScraper;
use tradeinfo_datahub::services::stock_service::StockService;

use anyhow::Result;
use clap::{App, Arg, SubCommand};
use log::info;
use std::sync::Arc;

fn code_arg<'a>() -> Arg<'a> {
    Arg::with_name("code")
        .short('c')
        .long("code")
        .value_name("CODE")
        .help("4-digit stock code (e.g. 7203)")
        .required(true)
        .takes_value(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let app = App::new("TradeInfo DataHub")
        .version("0.3.0")
        .author("TradeInfo Team")
        .about("Stock information extraction engine for kabutan.jp")
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("HTTP timeout per fetch")
                .takes_value(true)
                .default_value("10"),
        )
        .subcommand(
            SubCommand::with_name("details")
                .about("Fetch the full stock-details snapshot")
                .arg(code_arg()),
        )
        .subcommand(
            SubCommand::with_name("news")
                .about("Fetch the news list for a stock")
                .arg(code_arg()),
        )
        .subcommand(
            SubCommand::with_name("history")
                .about("Fetch OHLCV history for a stock, oldest first")
                .arg(code_arg()),
        )
        .subcommand(SubCommand::with_name("indices").about("Fetch the market index snapshot"));

    let matches = app.get_matches();

    let timeout = matches
        .value_of("timeout")
        .unwrap_or("10")
        .parse::<u64>()
        .unwrap_or(10);

    let config = Config::new().with_timeout_secs(timeout);
    let scraper = KabutanScraper::new(config)?;
    let service = StockService::new(Arc::new(scraper));

    if let Some(matches) = matches.subcommand_matches("details") {
        let code = matches.value_of("code").unwrap();
        let details = service.stock_details(code).await?;
        if details.is_not_found() {
            info!("Stock {} not found", code);
        }
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else if let Some(matches) = matches.subcommand_matches("news") {
        let code = matches.value_of("code").unwrap();
        let news = service.news(code).await?;
        info!("Fetched {} news items for {}", news.len(), code);
        println!("{}", serde_json::to_string_pretty(&news)?);
    } else if let Some(matches) = matches.subcommand_matches("history") {
        let code = matches.value_of("code").unwrap();
        let history = service.history(code).await?;
        info!("Fetched {} history records for {}", history.len(), code);
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else if matches.subcommand_matches("indices").is_some() {
        let indices = service.market_indices().await;
        println!("{}", serde_json::to_string_pretty(&indices)?);
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
