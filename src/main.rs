use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use stock_sentiment::config::Config;
use stock_sentiment::dashboard::{start_dashboard, AppState};
use stock_sentiment::directory::CompanyDirectory;
use stock_sentiment::logging;
use stock_sentiment::news_client::NewsClient;
use stock_sentiment::rating::StockRater;
use stock_sentiment::sentiment::Lexicon;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging (stdout + log file)
    logging::init(&config.log_path)?;

    info!("Stock sentiment service starting");

    if config.news_api_key.is_empty() {
        warn!("NEWS_API_KEY not set; news requests will likely be rejected");
    }

    // Word lists are read once and never reloaded
    let lexicon = Arc::new(Lexicon::load(
        &config.positive_words_path,
        &config.negative_words_path,
    ));
    if lexicon.positive().is_empty() && lexicon.negative().is_empty() {
        warn!("Both word lists are empty; every headline will score 0");
    }

    let news = NewsClient::new(&config)?;
    let rater = StockRater::new(news, lexicon, config.rating_concurrency);
    let directory = CompanyDirectory::new(&config)?;

    let state = AppState {
        directory: Arc::new(directory),
        rater: Arc::new(rater),
        log_path: PathBuf::from(&config.log_path),
    };

    start_dashboard(&config, state).await
}
