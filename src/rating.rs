use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::news_client::{NewsApiError, NewsArticle, NewsClient};
use crate::sentiment::Lexicon;

/// Records with fewer articles than this are hidden by `hide_lownews`.
pub const MIN_ARTICLES_REQUIRED: usize = 3;

const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Why no rating could be produced for a ticker. Callers treat every
/// variant as "skip this ticker", never as a request failure.
#[derive(Debug, Error)]
pub enum Unavailable {
    /// Transport failure, including the per-request timeout
    #[error("news request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("news API returned {status}")]
    BadStatus { status: reqwest::StatusCode, body: String },
    #[error("news API response unreadable: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("no articles returned")]
    NoArticles,
    #[error("article has malformed date '{0}'")]
    BadDate(String),
}

impl From<NewsApiError> for Unavailable {
    fn from(e: NewsApiError) -> Self {
        match e {
            NewsApiError::Request(e) => Unavailable::Request(e),
            NewsApiError::Status { status, body } => Unavailable::BadStatus { status, body },
            NewsApiError::Decode(e) => Unavailable::Decode(e),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    /// `DD.MM.YYYY`
    pub date: String,
    pub score: i32,
}

/// Aggregated headline sentiment for one ticker over a date range.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingRecord {
    pub name: String,
    /// As-of date, `DD.MM.YYYY`
    pub date: String,
    pub rating: i32,
    /// 1 when `rating < 0`
    pub sell: u8,
    pub news: Vec<ScoredArticle>,
    pub news_count: usize,
}

impl RatingRecord {
    /// Score every article and average (floor division) into a record.
    pub fn from_articles(
        company: &str,
        articles: &[NewsArticle],
        lexicon: &Lexicon,
        as_of: NaiveDate,
    ) -> Result<Self, Unavailable> {
        if articles.is_empty() {
            return Err(Unavailable::NoArticles);
        }

        let news = articles
            .iter()
            .map(|article| {
                Ok(ScoredArticle {
                    title: article.title.clone(),
                    url: article.url.clone(),
                    source: article.source.title.clone(),
                    date: display_date(&article.date)?,
                    score: lexicon.score(&article.title),
                })
            })
            .collect::<Result<Vec<_>, Unavailable>>()?;

        let total: i64 = news.iter().map(|a| a.score as i64).sum();
        let rating = total.div_euclid(news.len() as i64) as i32;

        Ok(RatingRecord {
            name: company.to_string(),
            date: as_of.format(DISPLAY_DATE_FORMAT).to_string(),
            rating,
            sell: u8::from(rating < 0),
            news_count: news.len(),
            news,
        })
    }

    pub fn is_low_news(&self) -> bool {
        self.news_count < MIN_ARTICLES_REQUIRED
    }

    pub fn is_negative(&self) -> bool {
        self.rating < 0
    }
}

/// `2025-04-01T08:00:00Z` -> `01.04.2025`
fn display_date(iso: &str) -> Result<String, Unavailable> {
    let day = iso.get(..10).unwrap_or(iso);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .map_err(|_| Unavailable::BadDate(iso.to_string()))
}

/// Drives the news fetch + scoring pipeline for one or many tickers.
pub struct StockRater {
    news: NewsClient,
    lexicon: Arc<Lexicon>,
    concurrency: usize,
}

impl StockRater {
    pub fn new(news: NewsClient, lexicon: Arc<Lexicon>, concurrency: usize) -> Self {
        StockRater {
            news,
            lexicon,
            concurrency: concurrency.max(1),
        }
    }

    /// Rate one company. Failures are logged and returned as `Unavailable`.
    pub async fn rate(
        &self,
        company: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RatingRecord, Unavailable> {
        let result = match self.news.search_articles(company, start, end).await {
            Ok(articles) => RatingRecord::from_articles(
                company,
                &articles,
                &self.lexicon,
                Local::now().date_naive(),
            ),
            Err(e) => Err(Unavailable::from(e)),
        };

        match &result {
            Ok(record) => info!(
                "Rated {}: {} over {} articles",
                company, record.rating, record.news_count
            ),
            Err(Unavailable::NoArticles) => info!("No articles for {}", company),
            Err(e) => warn!("Rating unavailable for {}: {}", company, e),
        }
        result
    }

    /// Rate every company, skipping unavailable ones. Output keeps input order.
    pub async fn rate_all(
        &self,
        companies: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<RatingRecord> {
        let records: Vec<RatingRecord> = stream::iter(companies.iter().cloned())
            .map(|company| async move { self.rate(&company, start, end).await })
            .buffered(self.concurrency)
            .filter_map(|result| futures::future::ready(result.ok()))
            .collect()
            .await;

        info!("Rated {}/{} companies", records.len(), companies.len());
        records
    }
}
