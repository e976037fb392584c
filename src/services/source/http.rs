// src/services/source/http.rs

//! HTTP job source.
//!
//! Drives a server-rendered search page with plain GET requests and reads
//! result cards, recency text, posting dates and the next-page link with
//! configured CSS selectors.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ResultItem, SourceConfig, SourceSelectors};
use crate::services::source::{JobSource, JobSourceFactory};
use crate::utils::http::create_async_client;
use crate::utils::resolve_url;

/// A parsed results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsPage {
    pub items: Vec<ResultItem>,
    pub next_url: Option<String>,
}

/// Job source session backed by a reqwest client.
pub struct HttpJobSource {
    config: Arc<SourceConfig>,
    client: Client,
    search_url: Url,
    selectors: PageSelectors,
    recency_value: Option<String>,
    page: Option<ResultsPage>,
}

impl HttpJobSource {
    /// Create a session. Selectors are checked up front so a typo fails the run early.
    pub fn new(config: Arc<SourceConfig>) -> Result<Self> {
        let client = create_async_client(&config)?;
        let search_url = Url::parse(&config.search_url)?;
        let selectors = PageSelectors::parse(&config.selectors)?;

        Ok(Self {
            config,
            client,
            search_url,
            selectors,
            recency_value: None,
            page: None,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn load_page(&mut self, url: Url) -> Result<()> {
        let html = self.fetch(url.as_str()).await?;
        let page = parse_results_page(&html, &self.selectors, &url);
        log::debug!(
            "Loaded {} items from {} (next: {})",
            page.items.len(),
            url,
            page.next_url.is_some()
        );
        self.page = Some(page);
        Ok(())
    }

    fn current_page(&self) -> Result<&ResultsPage> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::query(&self.config.name, "no search has been run"))
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn navigate_to_search(&mut self) -> Result<()> {
        self.fetch(self.search_url.as_str())
            .await
            .map(|_| ())
            .map_err(|e| AppError::source_unavailable(format!("{}: {e}", self.search_url)))
    }

    async fn apply_recency_filter(&mut self, window_days: u32) -> Result<bool> {
        self.recency_value = match self.config.recency_param {
            Some(_) => self
                .config
                .recency_option_for(window_days)
                .map(|option| option.value.clone()),
            None => None,
        };
        Ok(self.recency_value.is_some())
    }

    async fn search(&mut self, keyword_query: &str, location_query: &str) -> Result<()> {
        let url = build_search_url(
            &self.search_url,
            &self.config,
            keyword_query,
            location_query,
            self.recency_value.as_deref(),
        );
        self.page = None;
        self.load_page(url).await
    }

    async fn list_result_items(&mut self) -> Result<Vec<ResultItem>> {
        Ok(self.current_page()?.items.clone())
    }

    async fn has_next_page(&mut self) -> Result<bool> {
        Ok(self.current_page()?.next_url.is_some())
    }

    async fn go_to_next_page(&mut self) -> Result<()> {
        let next = self
            .current_page()?
            .next_url
            .clone()
            .ok_or_else(|| AppError::query(&self.config.name, "no next page"))?;
        self.load_page(Url::parse(&next)?).await
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        self.recency_value = None;
        log::debug!("Closed {} session", self.config.name);
        Ok(())
    }
}

/// Opens a fresh `HttpJobSource` per worker.
pub struct HttpJobSourceFactory {
    config: Arc<SourceConfig>,
}

impl HttpJobSourceFactory {
    pub fn new(config: Arc<SourceConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl JobSourceFactory for HttpJobSourceFactory {
    async fn open(&self) -> Result<Box<dyn JobSource>> {
        let source = HttpJobSource::new(Arc::clone(&self.config))
            .map_err(AppError::source_unavailable)?;
        Ok(Box::new(source))
    }
}

/// Compiled result page selectors, parsed once per session.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    item: Selector,
    recency: Option<Selector>,
    posted_date: Option<Selector>,
    posted_date_attr: String,
    link: Option<Selector>,
    next_page: Selector,
}

impl PageSelectors {
    pub fn parse(selectors: &SourceSelectors) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&selectors.item)?,
            recency: selectors.recency.as_deref().map(parse_selector).transpose()?,
            posted_date: selectors
                .posted_date
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            posted_date_attr: selectors.posted_date_attr.clone(),
            link: selectors.link.as_deref().map(parse_selector).transpose()?,
            next_page: parse_selector(&selectors.next_page)?,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Search URL for one keyword + location query, with the recency filter if set.
pub fn build_search_url(
    base: &Url,
    config: &SourceConfig,
    keyword_query: &str,
    location_query: &str,
    recency_value: Option<&str>,
) -> Url {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair(&config.keyword_param, keyword_query)
            .append_pair(&config.location_param, location_query);
        if let (Some(param), Some(value)) = (&config.recency_param, recency_value) {
            query.append_pair(param, value);
        }
    }
    url
}

/// Parse one results page.
pub fn parse_results_page(html: &str, selectors: &PageSelectors, page_url: &Url) -> ResultsPage {
    let document = Html::parse_document(html);

    let items = document
        .select(&selectors.item)
        .map(|card| parse_card(&card, selectors, page_url))
        .collect();

    let next_url = document
        .select(&selectors.next_page)
        .filter(|el| !is_disabled(el))
        .find_map(|el| el.value().attr("href"))
        .filter(|href| !href.trim().is_empty() && !href.starts_with('#'))
        .map(|href| resolve_url(page_url, href));

    ResultsPage { items, next_url }
}

fn parse_card(card: &ElementRef, selectors: &PageSelectors, page_url: &Url) -> ResultItem {
    let text = selectors
        .recency
        .as_ref()
        .and_then(|sel| card.select(sel).next())
        .map(|el| element_text(&el))
        .unwrap_or_else(|| element_text(card));

    let posted_on = selectors
        .posted_date
        .as_ref()
        .and_then(|sel| card.select(sel).next())
        .and_then(|el| el.value().attr(&selectors.posted_date_attr))
        .and_then(parse_posted_date);

    let id = selectors
        .link
        .as_ref()
        .and_then(|sel| card.select(sel).next())
        .and_then(|el| el.value().attr("href"))
        .map(|href| resolve_url(page_url, href));

    ResultItem {
        id,
        text,
        posted_on,
    }
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_disabled(el: &ElementRef) -> bool {
    let value = el.value();
    value.attr("disabled").is_some() || value.attr("aria-disabled") == Some("true")
}

/// Accepts RFC 3339 timestamps (taken as a UTC date) and plain `YYYY-MM-DD` dates.
fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul>
            <li data-testid="job-card-1">
              <a href="/individuals/jobs/details/111">Chef</a>
              <span>Cairns QLD 4870</span>
              <span class="age">Added 2 days ago</span>
            </li>
            <li data-testid="job-card-2">
              <a href="/individuals/jobs/details/222">Housekeeper</a>
              <time datetime="2025-08-01T09:30:00+10:00">1 Aug</time>
              <span class="age">Added 20 days ago</span>
            </li>
          </ul>
          <nav>
            <a aria-label="Next" href="?page=2">Next</a>
          </nav>
        </body></html>
    "#;

    fn selectors() -> PageSelectors {
        PageSelectors::parse(&SourceSelectors::default()).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://jobs.example/individuals/jobs/search?searchText=chef").unwrap()
    }

    #[test]
    fn test_parse_cards_and_next_link() {
        let page = parse_results_page(PAGE, &selectors(), &page_url());

        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.items[0].id.as_deref(),
            Some("https://jobs.example/individuals/jobs/details/111")
        );
        assert!(page.items[0].text.contains("Added 2 days ago"));
        assert_eq!(page.items[0].posted_on, None);
        // 09:30 at +10:00 is still 31 July in UTC.
        assert_eq!(
            page.items[1].posted_on,
            NaiveDate::from_ymd_opt(2025, 7, 31)
        );
        assert_eq!(
            page.next_url.as_deref(),
            Some("https://jobs.example/individuals/jobs/search?page=2")
        );
    }

    #[test]
    fn test_recency_selector_narrows_text() {
        let selectors = PageSelectors::parse(&SourceSelectors {
            recency: Some("span.age".into()),
            ..SourceSelectors::default()
        })
        .unwrap();
        let page = parse_results_page(PAGE, &selectors, &page_url());
        assert_eq!(page.items[0].text, "Added 2 days ago");
    }

    #[test]
    fn test_disabled_next_control_ends_pagination() {
        let html = r#"
            <div data-testid="job-card-1">Added today</div>
            <a aria-label="Next" aria-disabled="true" href="?page=2">Next</a>
            <button aria-label="Next" disabled>Next</button>
        "#;
        let page = parse_results_page(html, &selectors(), &page_url());
        assert_eq!(page.items.len(), 1);
        assert!(page.next_url.is_none());
    }

    #[test]
    fn test_empty_page() {
        let page = parse_results_page("<html></html>", &selectors(), &page_url());
        assert!(page.items.is_empty());
        assert!(page.next_url.is_none());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let selectors = SourceSelectors {
            item: "[[invalid".into(),
            ..SourceSelectors::default()
        };
        assert!(matches!(
            PageSelectors::parse(&selectors),
            Err(AppError::Selector { .. })
        ));

        let config = SourceConfig {
            selectors,
            ..SourceConfig::default()
        };
        assert!(matches!(
            HttpJobSource::new(Arc::new(config)),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn test_parse_posted_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 8, 14);
        assert_eq!(parse_posted_date("2025-08-14"), expected);
        assert_eq!(parse_posted_date("2025-08-14T23:00:00Z"), expected);
        assert_eq!(parse_posted_date("14 Aug"), None);
    }

    #[test]
    fn test_offset_timestamp_is_dated_in_utc() {
        // Posted at 19:00Z on the 19th; the site renders it as the 20th.
        let posted_on = parse_posted_date("2025-08-20T05:00:00+10:00").unwrap();
        assert_eq!(posted_on, NaiveDate::from_ymd_opt(2025, 8, 19).unwrap());

        let item = ResultItem {
            posted_on: Some(posted_on),
            ..ResultItem::from_text("Chef")
        };
        let today_utc = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();
        assert_eq!(
            crate::services::recency::classify(&item, 10, today_utc),
            crate::models::Recency::Within
        );
    }

    #[test]
    fn test_search_url_carries_query_and_filter() {
        let config = SourceConfig::default();
        let base = Url::parse(&config.search_url).unwrap();

        let url = build_search_url(&base, &config, "farm OR harvest", "4870", Some("14"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("searchText".to_string(), "farm OR harvest".to_string()),
                ("locationSearch".to_string(), "4870".to_string()),
                ("jobAge".to_string(), "14".to_string()),
            ]
        );
        assert_eq!(url.path(), base.path());

        let unfiltered = build_search_url(&base, &config, "farm", "0800", None);
        assert!(!unfiltered.query_pairs().any(|(k, _)| k == "jobAge"));

        let no_param = SourceConfig {
            recency_param: None,
            ..config
        };
        let url = build_search_url(&base, &no_param, "farm", "0800", Some("14"));
        assert_eq!(url.query_pairs().count(), 2);
    }

    #[tokio::test]
    async fn test_recency_filter_capability() {
        let source = SourceConfig::default();
        let mut session = HttpJobSource::new(Arc::new(source.clone())).unwrap();
        assert!(session.apply_recency_filter(10).await.unwrap());
        assert_eq!(session.recency_value.as_deref(), Some("14"));
        assert!(!session.apply_recency_filter(60).await.unwrap());
        assert!(session.recency_value.is_none());

        let no_filter = SourceConfig {
            recency_param: None,
            ..source
        };
        let mut session = HttpJobSource::new(Arc::new(no_filter)).unwrap();
        assert!(!session.apply_recency_filter(10).await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_before_search_is_query_error() {
        let mut session = HttpJobSource::new(Arc::new(SourceConfig::default())).unwrap();
        assert!(matches!(
            session.list_result_items().await,
            Err(AppError::Query { .. })
        ));
        session.close().await.unwrap();
    }
}
