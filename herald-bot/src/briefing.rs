//! Morning briefing data scraped from public pages: weather per city, official USD rate,
//! Bitcoin price and the most-read news.
//!
//! Every fetch is bounded by the client timeout. A page that fails to load or parse yields
//! `None` for its field; the report renders those as `N/A`.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; herald-bot)";
const NEWS_LIMIT: usize = 3;

/// One city and the page its temperature is read from.
#[derive(Debug, Clone)]
pub struct CityPage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityWeather {
    pub city: String,
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinQuote {
    pub price: String,
    pub change: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Briefing {
    pub weather: Vec<CityWeather>,
    pub usd_rate: Option<String>,
    pub bitcoin: Option<BitcoinQuote>,
    pub news: Option<Vec<String>>,
}

#[async_trait]
pub trait BriefingSource: Send + Sync {
    /// Never fails; missing pieces are `None`.
    async fn collect(&self) -> Briefing;
}

/// Source page URLs; overridable for tests.
#[derive(Debug, Clone)]
pub struct BriefingPages {
    pub cities: Vec<CityPage>,
    pub usd_rate_url: String,
    pub bitcoin_url: String,
    pub news_url: String,
}

impl Default for BriefingPages {
    fn default() -> Self {
        let city = |name: &str, url: &str| CityPage {
            name: name.to_string(),
            url: url.to_string(),
        };
        Self {
            cities: vec![
                city("Kyiv", "https://meteo.ua/ua/34/kiev"),
                city("Rivne", "https://meteo.ua/ua/28/rovno"),
                city("Kosiv", "https://meteo.ua/ua/16532/kosov"),
                city("Odesa", "https://meteo.ua/ua/111/odessa"),
            ],
            usd_rate_url: "https://bank.gov.ua/ua/markets/exchangerates".to_string(),
            bitcoin_url: "https://finance.ua/ua/crypto/btc".to_string(),
            news_url: "https://www.pravda.ua/".to_string(),
        }
    }
}

pub struct WebBriefingSource {
    client: reqwest::Client,
    pages: BriefingPages,
}

impl WebBriefingSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_pages(timeout, BriefingPages::default())
    }

    pub fn with_pages(timeout: Duration, pages: BriefingPages) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, pages })
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Briefing page request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Briefing page returned an error status");
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url, error = %e, "Briefing page body unreadable");
                None
            }
        }
    }

    async fn weather(&self, city: &CityPage) -> CityWeather {
        let temperature = self
            .fetch(&city.url)
            .await
            .and_then(|html| parse_temperature(&html));
        CityWeather {
            city: city.name.clone(),
            temperature,
        }
    }
}

#[async_trait]
impl BriefingSource for WebBriefingSource {
    async fn collect(&self) -> Briefing {
        let weather = join_all(self.pages.cities.iter().map(|city| self.weather(city)));
        let usd = self.fetch(&self.pages.usd_rate_url);
        let bitcoin = self.fetch(&self.pages.bitcoin_url);
        let news = self.fetch(&self.pages.news_url);
        let (weather, usd, bitcoin, news) = tokio::join!(weather, usd, bitcoin, news);

        let briefing = Briefing {
            weather,
            usd_rate: usd.and_then(|html| parse_usd_rate(&html)),
            bitcoin: bitcoin.and_then(|html| parse_bitcoin(&html)),
            news: news.and_then(|html| parse_top_news(&html, NEWS_LIMIT)),
        };
        debug!(?briefing, "Briefing collected");
        briefing
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

pub fn parse_temperature(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let degree = selector(".menu-basic__degree")?;
    document
        .select(&degree)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// The official rate from the row whose letter code is `USD`.
pub fn parse_usd_rate(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let row = selector("tr")?;
    let code = selector(r#"td[data-label="Код літерний"]"#)?;
    let rate = selector(r#"td[data-label="Офіційний курс"]"#)?;

    document
        .select(&row)
        .find(|tr| {
            tr.select(&code)
                .next()
                .is_some_and(|td| element_text(td) == "USD")
        })
        .and_then(|tr| tr.select(&rate).next())
        .map(element_text)
        .filter(|t| !t.is_empty())
}

pub fn parse_bitcoin(html: &str) -> Option<BitcoinQuote> {
    let document = Html::parse_document(html);
    let price = selector("div.MainInfostyles__Price-sc-1pcfgvi-16.gfcnFW")?;
    let trend = selector("div.MainInfostyles__Trend-sc-1pcfgvi-17.hwJIFp")?;

    let price = document
        .select(&price)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())?;
    let change = document
        .select(&trend)
        .next()
        .map(element_text)
        .unwrap_or_default();
    Some(BitcoinQuote { price, change })
}

/// Titles of the first `limit` entries in the "Popular by views" block.
pub fn parse_top_news(html: &str, limit: usize) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let block = selector(r#"div[data-vr-zone="Popular by views"]"#)?;
    let article = selector("div.article_popular")?;
    let link = selector("a")?;

    let block = document.select(&block).next()?;
    let titles: Vec<String> = block
        .select(&article)
        .filter_map(|a| a.select(&link).next().map(element_text))
        .filter(|t| !t.is_empty())
        .take(limit)
        .collect();
    (!titles.is_empty()).then_some(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temperature() {
        let html = r#"<div class="menu-basic"><span class="menu-basic__degree"> +18° </span></div>"#;
        assert_eq!(parse_temperature(html).as_deref(), Some("+18°"));
        assert_eq!(parse_temperature("<p>maintenance</p>"), None);
    }

    #[test]
    fn test_parse_usd_rate_picks_usd_row() {
        let html = r#"
            <table>
              <tr><td data-label="Код літерний">EUR</td><td data-label="Офіційний курс">44,90</td></tr>
              <tr><td data-label="Код літерний">USD</td><td data-label="Офіційний курс">41,25</td></tr>
            </table>"#;
        assert_eq!(parse_usd_rate(html).as_deref(), Some("41,25"));
    }

    #[test]
    fn test_parse_bitcoin_joins_price_parts() {
        let html = r#"
            <div class="MainInfostyles__Price-sc-1pcfgvi-16 gfcnFW"><span>2 650 000</span> <span>₴</span></div>
            <div class="MainInfostyles__Trend-sc-1pcfgvi-17 hwJIFp">+1.2%</div>"#;
        let quote = parse_bitcoin(html).unwrap();
        assert_eq!(quote.price, "2 650 000₴");
        assert_eq!(quote.change, "+1.2%");
    }

    /// **Test: Only the popular block is read, limited to three titles.**
    #[test]
    fn test_parse_top_news() {
        let html = r#"
            <div class="article_popular"><a>Outside the block</a></div>
            <div data-vr-zone="Popular by views">
              <div class="article_popular"><a href="/1">First</a></div>
              <div class="article_popular"><a href="/2">Second</a></div>
              <div class="article_popular"><a href="/3">Third</a></div>
              <div class="article_popular"><a href="/4">Fourth</a></div>
            </div>"#;
        assert_eq!(
            parse_top_news(html, 3),
            Some(vec!["First".to_string(), "Second".to_string(), "Third".to_string()])
        );
        assert_eq!(parse_top_news("<div></div>", 3), None);
    }

    /// **Test: Unreachable or failing pages degrade to empty fields instead of failing the briefing.**
    ///
    /// **Setup:** mockito serves one weather page and the news page; the USD page returns 500; the
    /// Bitcoin URL points at a closed port.
    /// **Action:** `collect()`.
    /// **Expected:** weather and news parsed; USD and Bitcoin are `None`.
    #[tokio::test]
    async fn test_collect_tolerates_failures() {
        let mut server = mockito::Server::new_async().await;
        let weather = server
            .mock("GET", "/kyiv")
            .with_body(r#"<span class="menu-basic__degree">+20°</span>"#)
            .create_async()
            .await;
        let _usd = server
            .mock("GET", "/usd")
            .with_status(500)
            .create_async()
            .await;
        let _news = server
            .mock("GET", "/news")
            .with_body(
                r#"<div data-vr-zone="Popular by views"><div class="article_popular"><a>Headline</a></div></div>"#,
            )
            .create_async()
            .await;

        let pages = BriefingPages {
            cities: vec![CityPage {
                name: "Kyiv".to_string(),
                url: format!("{}/kyiv", server.url()),
            }],
            usd_rate_url: format!("{}/usd", server.url()),
            bitcoin_url: "http://127.0.0.1:9/btc".to_string(),
            news_url: format!("{}/news", server.url()),
        };
        let source = WebBriefingSource::with_pages(Duration::from_secs(5), pages).unwrap();

        let briefing = source.collect().await;
        weather.assert_async().await;
        assert_eq!(
            briefing.weather,
            vec![CityWeather {
                city: "Kyiv".to_string(),
                temperature: Some("+20°".to_string()),
            }]
        );
        assert_eq!(briefing.usd_rate, None);
        assert_eq!(briefing.bitcoin, None);
        assert_eq!(briefing.news, Some(vec!["Headline".to_string()]));
    }
}
