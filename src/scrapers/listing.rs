//! Generic listing-page scraper driven by a [`SiteProfile`].
//!
//! Every supported outlet exposes one or more "latest stories" listing pages
//! where each story is a repeated block holding a headline, a link, a teaser
//! and a thumbnail. A [`ListingScraper`] walks those pages, pulls one
//! [`Article`] out of each block and sleeps between page visits.

use super::SourceAdapter;
use crate::models::Article;
use crate::net::{BoxError, FetchPage};
use crate::utils::element_text;
use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How a site paginates its listing.
#[derive(Debug, Clone, Copy)]
pub enum Pagination {
    /// One page per section.
    Single,
    /// `pattern` with `{base}` and `{n}` placeholders, visited for
    /// `n = 2..=max_pages` after the section URL itself.
    Numbered {
        pattern: &'static str,
        max_pages: usize,
    },
}

/// Keep only market-related stories.
#[derive(Debug, Clone, Copy)]
pub struct TopicFilter {
    /// Match if the lowercased title contains any of these.
    pub title_keywords: &'static [&'static str],
    /// Match if the lowercased URL contains any of these.
    pub url_keywords: &'static [&'static str],
}

impl TopicFilter {
    fn matches(&self, title: &str, url: &str) -> bool {
        let title = title.to_lowercase();
        let url = url.to_lowercase();
        self.title_keywords.iter().any(|k| title.contains(k))
            || self.url_keywords.iter().any(|k| url.contains(k))
    }
}

/// Static description of one outlet's listing markup.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Source name stored with each article.
    pub name: &'static str,
    /// Listing URLs, visited in order.
    pub sections: &'static [&'static str],
    pub pagination: Pagination,
    /// One match per story block.
    pub item: &'static str,
    /// Headline inside a block. First non-empty match wins.
    pub title: &'static str,
    pub link: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    /// Image attributes to try, lazy-load attributes first.
    pub image_attrs: &'static [&'static str],
    pub topic_filter: Option<TopicFilter>,
}

impl SiteProfile {
    /// All listing URLs for one section, first page first.
    pub fn page_urls(&self, section: &str) -> Vec<String> {
        let mut urls = vec![section.to_string()];
        if let Pagination::Numbered { pattern, max_pages } = self.pagination {
            for n in 2..=max_pages {
                urls.push(
                    pattern
                        .replace("{base}", section)
                        .replace("{n}", &n.to_string()),
                );
            }
        }
        urls
    }
}

struct Selectors {
    item: Selector,
    title: Selector,
    link: Selector,
    description: Selector,
    image: Selector,
}

fn compile(css: &str) -> Result<Selector, BoxError> {
    Selector::parse(css).map_err(|e| format!("invalid selector {css:?}: {e}").into())
}

/// [`SourceAdapter`] that scrapes the listing pages described by a profile.
pub struct ListingScraper {
    profile: SiteProfile,
    selectors: Selectors,
    fetcher: Arc<dyn FetchPage>,
    page_delay: Duration,
}

impl ListingScraper {
    pub fn new(
        profile: SiteProfile,
        fetcher: Arc<dyn FetchPage>,
        page_delay: Duration,
    ) -> Result<Self, BoxError> {
        let selectors = Selectors {
            item: compile(profile.item)?,
            title: compile(profile.title)?,
            link: compile(profile.link)?,
            description: compile(profile.description)?,
            image: compile(profile.image)?,
        };
        Ok(Self {
            profile,
            selectors,
            fetcher,
            page_delay,
        })
    }

    /// Pull articles out of one listing page.
    ///
    /// Blocks without a title or link are dropped, relative links are
    /// resolved against `page_url`, and the topic filter (if any) applies.
    pub fn extract(&self, html: &str, page_url: &str) -> Vec<Article> {
        let Ok(base) = Url::parse(page_url) else {
            warn!(%page_url, "Listing URL is not absolute; skipping page");
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let now = Utc::now();

        let mut articles = Vec::new();
        for block in document.select(&self.selectors.item) {
            let title = first_text(block, &self.selectors.title);
            let href = first_attr(block, &self.selectors.link, &["href"]);

            let (Some(title), Some(href)) = (title, href) else {
                debug!(source = self.profile.name, "Skipping block without title or link");
                continue;
            };
            let Ok(url) = base.join(&href) else {
                debug!(source = self.profile.name, %href, "Unresolvable link");
                continue;
            };
            let url = url.to_string();

            if let Some(filter) = &self.profile.topic_filter {
                if !filter.matches(&title, &url) {
                    debug!(source = self.profile.name, %title, "Skipping non-market story");
                    continue;
                }
            }

            articles.push(Article {
                title,
                url,
                source: self.profile.name.to_string(),
                content: String::new(),
                description: first_text(block, &self.selectors.description).unwrap_or_default(),
                image_url: first_attr(block, &self.selectors.image, self.profile.image_attrs)
                    .and_then(|src| base.join(&src).ok())
                    .map(String::from),
                published_at: now,
            });
        }
        articles
    }
}

#[async_trait]
impl SourceAdapter for ListingScraper {
    fn name(&self) -> &str {
        self.profile.name
    }

    #[instrument(level = "info", skip_all, fields(source = self.profile.name))]
    async fn scrape(&self) -> Result<Vec<Article>, BoxError> {
        let mut articles = Vec::new();
        let mut last_error = None;
        let mut sections_ok = 0usize;

        for section in self.profile.sections {
            for (i, page_url) in self.profile.page_urls(section).into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.page_delay).await;
                }
                match self.fetcher.fetch(&page_url).await {
                    Ok(html) => {
                        if i == 0 {
                            sections_ok += 1;
                        }
                        let found = self.extract(&html, &page_url);
                        debug!(%page_url, count = found.len(), "Scraped listing page");
                        articles.extend(found);
                    }
                    Err(e) => {
                        warn!(%page_url, error = %e, "Listing page failed; stopping section");
                        last_error = Some(e);
                        break;
                    }
                }
            }
        }

        if sections_ok == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!(count = articles.len(), "Scraped articles");
        Ok(articles)
    }
}

fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn first_attr(block: ElementRef<'_>, selector: &Selector, attrs: &[&str]) -> Option<String> {
    let elements: Vec<ElementRef<'_>> = block.select(selector).collect();
    attrs.iter().find_map(|attr| {
        elements
            .iter()
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const LISTING: &str = r#"
        <html><body>
          <div class="story">
            <h2>  Sensex   jumps 600 points </h2>
            <a href="/market/sensex-jumps">read</a>
            <p>Banks lead gains</p>
            <img data-src="https://img.test/lazy.jpg" src="https://img.test/placeholder.gif">
          </div>
          <div class="story">
            <h2></h2>
            <a href="/market/no-title">read</a>
          </div>
          <div class="story">
            <h2>Cricket: India win series</h2>
            <a href="https://site.test/sports/cricket">read</a>
          </div>
          <div class="story">
            <h2>Rupee steadies</h2>
            <a href="https://other.test/markets/rupee">read</a>
            <img src="https://img.test/rupee.jpg">
          </div>
        </body></html>
    "#;

    fn profile() -> SiteProfile {
        SiteProfile {
            name: "Test Source",
            sections: &["https://site.test/news"],
            pagination: Pagination::Numbered {
                pattern: "{base}/page-{n}",
                max_pages: 3,
            },
            item: "div.story",
            title: "h2",
            link: "a",
            description: "p",
            image: "img",
            image_attrs: &["data-src", "src"],
            topic_filter: Some(TopicFilter {
                title_keywords: &["sensex", "nifty", "market", "stock"],
                url_keywords: &["markets"],
            }),
        }
    }

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl FetchPage for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, BoxError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| format!("404 for {url}").into())
        }
    }

    fn scraper(pages: &[(&str, &str)]) -> ListingScraper {
        let map = pages
            .iter()
            .map(|(u, b)| (u.to_string(), b.to_string()))
            .collect();
        ListingScraper::new(profile(), Arc::new(MapFetcher(map)), Duration::ZERO).unwrap()
    }

    #[test]
    fn test_page_urls_numbered() {
        let urls = profile().page_urls("https://site.test/news");
        assert_eq!(
            urls,
            [
                "https://site.test/news",
                "https://site.test/news/page-2",
                "https://site.test/news/page-3"
            ]
        );
    }

    #[test]
    fn test_extract_listing() {
        let s = scraper(&[]);
        let articles = s.extract(LISTING, "https://site.test/news");
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Sensex jumps 600 points");
        assert_eq!(first.url, "https://site.test/market/sensex-jumps");
        assert_eq!(first.description, "Banks lead gains");
        assert_eq!(first.image_url.as_deref(), Some("https://img.test/lazy.jpg"));
        assert_eq!(first.source, "Test Source");

        // kept by URL keyword, not title
        assert_eq!(articles[1].title, "Rupee steadies");
        assert_eq!(articles[1].image_url.as_deref(), Some("https://img.test/rupee.jpg"));
    }

    #[test]
    fn test_extract_without_filter_keeps_everything_titled() {
        let mut p = profile();
        p.topic_filter = None;
        let s = ListingScraper::new(p, Arc::new(MapFetcher(HashMap::new())), Duration::ZERO).unwrap();
        let articles = s.extract(LISTING, "https://site.test/news");
        assert_eq!(articles.len(), 3);
        assert!(articles.iter().all(|a| !a.title.is_empty()));
    }

    #[tokio::test]
    async fn test_scrape_stops_section_on_missing_page() {
        let s = scraper(&[("https://site.test/news", LISTING)]);
        let articles = s.scrape().await.unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_fails_when_no_section_loads() {
        let s = scraper(&[]);
        assert!(s.scrape().await.is_err());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let mut p = profile();
        p.item = "div[";
        assert!(ListingScraper::new(p, Arc::new(MapFetcher(HashMap::new())), Duration::ZERO).is_err());
    }
}
