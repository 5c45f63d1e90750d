//! Listing profiles for the supported outlets.
//!
//! Markup changes often; these selectors are deliberately loose and a profile
//! that stops matching simply yields zero articles for that source.

use super::listing::{Pagination, SiteProfile, TopicFilter};

const MARKET_TITLE_KEYWORDS: &[&str] = &["stock", "market", "sensex", "nifty"];

pub const LIVEMINT: &str = "Livemint";
pub const ECONOMIC_TIMES: &str = "Economic Times";
pub const MONEYCONTROL: &str = "MoneyControl";
pub const GROWW: &str = "Groww";
pub const BUSINESS_STANDARD: &str = "Business Standard";
pub const INDIA_TODAY: &str = "India Today";

pub fn livemint() -> SiteProfile {
    SiteProfile {
        name: LIVEMINT,
        sections: &["https://www.livemint.com/market/stock-market-news"],
        pagination: Pagination::Numbered {
            pattern: "{base}/page-{n}",
            max_pages: 5,
        },
        item: "div.listingNew div.listtostory",
        title: "h2",
        link: "a",
        description: "p",
        image: "img",
        image_attrs: &["src"],
        topic_filter: None,
    }
}

pub fn economic_times() -> SiteProfile {
    SiteProfile {
        name: ECONOMIC_TIMES,
        sections: &["https://economictimes.indiatimes.com/markets/stocks/news"],
        pagination: Pagination::Numbered {
            pattern: "{base}/{n}",
            max_pages: 5,
        },
        item: "div.eachStory",
        title: "h3",
        link: "a",
        description: "p",
        image: "img",
        image_attrs: &["src"],
        topic_filter: None,
    }
}

pub fn moneycontrol() -> SiteProfile {
    SiteProfile {
        name: MONEYCONTROL,
        sections: &[
            "https://www.moneycontrol.com/news/business/markets/",
            "https://www.moneycontrol.com/news/business/stocks/",
        ],
        pagination: Pagination::Numbered {
            pattern: "{base}page-{n}.html",
            max_pages: 5,
        },
        item: "li.clearfix",
        title: "h2, h3",
        link: "a",
        description: "p",
        image: "img",
        image_attrs: &["data-src", "src"],
        topic_filter: Some(TopicFilter {
            title_keywords: &[],
            url_keywords: &["markets", "stocks"],
        }),
    }
}

pub fn groww() -> SiteProfile {
    SiteProfile {
        name: GROWW,
        sections: &["https://groww.in/market-news/stocks"],
        pagination: Pagination::Single,
        item: "div.newsCard, div.news-card, div.news-item",
        title: "h1, h2, h3, h4, .title, [class*='title']",
        link: "a",
        description: "p, .description, [class*='description']",
        image: "img",
        image_attrs: &["src"],
        topic_filter: None,
    }
}

pub fn business_standard() -> SiteProfile {
    SiteProfile {
        name: BUSINESS_STANDARD,
        sections: &["https://www.business-standard.com/markets/news"],
        pagination: Pagination::Single,
        item: "div[class*='article'], div[class*='listing'], .story-box",
        title: "h1, h2, h3, h4, .title, [class*='title']",
        link: "a",
        description: "p, .description, [class*='description'], .story-excerpt",
        image: "img",
        image_attrs: &["src"],
        topic_filter: None,
    }
}

pub fn india_today() -> SiteProfile {
    SiteProfile {
        name: INDIA_TODAY,
        sections: &["https://www.indiatoday.in/business/market"],
        pagination: Pagination::Single,
        item: "div.story__grid, div.story-list-item",
        title: "h2, h3, .story__title",
        link: "a",
        description: "p, .story__desc",
        image: "img",
        image_attrs: &["src"],
        topic_filter: Some(TopicFilter {
            title_keywords: MARKET_TITLE_KEYWORDS,
            url_keywords: &["market"],
        }),
    }
}

/// Every supported outlet, in ingestion order.
pub fn all() -> Vec<SiteProfile> {
    vec![
        livemint(),
        economic_times(),
        moneycontrol(),
        groww(),
        business_standard(),
        india_today(),
    ]
}
