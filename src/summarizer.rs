//! Extractive article summaries.
//!
//! The first sentence is always kept; the remaining slots go to the sentences
//! whose words are most frequent across the whole text. Ties keep document
//! order.

use crate::error::SummarizeError;
use crate::net::USER_AGENT;
use crate::utils::{element_text, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_MAX_SENTENCES: usize = 5;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

const WORD_TRIM: &[char] = &['.', ',', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}'];

#[derive(Debug, Clone)]
pub struct TextSummarizer {
    max_sentences: usize,
    client: Client,
}

impl TextSummarizer {
    /// `max_sentences` of 0 falls back to [`DEFAULT_MAX_SENTENCES`].
    pub fn new(max_sentences: usize) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        let max_sentences = if max_sentences == 0 {
            DEFAULT_MAX_SENTENCES
        } else {
            max_sentences
        };
        Ok(Self {
            max_sentences,
            client,
        })
    }

    /// Download `url` and summarize the text of its `<p>` elements.
    #[instrument(level = "info", skip(self))]
    pub async fn summarize_url(&self, url: &str) -> Result<String, SummarizeError> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = article_text(&html);
        debug!(chars = text.len(), "Extracted article text");

        let summary = self.summarize(&text)?;
        debug!(summary = %truncate_for_log(&summary, 200), "Summary ready");
        Ok(summary)
    }

    pub fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if text.is_empty() {
            return Err(SummarizeError::EmptyText);
        }

        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Err(SummarizeError::NoSentences);
        }
        if sentences.len() <= self.max_sentences {
            return Ok(sentences.join(" "));
        }

        let freq = word_frequencies(text);
        let mut scored: Vec<(&str, f64)> = sentences[1..]
            .iter()
            .map(|s| (s.as_str(), score_sentence(s, &freq)))
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let summary: Vec<&str> = std::iter::once(sentences[0].as_str())
            .chain(scored.into_iter().take(self.max_sentences - 1).map(|(s, _)| s))
            .collect();
        Ok(summary.join(" "))
    }
}

/// Concatenated text of every paragraph in an HTML document.
pub fn article_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.select(&PARAGRAPH)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on `.`, `!` and `?`, trimming each piece and terminating it with a period.
fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_END
        .split(text.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

fn word_key(word: &str) -> String {
    word.trim_matches(WORD_TRIM).to_lowercase()
}

fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for key in text.split_whitespace().map(word_key) {
        if !key.is_empty() {
            *freq.entry(key).or_insert(0) += 1;
        }
    }
    freq
}

/// Mean full-text frequency of the sentence's words.
fn score_sentence(sentence: &str, freq: &HashMap<String, usize>) -> f64 {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let total: usize = words
        .iter()
        .map(|w| freq.get(&word_key(w)).copied().unwrap_or(0))
        .sum();
    total as f64 / words.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const MARKET_TEXT: &str = "Markets rallied today. Nifty rose sharply. \
        Nifty and Sensex rose. Weather was mild. Sensex rose again.";

    #[test]
    fn test_zero_max_sentences_uses_default() {
        let s = TextSummarizer::new(0).unwrap();
        let text = "Markets opened higher. Banks led the gains. Metals slipped. \
                    Rupee held steady. Crude eased overnight. Bond yields fell. \
                    Volumes were thin.";
        let out = s.summarize(text).unwrap();
        assert!(out.starts_with("Markets opened higher."));
        assert_eq!(out.matches(". ").count() + 1, DEFAULT_MAX_SENTENCES);
    }

    #[test]
    fn test_short_text_returned_whole() {
        let s = TextSummarizer::new(5).unwrap();
        let out = s.summarize("Sensex up 300 points! Is the rally real?").unwrap();
        assert_eq!(out, "Sensex up 300 points. Is the rally real.");
    }

    #[test]
    fn test_keeps_first_sentence_and_top_scored() {
        let s = TextSummarizer::new(3).unwrap();
        let out = s.summarize(MARKET_TEXT).unwrap();
        // three sentences tie at 2.0; the earliest two win
        assert_eq!(
            out,
            "Markets rallied today. Nifty rose sharply. Nifty and Sensex rose."
        );
    }

    #[test]
    fn test_low_scoring_sentence_dropped() {
        let s = TextSummarizer::new(4).unwrap();
        let out = s.summarize(MARKET_TEXT).unwrap();
        assert!(!out.contains("Weather"));
        assert!(out.starts_with("Markets rallied today."));
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let s = TextSummarizer::new(5).unwrap();
        assert!(matches!(s.summarize(""), Err(SummarizeError::EmptyText)));
        assert!(matches!(s.summarize(" ...!? "), Err(SummarizeError::NoSentences)));
    }

    #[test]
    fn test_word_key_trims_punctuation() {
        assert_eq!(word_key("(Sensex),"), "sensex");
        assert_eq!(word_key("\"Nifty's\""), "nifty's");
    }

    #[test]
    fn test_article_text_only_paragraphs() {
        let html = "<html><body><h1>Headline</h1><p>First para.</p><div>nav</div><p> Second\n para. </p></body></html>";
        assert_eq!(article_text(html), "First para. Second para.");
    }

    #[tokio::test]
    async fn test_summarize_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/story");
                then.status(200)
                    .body("<html><body><p>Nifty closed higher.</p><p>Banks led gains.</p></body></html>");
            })
            .await;

        let s = TextSummarizer::new(5).unwrap();
        let out = s.summarize_url(&server.url("/story")).await.unwrap();
        assert_eq!(out, "Nifty closed higher. Banks led gains.");
    }

    #[tokio::test]
    async fn test_summarize_url_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404);
            })
            .await;

        let s = TextSummarizer::new(5).unwrap();
        assert!(matches!(
            s.summarize_url(&server.url("/gone")).await,
            Err(SummarizeError::Fetch(_))
        ));
    }
}
