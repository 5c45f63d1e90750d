//! Source-fair paging over the article store.
//!
//! Store pages are ordered by publish time, so a source that posts in bursts
//! can fill a whole page. [`BalancedRetrieval`] over-fetches a window, groups
//! it by source and deals the groups out round-robin.

use crate::error::StoreError;
use crate::models::StoredArticle;
use crate::store::ArticleStore;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

const OVERFETCH: usize = 3;

#[derive(Clone)]
pub struct BalancedRetrieval {
    store: Arc<ArticleStore>,
}

impl BalancedRetrieval {
    pub fn new(store: Arc<ArticleStore>) -> Self {
        Self { store }
    }

    /// Balanced page with a clock-seeded shuffle.
    ///
    /// Returns at most `page_size` articles and the total count of the
    /// filtered set across the whole store.
    pub async fn page(
        &self,
        page: usize,
        page_size: usize,
        search: &str,
    ) -> Result<(Vec<StoredArticle>, usize), StoreError> {
        let mut rng = StdRng::seed_from_u64(clock_seed());
        self.page_with_rng(page, page_size, search, &mut rng).await
    }

    /// [`page`](Self::page) with a caller-supplied random source.
    #[instrument(level = "debug", skip(self, rng))]
    pub async fn page_with_rng<R: Rng + ?Sized>(
        &self,
        page: usize,
        page_size: usize,
        search: &str,
        rng: &mut R,
    ) -> Result<(Vec<StoredArticle>, usize), StoreError> {
        let store = Arc::clone(&self.store);
        let search = search.to_string();
        let window = page_size.saturating_mul(OVERFETCH);
        let (rows, total) =
            tokio::task::spawn_blocking(move || store.query(page, window, &search)).await??;

        debug!(window = rows.len(), total, "Balancing result window");
        Ok((interleave(rows, page_size, rng), total))
    }
}

/// Round-robin `rows` across sources in name order, shuffling within each source.
pub fn interleave<R: Rng + ?Sized>(
    rows: Vec<StoredArticle>,
    page_size: usize,
    rng: &mut R,
) -> Vec<StoredArticle> {
    let mut by_source: BTreeMap<String, Vec<StoredArticle>> = BTreeMap::new();
    for row in rows {
        by_source.entry(row.source.clone()).or_default().push(row);
    }

    let mut queues: Vec<VecDeque<StoredArticle>> = by_source
        .into_values()
        .map(|mut group| {
            group.shuffle(rng);
            VecDeque::from(group)
        })
        .collect();

    let mut out = Vec::with_capacity(page_size);
    while out.len() < page_size {
        let mut took_any = false;
        for queue in queues.iter_mut() {
            if out.len() == page_size {
                break;
            }
            if let Some(article) = queue.pop_front() {
                out.push(article);
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
    }
    out
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::{Duration, TimeZone, Utc};
    use itertools::Itertools;

    fn seed(store: &ArticleStore, source: &str, n: usize, minute_offset: i64) {
        let base = Utc.with_ymd_and_hms(2025, 5, 6, 9, 0, 0).unwrap();
        for i in 0..n {
            let mut a = Article::new(
                format!("{source} story {i}"),
                format!("https://{}.example/{i}", source.to_lowercase()),
                source,
            );
            a.published_at = base + Duration::minutes(minute_offset + i as i64);
            store.insert(&a).unwrap();
        }
    }

    fn skewed_store() -> Arc<ArticleStore> {
        let store = ArticleStore::open_in_memory().unwrap();
        // A is newest so an unbalanced page would be all A
        seed(&store, "A", 10, 100);
        seed(&store, "B", 1, 0);
        seed(&store, "C", 1, 1);
        Arc::new(store)
    }

    #[test]
    fn test_fairness_one_from_each_source() {
        let store = skewed_store();
        let (window, _) = store.query(1, 12, "").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let sources: Vec<_> = interleave(window, 3, &mut rng)
            .into_iter()
            .map(|a| a.source)
            .sorted()
            .collect();
        assert_eq!(sources, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_page_mixes_sources_from_window() {
        let balanced = BalancedRetrieval::new(skewed_store());
        let mut rng = StdRng::seed_from_u64(7);

        // a 4-row page over-fetches 12 rows, the whole table
        let (page, total) = balanced.page_with_rng(1, 4, "", &mut rng).await.unwrap();
        assert_eq!(total, 12);
        let sources: Vec<_> = page.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, ["A", "B", "C", "A"]);
    }

    #[test]
    fn test_interleave_alternates_sources() {
        let store = ArticleStore::open_in_memory().unwrap();
        seed(&store, "A", 4, 10);
        seed(&store, "B", 2, 0);
        let (rows, _) = store.query(1, 10, "").unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let sources: Vec<_> = interleave(rows, 6, &mut rng)
            .into_iter()
            .map(|a| a.source)
            .collect();
        assert_eq!(sources, ["A", "B", "A", "B", "A", "A"]);
    }

    #[tokio::test]
    async fn test_short_window_returns_window_size() {
        let store = ArticleStore::open_in_memory().unwrap();
        seed(&store, "A", 2, 0);
        let balanced = BalancedRetrieval::new(Arc::new(store));

        let (page, total) = balanced.page(1, 10, "").await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_never_exceeds_page_size() {
        let balanced = BalancedRetrieval::new(skewed_store());
        for size in [1, 2, 3, 5, 12, 50] {
            let (page, _) = balanced.page(1, size, "").await.unwrap();
            assert!(page.len() <= size);
        }
    }

    #[tokio::test]
    async fn test_total_is_filtered_and_unmultiplied() {
        let balanced = BalancedRetrieval::new(skewed_store());
        let (page, total) = balanced.page(1, 2, "b story").await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].source, "B");
    }

    #[tokio::test]
    async fn test_same_seed_same_page() {
        let balanced = BalancedRetrieval::new(skewed_store());
        let urls = |page: Vec<StoredArticle>| page.into_iter().map(|a| a.url).collect::<Vec<_>>();

        let (a, _) = balanced
            .page_with_rng(1, 5, "", &mut StdRng::seed_from_u64(42))
            .await
            .unwrap();
        let (b, _) = balanced
            .page_with_rng(1, 5, "", &mut StdRng::seed_from_u64(42))
            .await
            .unwrap();
        assert_eq!(urls(a), urls(b));
    }

    #[tokio::test]
    async fn test_zero_page_size_is_empty() {
        let balanced = BalancedRetrieval::new(skewed_store());
        let (page, total) = balanced.page(1, 0, "").await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 12);
    }
}
