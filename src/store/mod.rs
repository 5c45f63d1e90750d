//! Deduplicating article store backed by SQLite.
//!
//! Articles are keyed by URL. The `UNIQUE` constraint on `articles.url` is the
//! final authority on identity: an application-level `exists` check can race,
//! but the insert itself never produces a second row for the same URL.
//!
//! All access goes through one connection behind a mutex, so calls are
//! serialized within the process. The methods are synchronous; async callers
//! run them on `spawn_blocking`.

mod migrations;

use crate::error::StoreError;
use crate::models::{Article, StoredArticle};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted,
    /// A row with this URL already existed; only `last_scraped_at` moved.
    AlreadyPresent,
}

/// SQLite-backed article store.
pub struct ArticleStore {
    conn: Mutex<Connection>,
}

impl ArticleStore {
    /// Open (or create) the database at `path` and run migrations.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // journal_mode answers with a row, so it can't go through execute()
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self::from_connection(conn)?;
        info!("Article store ready");
        Ok(store)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Whether a row with this URL exists.
    pub fn exists(&self, url: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?1)",
            [url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert `article` unless its URL is already stored.
    ///
    /// Calling this with a known URL is not an error: content is left as it
    /// was, `last_scraped_at` is refreshed and [`InsertOutcome::AlreadyPresent`]
    /// is returned.
    pub fn insert(&self, article: &Article) -> Result<InsertOutcome, StoreError> {
        let now = format_timestamp(Utc::now());
        let conn = self.conn.lock();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO articles (
                title, url, source, content, description, image_url,
                published_at, created_at, last_scraped_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                article.title,
                article.url,
                article.source,
                article.content,
                article.description,
                article.image_url,
                format_timestamp(article.published_at),
                now,
            ],
        )?;

        if inserted == 1 {
            debug!(url = %article.url, "Inserted article");
            return Ok(InsertOutcome::Inserted);
        }

        conn.execute(
            "UPDATE articles SET last_scraped_at = ?1 WHERE url = ?2",
            params![now, article.url],
        )?;
        Ok(InsertOutcome::AlreadyPresent)
    }

    /// Refresh `last_scraped_at` for an existing URL. No-op for unknown URLs.
    pub fn touch(&self, url: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE articles SET last_scraped_at = ?1 WHERE url = ?2",
            params![format_timestamp(Utc::now()), url],
        )?;
        Ok(())
    }

    /// Total number of stored articles.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Fetch one page of articles, most recently published first.
    ///
    /// A non-empty `search` keeps rows whose title, content or description
    /// contains the term, ignoring ASCII case.
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number; 0 is treated as 1
    /// * `page_size` - Rows per page
    /// * `search` - Substring filter, empty for none
    ///
    /// # Returns
    ///
    /// The page's rows and the size of the filtered set, independent of the
    /// page window. A page past the end yields an empty list.
    pub fn query(
        &self,
        page: usize,
        page_size: usize,
        search: &str,
    ) -> Result<(Vec<StoredArticle>, usize), StoreError> {
        let search = search.trim();
        let mut args: Vec<Value> = Vec::new();
        let where_clause = if search.is_empty() {
            ""
        } else {
            args.push(Value::Text(like_pattern(search)));
            r" WHERE (title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')"
        };

        let conn = self.conn.lock();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM articles{where_clause}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let total = total as usize;
        let offset = page.max(1).saturating_sub(1).saturating_mul(page_size);
        // past the end, including offsets SQLite cannot address
        let Ok(offset_i64) = i64::try_from(offset) else {
            return Ok((Vec::new(), total));
        };
        if page_size == 0 || offset >= total {
            return Ok((Vec::new(), total));
        }
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);

        let limit_idx = args.len() + 1;
        let sql = format!(
            "SELECT id, title, url, source, content, description, image_url,
                    published_at, created_at, last_scraped_at
             FROM articles{where_clause}
             ORDER BY published_at DESC, id DESC
             LIMIT ?{limit_idx} OFFSET ?{}",
            limit_idx + 1
        );
        args.push(Value::Integer(limit));
        args.push(Value::Integer(offset_i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(2)?,
                    source: row.get(3)?,
                    content: row.get(4)?,
                    description: row.get(5)?,
                    image_url: row.get(6)?,
                    published_at: row.get(7)?,
                    created_at: row.get(8)?,
                    last_scraped_at: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let articles = rows
            .into_iter()
            .map(RawRow::into_article)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((articles, total))
    }
}

struct RawRow {
    id: i64,
    title: String,
    url: String,
    source: String,
    content: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    published_at: Option<String>,
    created_at: String,
    last_scraped_at: Option<String>,
}

impl RawRow {
    fn into_article(self) -> Result<StoredArticle, StoreError> {
        let created_at = parse_timestamp(&self.created_at)?;
        let published_at = match self.published_at.as_deref() {
            Some(ts) => parse_timestamp(ts)?,
            None => created_at,
        };
        let last_scraped_at = self
            .last_scraped_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(StoredArticle {
            id: self.id,
            title: self.title,
            url: self.url,
            source: self.source,
            content: self.content.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image_url: self.image_url,
            published_at,
            created_at,
            last_scraped_at,
        })
    }
}

/// `2025-05-06T09:15:00.000Z`: fixed width, so lexical order is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp(format!("{s}: {e}")))
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
