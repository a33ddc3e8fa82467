use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Article, ArticleStatus};

pub const WORDS_PER_PAGE: u64 = 275;
pub const WORDS_PER_BOOK: f64 = 90_000.0;
const WORDS_PER_BOOK_U64: u64 = 90_000;
pub const DAY_MS: i64 = 86_400_000;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Totals for one reading state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketStats {
    pub count: usize,
    pub word_count: u64,
    pub page_count: u64,
    pub book_count: f64,
}

impl BucketStats {
    /// Book count in tenths, rounding halves up.
    fn book_tenths(&self) -> u64 {
        self.word_count.saturating_mul(10).saturating_add(WORDS_PER_BOOK_U64 / 2) / WORDS_PER_BOOK_U64
    }

    /// Book count as shown on the page, e.g. 0.5.
    pub fn book_count_rounded(&self) -> f64 {
        self.book_tenths() as f64 / 10.0
    }

    /// Book count rounded to one decimal, e.g. "0.5".
    pub fn book_count_display(&self) -> String {
        let tenths = self.book_tenths();
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

/// One decimal place, halves rounded up.
pub fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0 + 0.5).floor() / 10.0)
}

pub fn compute_bucket_stats(articles: &[Article], status: ArticleStatus) -> BucketStats {
    let (count, word_count) = articles
        .iter()
        .filter(|a| a.status == status)
        .fold((0usize, 0u64), |(n, words), a| {
            (n + 1, words.saturating_add(a.word_count))
        });

    BucketStats {
        count,
        word_count,
        // round half up: floor(words / 275 + 1/2)
        page_count: word_count.saturating_mul(2).saturating_add(WORDS_PER_PAGE) / (2 * WORDS_PER_PAGE),
        book_count: word_count as f64 / WORDS_PER_BOOK,
    }
}

/// Split unread articles into `(non_articles, articles_sorted)`, both ordered
/// by descending word count. Order among equal word counts is unspecified.
pub fn split_unread_by_parseability<'a>(
    mut unread: Vec<&'a Article>,
) -> (Vec<&'a Article>, Vec<&'a Article>) {
    unread.sort_by(|a, b| b.word_count.cmp(&a.word_count));
    unread.into_iter().partition(|a| !a.is_parseable())
}

/// Longest and shortest parseable article. `None` unless there are at least
/// two, so a single article is never reported as both.
pub fn longest_and_shortest<'a>(
    articles_sorted: &[&'a Article],
) -> Option<(&'a Article, &'a Article)> {
    if articles_sorted.len() < 2 {
        return None;
    }
    Some((articles_sorted[0], articles_sorted[articles_sorted.len() - 1]))
}

fn floor_div(n: i64, d: i64) -> i64 {
    n.div_euclid(d)
}

fn ceil_div(n: i64, d: i64) -> i64 {
    n.div_euclid(d) + i64::from(n.rem_euclid(d) != 0)
}

fn to_millis(secs: i64) -> i64 {
    secs.saturating_mul(1000)
}

/// The active lifetime of the account, anchored at its earliest save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub first_day_ms: Option<i64>,
    pub days_active: usize,
}

impl Timeline {
    pub fn new(articles: &[Article], now: DateTime<Utc>) -> Self {
        let first_day_ms = articles.iter().map(|a| to_millis(a.time_added)).min();
        let days_active = match first_day_ms {
            Some(first) => ceil_div(now.timestamp_millis().saturating_sub(first), DAY_MS).max(0) as usize,
            None => 0,
        };
        Self {
            first_day_ms,
            days_active,
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.first_day_ms
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive())
    }

    pub fn years_active(&self) -> f64 {
        self.days_active as f64 / DAYS_PER_YEAR
    }
}

/// Per-day series indexed by days since the first save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub unread_article_count_by_day: Vec<u64>,
    pub unread_word_count_by_day: Vec<u64>,
    /// Cumulative words read up to each day.
    pub read_word_count_by_day: Vec<u64>,
}

pub fn compute_daily_series(articles: &[Article], now: DateTime<Utc>) -> DailySeries {
    let timeline = Timeline::new(articles, now);
    let first_day = match timeline.first_day_ms {
        Some(first) => first,
        None => return DailySeries::default(),
    };
    let days = timeline.days_active;
    let now_ms = now.timestamp_millis();

    let mut series = DailySeries {
        unread_article_count_by_day: vec![0; days],
        unread_word_count_by_day: vec![0; days],
        read_word_count_by_day: vec![0; days],
    };

    for article in articles {
        let from_idx = floor_div(to_millis(article.time_added).saturating_sub(first_day), DAY_MS);
        let until_ms = article.time_read.map(to_millis).unwrap_or(now_ms);
        let until_idx = ceil_div(until_ms.saturating_sub(first_day), DAY_MS);

        // Indices outside [0, days) are skipped.
        for i in day_range(from_idx, until_idx.saturating_add(1), days) {
            series.unread_article_count_by_day[i] += 1;
            let words = &mut series.unread_word_count_by_day[i];
            *words = words.saturating_add(article.word_count);
        }

        if article.status == ArticleStatus::Read {
            for i in day_range(until_idx, days as i64, days) {
                let words = &mut series.read_word_count_by_day[i];
                *words = words.saturating_add(article.word_count);
            }
        }
    }

    series
}

/// Half-open `[start, end)` clamped to `[0, len)`.
fn day_range(start: i64, end: i64, len: usize) -> std::ops::Range<usize> {
    let start = start.clamp(0, len as i64) as usize;
    let end = end.clamp(0, len as i64) as usize;
    start..end.max(start)
}

/// Everything the report page shows, computed from one snapshot.
#[derive(Debug, Clone)]
pub struct ReadingReport<'a> {
    pub unread: BucketStats,
    pub read: BucketStats,
    pub non_articles: Vec<&'a Article>,
    pub articles_sorted: Vec<&'a Article>,
    pub timeline: Timeline,
    pub series: DailySeries,
}

impl<'a> ReadingReport<'a> {
    pub fn build(articles: &'a [Article], now: DateTime<Utc>) -> Self {
        let unread_articles: Vec<&Article> = articles
            .iter()
            .filter(|a| a.status == ArticleStatus::Unread)
            .collect();
        let (non_articles, articles_sorted) = split_unread_by_parseability(unread_articles);

        Self {
            unread: compute_bucket_stats(articles, ArticleStatus::Unread),
            read: compute_bucket_stats(articles, ArticleStatus::Read),
            non_articles,
            articles_sorted,
            timeline: Timeline::new(articles, now),
            series: compute_daily_series(articles, now),
        }
    }

    pub fn longest_and_shortest(&self) -> Option<(&'a Article, &'a Article)> {
        longest_and_shortest(&self.articles_sorted)
    }

    /// Books' worth of words read per year of use, from the book count as
    /// displayed. `None` before the first full day.
    pub fn books_per_year(&self) -> Option<f64> {
        let years = self.timeline.years_active();
        if years > 0.0 {
            Some(self.read.book_count_rounded() / years)
        } else {
            None
        }
    }
}
