//! Listing, filtering and pagination types for activation codes

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Fixed page size for the code listing
pub const PAGE_SIZE: u32 = 20;

/// Default and maximum result counts for the lightweight search
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Status filter for listings and export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Active and not used up
    Valid,
    Used,
    Inactive,
}

impl StatusFilter {
    /// Parse a query parameter; unknown values mean no filtering
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("valid") => Self::Valid,
            Some("used") => Self::Used,
            Some("inactive") => Self::Inactive,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Valid => "valid",
            Self::Used => "used",
            Self::Inactive => "inactive",
        }
    }
}

/// Query for the paginated code listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
}

impl CodeQuery {
    pub fn new() -> Self {
        Self {
            status: StatusFilter::All,
            search: None,
            page: 1,
        }
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn per_page(&self) -> u32 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(PAGE_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Inclusive time range used for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Midnight of `now`'s day up to `now`
    pub fn today(now: DateTime<Utc>) -> Self {
        Self::new(start_of_day(now.date_naive()), now)
    }

    /// The whole calendar day, up to its last microsecond
    pub fn day(date: NaiveDate) -> Self {
        let start = start_of_day(date);
        let end = start + Duration::days(1) - Duration::microseconds(1);
        Self::new(start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
