//! Statistics service - summary counters, daily activity and dashboard feeds

use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;

use crate::domain::activation_code::{
    ActivationCode, ActivationCodeRepository, StatusFilter, TimeWindow,
};
use crate::domain::statistics::{day_label, usage_rate, CodeStatistics, DailyActivity};
use crate::domain::DomainError;

/// Days covered by the dashboard activity chart
pub const DASHBOARD_DAYS: u32 = 7;

/// Length of the recent-codes and recent-redemptions feeds
pub const RECENT_FEED_SIZE: u32 = 5;

/// Everything the dashboard views show
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: CodeStatistics,
    pub recent_codes: Vec<ActivationCode>,
    pub recent_activations: Vec<ActivationCode>,
}

/// Read-only aggregation over the code store
#[derive(Debug)]
pub struct StatisticsService<R: ActivationCodeRepository> {
    repository: Arc<R>,
}

impl<R: ActivationCodeRepository> StatisticsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Headline counters, "today" being midnight UTC up to `now`
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<CodeStatistics, DomainError> {
        let total = self.repository.count(StatusFilter::All).await?;
        let used = self.repository.count(StatusFilter::Used).await?;
        let active_unused = self.repository.count(StatusFilter::Valid).await?;
        let inactive = self.repository.count(StatusFilter::Inactive).await?;

        let today = TimeWindow::today(now);
        let generated_today = self.repository.count_created_between(today).await?;
        let used_today = self.repository.count_used_between(today).await?;

        Ok(CodeStatistics {
            total,
            used,
            active_unused,
            inactive,
            generated_today,
            used_today,
            usage_rate: usage_rate(used, total),
        })
    }

    /// One entry per calendar day for the last `days` days, oldest first
    pub async fn daily_series(
        &self,
        now: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<DailyActivity>, DomainError> {
        let today = now.date_naive();
        let mut series = Vec::with_capacity(days as usize);

        for back in (0..days).rev() {
            let Some(date) = today.checked_sub_days(Days::new(u64::from(back))) else {
                continue;
            };

            let window = TimeWindow::day(date);
            series.push(DailyActivity {
                label: day_label(date),
                date,
                generated_count: self.repository.count_created_between(window).await?,
                used_count: self.repository.count_used_between(window).await?,
            });
        }

        Ok(series)
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard, DomainError> {
        Ok(Dashboard {
            stats: self.summary(now).await?,
            recent_codes: self.repository.recent(RECENT_FEED_SIZE).await?,
            recent_activations: self.repository.recently_redeemed(RECENT_FEED_SIZE).await?,
        })
    }
}
