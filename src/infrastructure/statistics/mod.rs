//! Statistics aggregation over the code store

mod service;

pub use service::{Dashboard, StatisticsService, DASHBOARD_DAYS, RECENT_FEED_SIZE};
