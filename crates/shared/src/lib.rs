// Public modules
pub mod config;
pub mod models;
pub mod pocket;
pub mod report;
pub mod server;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use models::{Article, ArticleStatus};
pub use pocket::{AccessToken, ItemState, PocketClient, RequestToken};
pub use report::ReportGenerator;
pub use server::{build_router, AppError, AppState};
pub use stats::{
    compute_bucket_stats, compute_daily_series, split_unread_by_parseability, BucketStats,
    DailySeries, ReadingReport, Timeline,
};
