mod sync_feed;

pub use sync_feed::{
    PassReport, SkipReason, SyncDriver, SyncFeedContext, SyncFeedJob, process_sync_feed_job,
    sync_feed_schedule,
};
