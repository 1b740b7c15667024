//! Cron job that reconciles the external feed into the catalog.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use apalis::prelude::*;
use apalis_cron::Schedule;
use metrics::counter;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::application::error::AppError;
use crate::application::pagination::PageWindow;
use crate::application::sync::{FeedSource, ReconcileStats, Reconciler, SyncError};
use crate::cache::{CacheClient, CacheKey, Invalidations};

const SOURCE: &str = "menuboard::sync";

/// Marker struct for the cron-triggered sync job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct SyncFeedJob;

impl From<chrono::DateTime<chrono::Utc>> for SyncFeedJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The startup delay has not elapsed yet.
    WarmingUp,
    /// Another pass holds the gate.
    Busy,
    /// Feed bytes match the last successful pass.
    Unchanged,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::WarmingUp => "warming_up",
            SkipReason::Busy => "busy",
            SkipReason::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PassReport {
    Completed {
        stats: ReconcileStats,
        invalidated: Invalidations,
    },
    Skipped(SkipReason),
}

/// Loads the feed, reconciles it and drops the stale cache keys once the store committed.
pub struct SyncDriver {
    source: Arc<dyn FeedSource>,
    reconciler: Reconciler,
    cache: CacheClient,
    last_fingerprint: Mutex<Option<String>>,
    not_before: Instant,
    skip_unchanged: bool,
}

impl SyncDriver {
    pub fn new(source: Arc<dyn FeedSource>, reconciler: Reconciler, cache: CacheClient) -> Self {
        Self {
            source,
            reconciler,
            cache,
            last_fingerprint: Mutex::new(None),
            not_before: Instant::now(),
            skip_unchanged: false,
        }
    }

    /// Ticks before `delay` has elapsed from now are skipped.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.not_before = Instant::now() + delay;
        self
    }

    pub fn with_skip_unchanged(mut self, skip_unchanged: bool) -> Self {
        self.skip_unchanged = skip_unchanged;
        self
    }

    pub async fn run_pass(&self) -> Result<PassReport, SyncError> {
        let result = self.execute().await;
        let outcome = match &result {
            Ok(PassReport::Completed { .. }) => "completed",
            Ok(PassReport::Skipped(reason)) => reason.as_str(),
            Err(_) => "failed",
        };
        counter!("menuboard_sync_pass_total", "outcome" => outcome).increment(1);
        result
    }

    async fn execute(&self) -> Result<PassReport, SyncError> {
        if Instant::now() < self.not_before {
            return Ok(PassReport::Skipped(SkipReason::WarmingUp));
        }
        let Ok(mut last_fingerprint) = self.last_fingerprint.try_lock() else {
            return Ok(PassReport::Skipped(SkipReason::Busy));
        };

        let document = self.source.load().await?;
        if self.skip_unchanged && last_fingerprint.as_deref() == Some(document.fingerprint.as_str())
        {
            debug!(
                target = SOURCE,
                fingerprint = %document.fingerprint,
                "Feed unchanged since last pass"
            );
            return Ok(PassReport::Skipped(SkipReason::Unchanged));
        }

        let outcome = self.reconciler.reconcile(&document.snapshot).await?;
        let stats = outcome.stats;
        let mut invalidated = outcome.invalidated;
        invalidated.insert(CacheKey::menus(PageWindow::default()));
        let deleted = self.cache.invalidate(invalidated.keys()).await;
        *last_fingerprint = Some(document.fingerprint);

        record_mutations(&stats);
        info!(
            target = SOURCE,
            feed = %self.source.describe(),
            menus_inserted = stats.menus.inserted,
            menus_updated = stats.menus.updated,
            menus_deleted = stats.menus.deleted,
            submenus_inserted = stats.submenus.inserted,
            submenus_updated = stats.submenus.updated,
            submenus_deleted = stats.submenus.deleted,
            dishes_inserted = stats.dishes.inserted,
            dishes_updated = stats.dishes.updated,
            dishes_deleted = stats.dishes.deleted,
            keys = invalidated.len(),
            cache_deleted = deleted,
            "Sync pass completed"
        );

        Ok(PassReport::Completed { stats, invalidated })
    }
}

fn record_mutations(stats: &ReconcileStats) {
    for (level, level_stats) in [
        ("menu", stats.menus),
        ("submenu", stats.submenus),
        ("dish", stats.dishes),
    ] {
        if level_stats.total() > 0 {
            counter!("menuboard_sync_mutation_total", "level" => level).increment(level_stats.total());
        }
    }
}

/// Context for the sync job worker.
#[derive(Clone)]
pub struct SyncFeedContext {
    pub driver: Arc<SyncDriver>,
}

/// Run one pass. Failures are logged and retried on the next tick.
pub async fn process_sync_feed_job(
    _job: SyncFeedJob,
    ctx: Data<SyncFeedContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.driver.run_pass().await {
        Ok(PassReport::Skipped(reason)) => {
            debug!(target = SOURCE, reason = reason.as_str(), "Sync tick skipped");
        }
        Ok(PassReport::Completed { .. }) => {}
        Err(err) => {
            error!(target = SOURCE, error = %err, "Sync pass failed");
        }
    }
    Ok(())
}

/// Parse the six-field cron expression (seconds first) driving the sync worker.
pub fn sync_feed_schedule(expression: &str) -> Result<Schedule, AppError> {
    Schedule::from_str(expression).map_err(|err| {
        AppError::validation(format!("invalid sync schedule `{expression}`: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sync::{FeedDocument, FeedError};
    use crate::cache::{CacheConfig, MemoryCache};
    use crate::domain::feed::FeedSnapshot;
    use crate::infra::memory::MemoryCatalog;
    use async_trait::async_trait;

    struct StaticFeed {
        document: Option<FeedDocument>,
    }

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn load(&self) -> Result<FeedDocument, FeedError> {
            self.document
                .clone()
                .ok_or_else(|| FeedError::Workbook("worksheet missing".to_string()))
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn feed(fingerprint: &str) -> Arc<StaticFeed> {
        let snapshot: FeedSnapshot = serde_json::from_str(
            r#"{"menus": [{"id": "m1", "title": "Lunch", "submenus": [
                {"id": "s1", "title": "Soups", "dishes": [
                    {"id": "d1", "title": "Borscht", "price": "10.00"}
                ]}
            ]}]}"#,
        )
        .expect("snapshot json");
        Arc::new(StaticFeed {
            document: Some(FeedDocument {
                snapshot,
                fingerprint: fingerprint.to_string(),
            }),
        })
    }

    fn cache() -> (Arc<MemoryCache>, CacheClient) {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryCache::new(&config));
        let client = CacheClient::new(store.clone(), &config);
        (store, client)
    }

    fn driver(source: Arc<StaticFeed>, cache: CacheClient) -> SyncDriver {
        let reconciler = Reconciler::new(Arc::new(MemoryCatalog::new()));
        SyncDriver::new(source, reconciler, cache)
    }

    #[test]
    fn default_schedule_parses() {
        let schedule = sync_feed_schedule("*/15 * * * * *").expect("valid schedule");
        let upcoming: Vec<_> = schedule.upcoming(chrono::Utc).take(3).collect();
        assert_eq!(upcoming.len(), 3);
    }

    #[test]
    fn malformed_schedule_is_rejected() {
        assert!(sync_feed_schedule("every fifteen seconds").is_err());
    }

    #[tokio::test]
    async fn ticks_before_the_initial_delay_are_skipped() {
        let (_, client) = cache();
        let driver = driver(feed("a"), client).with_initial_delay(Duration::from_secs(60));

        let report = driver.run_pass().await.expect("pass");
        assert!(matches!(report, PassReport::Skipped(SkipReason::WarmingUp)));
    }

    #[tokio::test]
    async fn tick_during_a_running_pass_is_skipped() {
        let (_, client) = cache();
        let driver = driver(feed("a"), client);

        let _held = driver.last_fingerprint.lock().await;
        let report = driver.run_pass().await.expect("pass");
        assert!(matches!(report, PassReport::Skipped(SkipReason::Busy)));
    }

    #[tokio::test]
    async fn completed_pass_drops_the_global_menu_list() {
        let (store, client) = cache();
        let menus = CacheKey::menus(PageWindow::default());
        client.put_json(&menus, &Vec::<String>::new()).await;
        assert!(store.contains(&menus.to_string()));

        let driver = driver(feed("a"), client);
        let report = driver.run_pass().await.expect("pass");

        let PassReport::Completed { stats, invalidated } = report else {
            panic!("expected a completed pass");
        };
        assert_eq!(stats.dishes.inserted, 1);
        assert!(invalidated.contains(&menus));
        assert!(!store.contains(&menus.to_string()));
    }

    #[tokio::test]
    async fn unchanged_feed_is_skipped_when_enabled() {
        let (_, client) = cache();
        let driver = driver(feed("same"), client).with_skip_unchanged(true);

        let first = driver.run_pass().await.expect("first pass");
        assert!(matches!(first, PassReport::Completed { .. }));

        let second = driver.run_pass().await.expect("second pass");
        assert!(matches!(second, PassReport::Skipped(SkipReason::Unchanged)));
    }

    #[tokio::test]
    async fn unchanged_feed_still_reconciles_by_default() {
        let (_, client) = cache();
        let driver = driver(feed("same"), client);

        driver.run_pass().await.expect("first pass");
        let second = driver.run_pass().await.expect("second pass");

        let PassReport::Completed { stats, .. } = second else {
            panic!("expected a completed pass");
        };
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn failed_load_surfaces_the_error() {
        let (_, client) = cache();
        let driver = driver(Arc::new(StaticFeed { document: None }), client);

        let err = driver.run_pass().await.expect_err("load fails");
        assert!(matches!(err, SyncError::Feed(FeedError::Workbook(_))));
    }
}
