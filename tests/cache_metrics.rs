use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use menuboard::application::jobs::SyncDriver;
use menuboard::application::pagination::PageWindow;
use menuboard::application::sync::{FeedSource, Reconciler};
use menuboard::cache::{CacheClient, CacheConfig, CacheKey, MemoryCache};
use menuboard::infra::feed_source::FileFeedSource;
use menuboard::infra::memory::MemoryCatalog;

#[tokio::test]
async fn cache_and_sync_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let config = CacheConfig::default();
    let client = CacheClient::new(Arc::new(MemoryCache::new(&config)), &config);
    let key = CacheKey::menus(PageWindow::default());

    assert!(client.get_json::<Vec<String>>(&key).await.is_none());
    client.put_json(&key, &vec!["m1".to_string()]).await;
    assert_eq!(
        client.get_json::<Vec<String>>(&key).await,
        Some(vec!["m1".to_string()])
    );
    assert_eq!(client.invalidate([&key]).await, 1);

    let feed = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp feed");
    std::fs::write(
        feed.path(),
        r#"{"menus": [{"id": "m1", "title": "Lunch", "submenus": [
            {"id": "s1", "title": "Soups", "dishes": [
                {"id": "d1", "title": "Borscht", "price": "10.00"}
            ]}
        ]}]}"#,
    )
    .expect("write feed");

    let source: Arc<dyn FeedSource> = Arc::new(FileFeedSource::new(feed.path()));
    let driver = SyncDriver::new(
        source,
        Reconciler::new(Arc::new(MemoryCatalog::new())),
        client,
    );
    driver.run_pass().await.expect("sync pass");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "menuboard_cache_hit_total",
        "menuboard_cache_miss_total",
        "menuboard_cache_invalidate_total",
        "menuboard_sync_pass_total",
        "menuboard_sync_mutation_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
