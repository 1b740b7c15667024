use std::{process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_cron::CronStream;
use menuboard::{
    application::{
        catalog::{CatalogService, DishService, MenuService, SubmenuService},
        error::AppError,
        jobs::{
            PassReport, SyncDriver, SyncFeedContext, process_sync_feed_job, sync_feed_schedule,
        },
        repos::{
            CatalogRepo, CatalogUnitOfWork, DishesRepo, DishesWriteRepo, MenusRepo,
            MenusWriteRepo, SubmenusRepo, SubmenusWriteRepo,
        },
        sync::{FeedSource, Reconciler},
    },
    cache::{CacheClient, CacheConfig, MemoryCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        feed_source::FileFeedSource,
        http::{self, ApiState},
        memory::MemoryCatalog,
        telemetry,
    },
};
use tokio::task::JoinHandle;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Sync(_) => run_sync(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = init_application(&settings).await?;

    let monitor_handle = if settings.sync.enabled {
        Some(spawn_sync_monitor(&settings.sync, app.sync_driver.clone())?)
    } else {
        info!(target = "menuboard::sync", "Scheduled feed sync disabled");
        None
    };

    let result = serve_http(&settings, app.api_state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_sync(settings: config::Settings) -> Result<(), AppError> {
    if settings.database.url.is_none() {
        warn!(
            target = "menuboard::sync",
            "No database configured; the reconciled catalog is discarded on exit"
        );
    }

    let app = init_application(&settings).await?;
    match app.sync_driver.run_pass().await? {
        PassReport::Completed { stats, .. } => {
            info!(
                target = "menuboard::sync",
                feed = %settings.sync.feed_path.display(),
                mutations = stats.total(),
                "One-off sync finished"
            );
        }
        PassReport::Skipped(reason) => {
            info!(
                target = "menuboard::sync",
                reason = reason.as_str(),
                "One-off sync skipped"
            );
        }
    }
    Ok(())
}

struct ApplicationContext {
    api_state: ApiState,
    sync_driver: Arc<SyncDriver>,
}

async fn init_application(settings: &config::Settings) -> Result<ApplicationContext, AppError> {
    let Some(database_url) = settings.database.url.as_deref() else {
        info!(
            target = "menuboard::startup",
            backend = "memory",
            "No database url configured; using the in-process store"
        );
        return Ok(build_application_context(
            Arc::new(MemoryCatalog::new()),
            settings,
        ));
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(
        target = "menuboard::startup",
        backend = "postgres",
        max_connections = settings.database.max_connections.get(),
        "Database ready"
    );
    Ok(build_application_context(
        Arc::new(PostgresRepositories::new(pool)),
        settings,
    ))
}

fn build_application_context<R>(repositories: Arc<R>, settings: &config::Settings) -> ApplicationContext
where
    R: MenusRepo
        + MenusWriteRepo
        + SubmenusRepo
        + SubmenusWriteRepo
        + DishesRepo
        + DishesWriteRepo
        + CatalogRepo
        + CatalogUnitOfWork
        + 'static,
{
    let menus_repo: Arc<dyn MenusRepo> = repositories.clone();
    let menus_write_repo: Arc<dyn MenusWriteRepo> = repositories.clone();
    let submenus_repo: Arc<dyn SubmenusRepo> = repositories.clone();
    let submenus_write_repo: Arc<dyn SubmenusWriteRepo> = repositories.clone();
    let dishes_repo: Arc<dyn DishesRepo> = repositories.clone();
    let dishes_write_repo: Arc<dyn DishesWriteRepo> = repositories.clone();
    let catalog_repo: Arc<dyn CatalogRepo> = repositories.clone();
    let unit_of_work: Arc<dyn CatalogUnitOfWork> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = CacheClient::new(Arc::new(MemoryCache::new(&cache_config)), &cache_config);

    let menus = Arc::new(MenuService::new(
        menus_repo.clone(),
        menus_write_repo,
        cache.clone(),
    ));
    let submenus = Arc::new(SubmenuService::new(
        menus_repo,
        submenus_repo.clone(),
        submenus_write_repo,
        cache.clone(),
    ));
    let dishes = Arc::new(DishService::new(
        submenus_repo,
        dishes_repo,
        dishes_write_repo,
        cache.clone(),
    ));
    let catalog = Arc::new(CatalogService::new(catalog_repo));

    let source: Arc<dyn FeedSource> = Arc::new(FileFeedSource::new(&settings.sync.feed_path));
    let sync_driver = SyncDriver::new(source, Reconciler::new(unit_of_work), cache)
        .with_initial_delay(settings.sync.initial_delay)
        .with_skip_unchanged(settings.sync.skip_unchanged);

    ApplicationContext {
        api_state: ApiState {
            menus,
            submenus,
            dishes,
            catalog,
        },
        sync_driver: Arc::new(sync_driver),
    }
}

fn spawn_sync_monitor(
    sync: &config::SyncSettings,
    driver: Arc<SyncDriver>,
) -> Result<JoinHandle<()>, AppError> {
    let schedule = sync_feed_schedule(&sync.schedule)?;

    let sync_worker = WorkerBuilder::new("sync-feed-worker")
        .concurrency(1)
        .data(SyncFeedContext { driver })
        .backend(CronStream::new(schedule))
        .build_fn(process_sync_feed_job);

    let monitor = Monitor::new().register(sync_worker);

    info!(
        target = "menuboard::sync",
        schedule = %sync.schedule,
        feed = %sync.feed_path.display(),
        initial_delay_secs = sync.initial_delay.as_secs(),
        "Scheduled feed sync"
    );

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    }))
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);
    let addr = settings.server.addr;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;

    info!(target = "menuboard::http", addr = %addr, "Listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
