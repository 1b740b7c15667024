use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the menuboard binary.
#[derive(Debug, Parser)]
#[command(
    name = "menuboard",
    version,
    about = "Menu catalog API with scheduled feed sync"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MENUBOARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API and the scheduled feed sync.
    Serve(Box<ServeArgs>),
    /// Reconcile the feed into the catalog once and exit.
    Sync(SyncArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the cache entry expiry.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Toggle the scheduled feed sync.
    #[arg(
        long = "sync-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub sync_enabled: Option<bool>,

    /// Override the feed location.
    #[arg(long = "sync-feed-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub sync_feed_path: Option<PathBuf>,

    /// Override the sync cron expression (six fields, seconds first).
    #[arg(long = "sync-schedule", value_name = "CRON")]
    pub sync_schedule: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Feed to reconcile; defaults to `sync.feed_path`.
    #[arg(value_name = "FEED", value_hint = ValueHint::FilePath)]
    pub feed: Option<PathBuf>,
}
