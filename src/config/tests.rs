use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 8);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), 1024);
    assert_eq!(settings.cache.ttl, Duration::from_secs(3600));
    assert_eq!(settings.sync.schedule, "*/15 * * * * *");
    assert_eq!(settings.sync.initial_delay, Duration::from_secs(30));
    assert!(!settings.sync.skip_unchanged);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_selects_memory_store() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("ttl must be positive");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        }
    ));
}

#[test]
fn five_field_schedule_is_rejected() {
    let mut raw = RawSettings::default();
    raw.sync.schedule = Some("*/5 * * * *".to_string());

    let err = Settings::from_raw(raw).expect_err("seconds field required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "sync.schedule",
            ..
        }
    ));
}

#[test]
fn one_off_sync_runs_without_delay() {
    let mut raw = RawSettings::default();
    let args = SyncArgs {
        feed: Some(PathBuf::from("/tmp/menu.json")),
        ..Default::default()
    };

    raw.apply_sync_overrides(&args);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.sync.initial_delay, Duration::ZERO);
    assert_eq!(settings.sync.feed_path, PathBuf::from("/tmp/menu.json"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["menuboard"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "menuboard",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--sync-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.sync_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_sync_arguments() {
    let args = CliArgs::parse_from([
        "menuboard",
        "sync",
        "--database-url",
        "postgres://example",
        "/srv/feed/Menu.xlsx",
    ]);

    match args.command.expect("sync command") {
        Command::Sync(sync) => {
            assert_eq!(
                sync.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(
                sync.feed.as_deref(),
                Some(std::path::Path::new("/srv/feed/Menu.xlsx"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}
