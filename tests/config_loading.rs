mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

use blogwatch::config::{
    RawSiteConfig, SiteConfig, config_root_dir, default_config_path, load_from_path, load_or_create,
};
use blogwatch::errors::BlogwatchError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn missing_config_is_created_with_defaults() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("site/blogwatch.json");

    let cfg = load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(cfg, SiteConfig::default());
    assert_eq!(load_from_path(&path)?, RawSiteConfig::default());
    let written = fs::read_to_string(&path)?;
    assert!(written.contains("\"defaultLayout\": \"default\""));
    assert!(written.contains("\"debounceMs\": 100"));
    assert!(!written.contains("serveCommand"));
    Ok(())
}

#[test]
fn partial_config_keeps_defaults_for_missing_keys() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("blogwatch.json");
    fs::write(
        &path,
        r#"{ "defaultLayout": "page", "outDir": "dist", "debounceMs": 250, "serveCommand": "  serve  ", "extra": 1 }"#,
    )?;

    let cfg = load_or_create(&path)?;

    assert_eq!(cfg.default_layout(), "page");
    assert_eq!(cfg.debounce(), Duration::from_millis(250));
    assert_eq!(cfg.serve_command(), Some("serve"));
    let paths = cfg.paths(dir.path());
    assert_eq!(paths.out, dir.path().join("dist"));
    assert_eq!(paths.posts, dir.path().join("posts"));
    assert_eq!(paths.assets, dir.path().join("wwwroot"));
    Ok(())
}

fn invalid(raw: RawSiteConfig) -> String {
    match SiteConfig::try_from(raw) {
        Err(BlogwatchError::ConfigError(msg)) => msg,
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn validation_rejects_bad_values() {
    let msg = invalid(RawSiteConfig {
        default_layout: "no spaces".into(),
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("defaultLayout"));

    let msg = invalid(RawSiteConfig {
        layouts_dir: "posts".into(),
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("more than one directory"));

    let msg = invalid(RawSiteConfig {
        out_dir: "posts/out".into(),
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("overlap"));

    let msg = invalid(RawSiteConfig {
        debounce_ms: 0,
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("debounceMs"));

    let msg = invalid(RawSiteConfig {
        ignore: vec!["[".into()],
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("invalid ignore glob"));

    let msg = invalid(RawSiteConfig {
        assets_dir: " ".into(),
        ..RawSiteConfig::default()
    });
    assert!(msg.contains("assetsDir"));
}

#[test]
fn malformed_json_is_a_json_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("blogwatch.json");
    fs::write(&path, "{ not json")?;

    assert!(matches!(load_or_create(&path), Err(BlogwatchError::JsonError(_))));
    Ok(())
}

#[test]
fn root_dir_is_the_config_parent() {
    assert_eq!(
        config_root_dir(Path::new("site/blogwatch.json")),
        Path::new("site").to_path_buf()
    );
    assert_eq!(config_root_dir(&default_config_path()), std::env::current_dir().unwrap());
}
