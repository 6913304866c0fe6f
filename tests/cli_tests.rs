use std::io::Write;
use std::time::{Duration, Instant};

use clap::Parser;
use form_autofill::cli::commands::load_page;
use form_autofill::cli::config::{Cli, Clock, Commands, OutputFormat};
use form_autofill::config::{DEFAULT_CONFIG_PATH, EngineConfig, load_config};
use form_autofill::error::EngineError;
use form_autofill::scheduler::Scheduler;
use serde_json::json;
use tempfile::NamedTempFile;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_detect_minimal() {
    let cli = Cli::parse_from(["form-autofill", "detect", "--page", "page.json"]);
    match cli.command {
        Commands::Detect { page, format } => {
            assert_eq!(page, "page.json");
            assert_eq!(format, OutputFormat::Console);
        }
        _ => panic!("Expected Detect command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_fill_all_args() {
    let cli = Cli::parse_from([
        "form-autofill",
        "fill",
        "--page",
        "page.json",
        "--values",
        "values.json",
        "--format",
        "json",
        "--no-delay",
    ]);
    match cli.command {
        Commands::Fill {
            page,
            values,
            format,
            no_delay,
        } => {
            assert_eq!(page, "page.json");
            assert_eq!(values, "values.json");
            assert_eq!(format, OutputFormat::Json);
            assert!(no_delay);
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "form-autofill",
        "-vv",
        "--config",
        "custom.yaml",
        "detect",
        "--page",
        "p.json",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
}

#[test]
fn cli_rejects_unknown_format() {
    let result = Cli::try_parse_from(["form-autofill", "detect", "--page", "p.json", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn cli_fill_requires_values() {
    let result = Cli::try_parse_from(["form-autofill", "fill", "--page", "p.json"]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn config_default_values() {
    let config = EngineConfig::default();
    assert_eq!(config.detection.spatial_tolerance_px, 10.0);
    assert_eq!(config.detection.segment_match_ratio, 0.5);
    assert_eq!(config.detection.mount_wait_ms, 2000);
    assert_eq!(config.detection.mount_poll_ms, 100);
    assert_eq!(config.detection.max_parent_label_len, 100);
    assert_eq!(config.fill.retry_budget, 3);
    assert_eq!(config.fill.retry_delay_ms, 500);
    assert_eq!(config.fill.field_delay_ms, 100);
    assert_eq!(DEFAULT_CONFIG_PATH, "form-autofill.yaml");
}

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn config_partial_yaml() {
    let file = yaml_file(
        r#"
fill:
  retry_budget: 5
detection:
  spatial_tolerance_px: 4
"#,
    );
    let config = load_config(file.path().to_str());

    assert_eq!(config.fill.retry_budget, 5);
    assert_eq!(config.fill.retry_delay_ms, 500);
    assert_eq!(config.detection.spatial_tolerance_px, 4.0);
    assert_eq!(config.detection.mount_wait_ms, 2000);
}

#[test]
fn config_malformed_yaml_falls_back_to_defaults() {
    let file = yaml_file("fill: [this is: not valid");
    assert_eq!(load_config(file.path().to_str()), EngineConfig::default());
}

#[test]
fn config_yaml_roundtrip() {
    let config = EngineConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn no_delay_selects_the_virtual_clock() {
    assert_eq!(Clock::from_no_delay(true), Clock::Virtual);
    assert_eq!(Clock::from_no_delay(false), Clock::Real);
}

#[tokio::test]
async fn virtual_clock_skips_configured_pauses() {
    let scheduler = Clock::Virtual.scheduler();
    let started = Instant::now();

    scheduler.sleep(Duration::from_secs(60)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn mount_poll_never_drops_to_zero() {
    let file = yaml_file("detection:\n  mount_poll_ms: 0\n");
    let config = load_config(file.path().to_str());
    assert_eq!(config.detection.mount_poll().as_millis(), 1);
}

// ============================================================================
// Page Loading Tests
// ============================================================================

#[test]
fn load_page_reads_snapshot_file() {
    let snapshot = json!({
        "viewport": { "width": 800, "height": 600 },
        "body": { "tag": "body", "children": [
            { "tag": "input", "attrs": { "id": "q", "value": "hi" } }
        ]}
    });
    let file = yaml_file(&snapshot.to_string());

    let doc = load_page(file.path()).unwrap();
    let q = doc.get_element_by_id("q").unwrap();
    assert_eq!(doc.value(q), Some("hi"));
    assert_eq!(doc.viewport().width, 800.0);
}

#[test]
fn load_page_reports_bad_json_and_missing_file() {
    let file = yaml_file("{ not json");
    assert!(matches!(load_page(file.path()), Err(EngineError::Snapshot(_))));
    assert!(matches!(load_page("no/such/page.json"), Err(EngineError::Io(_))));
}
