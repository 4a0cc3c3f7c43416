// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use iron_plotter::config::Config;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

fn assert_rejected_with_sample(yaml: &str) -> Result<String> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml)?;

    let err = Config::from_file(&config_path).expect_err("config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(
        Path::new(&sample_path).exists(),
        "Sample config file was not created"
    );
    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config, Config::default());

    Ok(format!("{:#}", err))
}

#[test]
fn test_schema_type_mismatch_creates_sample_file() -> Result<()> {
    setup();
    let message = assert_rejected_with_sample(
        r#"
transport:
  port: "not-an-integer"
"#,
    )?;
    assert!(message.contains("validation failed"), "{message}");
    Ok(())
}

#[test]
fn test_unknown_section_is_rejected() -> Result<()> {
    setup();
    assert_rejected_with_sample("plotter:\n  colour: red\n")?;
    Ok(())
}

#[test]
fn test_out_of_range_values_are_rejected() -> Result<()> {
    setup();
    assert_rejected_with_sample("transport:\n  port: 70000\n")?;
    assert_rejected_with_sample("window:\n  length_secs: 0\n")?;
    assert_rejected_with_sample("render:\n  sink: gnuplot\n")?;
    Ok(())
}

#[test]
fn test_specific_rule_failure_creates_sample_file() -> Result<()> {
    setup();
    // Valid for the schema, but the gap can never fit in a 1 s window
    let message = assert_rejected_with_sample(
        r#"
window:
  length_secs: 1
  gap_threshold_ms: 2000
"#,
    )?;
    assert!(message.contains("Gap threshold"), "{message}");
    Ok(())
}

#[test]
fn test_invalid_yaml_is_an_error() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "transport: [unclosed\n")?;

    assert!(Config::from_file(&config_path).is_err());
    Ok(())
}
