// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use iron_plotter::config::{self, Config, CONFIG_SCHEMA};

#[test]
fn test_config_schema_output() -> Result<()> {
    // Output goes to stdout; this only checks the embedded schema is usable
    config::output_config_schema()?;
    Ok(())
}

#[test]
fn test_schema_defaults_match_code_defaults() -> Result<()> {
    let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA)?;
    let defaults = serde_json::to_value(Config::default())?;

    let sections = schema["properties"]
        .as_object()
        .expect("schema has top level properties");
    for (section, section_schema) in sections {
        let fields = section_schema["properties"]
            .as_object()
            .expect("every section lists its fields");
        for (field, field_schema) in fields {
            assert_eq!(
                field_schema["default"], defaults[section][field],
                "default of {section}.{field}"
            );
        }
        assert_eq!(
            fields.len(),
            defaults[section].as_object().map(|o| o.len()).unwrap_or(0),
            "fields of {section}"
        );
    }

    Ok(())
}

#[test]
fn test_default_config_validates_against_schema() -> Result<()> {
    let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA)?;
    let validator = jsonschema::draft202012::new(&schema)?;
    assert!(validator.is_valid(&serde_json::to_value(Config::default())?));
    Ok(())
}
