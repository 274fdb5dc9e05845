// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration file round trips

mod common;

use common::*;
use polyframe_imprint::{CellClass, DebugMode, DebugOutput, ImprintConfig, OutputMode};
use tempfile::TempDir;

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("imprint.toml");

    let mut config = ImprintConfig::default();
    config.tolerance = 0.05;
    config.options.output_mode = OutputMode::ImprintedCellsOnly;
    config.options.debug_mode = DebugMode::InputPointsForCell(6);
    config.save(&path).unwrap();

    let loaded = ImprintConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = TempDir::new().unwrap();
    let missing = ImprintConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(missing.to_string().contains("Failed to read config file"));

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "tolerance = \"wide\"").unwrap();
    let broken = ImprintConfig::from_file(&path).unwrap_err();
    assert!(broken.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_run_from_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("imprint.toml");
    std::fs::write(
        &path,
        "tolerance = 0.075\n\n[options]\noutput_mode = \"projected_imprint\"\n\n[options.debug_mode]\nkind = \"triangulation_for_cell\"\ncell_id = 0\n",
    )
    .unwrap();

    let config = ImprintConfig::from_file(&path).unwrap();
    assert_eq!(config.options.debug_mode, DebugMode::TriangulationForCell(0));

    let result = config.run(&target_sphere(), &imprint_patch()).unwrap();
    assert!(result.count(CellClass::Imprinted) > 0);
    assert!(matches!(result.debug, Some(DebugOutput::Triangulation { cell_id: 0, .. })));
}

#[test]
fn test_run_reports_engine_errors() {
    let config = ImprintConfig {
        tolerance: -1.0,
        ..ImprintConfig::default()
    };
    let err = config.run(&target_sphere(), &imprint_patch()).unwrap_err();
    assert!(err.to_string().contains("Imprint failed"));
}
