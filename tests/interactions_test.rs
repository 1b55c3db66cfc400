//! End-to-end tests for the interaction analysis entry points
//!
//! These tests run the real pools against the model files in `tests/data`:
//! - Pair model creation for every unordered source pair
//! - Growth rates of the created communities
//! - Failure propagation: bad sources, missing media, too few sources

use std::fs;
use std::path::{Path, PathBuf};

use mminte::analysis::{calculate_growth_rates, create_interaction_models};
use mminte::community::{CommunityModel, InteractionType, GROWTH_RATE_COLUMNS};
use mminte::core::{InteractionError, IoCategory};
use tempfile::TempDir;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn output_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn files_in(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// PAIR MODELS
// ============================================================================

#[test]
fn test_two_sources_make_one_pair_model() {
    let out = output_dir();
    let models =
        create_interaction_models(&[data("BT.json"), data("FP.json")], out.path(), Some(2))
            .expect("Pair model creation failed");

    assert_eq!(models, vec![out.path().join("BTxFP.json")]);
    assert_eq!(files_in(out.path()), vec!["BTxFP.json".to_string()]);

    let community = CommunityModel::load(&models[0]).expect("Pair model should load");
    assert_eq!(community.id, "BTxFP");
    assert_eq!(community.a().id, "BT");
    assert_eq!(community.b().id, "FP");
}

#[test]
fn test_three_sources_make_every_pair() {
    let out = output_dir();
    let sources = [data("BT.json"), data("FP.json"), data("EC.json")];
    let mut models = create_interaction_models(&sources, out.path(), None).unwrap();
    models.sort();

    assert_eq!(
        models,
        vec![
            out.path().join("BTxEC.json"),
            out.path().join("BTxFP.json"),
            out.path().join("FPxEC.json"),
        ]
    );
}

#[test]
fn test_output_folder_is_created() {
    let out = output_dir();
    let nested = out.path().join("nested").join("models");
    let models = create_interaction_models(&[data("BT.json"), data("EC.json")], &nested, Some(1))
        .unwrap();
    assert_eq!(models, vec![nested.join("BTxEC.json")]);
}

#[test]
fn test_single_source_is_rejected() {
    let out = output_dir();
    let result = create_interaction_models(&[data("BT.json")], out.path(), None);
    assert_eq!(result, Err(InteractionError::InsufficientSources { found: 1 }));

    let none: [PathBuf; 0] = [];
    let result = create_interaction_models(&none, out.path(), None);
    assert_eq!(result, Err(InteractionError::InsufficientSources { found: 0 }));
}

#[test]
fn test_unsupported_extension_fails_without_output() {
    let out = output_dir();
    let err = create_interaction_models(&[data("BT.json"), data("FP.bad")], out.path(), Some(2))
        .unwrap_err();

    assert!(err.is_io());
    assert_eq!(err.io_category(), Some(IoCategory::UnsupportedFormat));
    assert!(files_in(out.path()).is_empty());
}

#[test]
fn test_missing_source_fails_without_output() {
    let out = output_dir();
    let err = create_interaction_models(&[data("BT.json"), data("BAD.json")], out.path(), Some(2))
        .unwrap_err();

    assert!(err.is_io());
    assert_eq!(err.io_category(), Some(IoCategory::NotFound));
    assert!(files_in(out.path()).is_empty());
}

#[test]
fn test_one_bad_source_fails_the_batch() {
    let out = output_dir();
    let sources = [data("BT.json"), data("FP.json"), data("BAD.json")];
    let err = create_interaction_models(&sources, out.path(), Some(3)).unwrap_err();
    assert!(err.is_io());
}

// ============================================================================
// GROWTH RATES
// ============================================================================

#[test]
fn test_growth_rates_of_created_pair() {
    let out = output_dir();
    let models =
        create_interaction_models(&[data("BT.json"), data("FP.json")], out.path(), None).unwrap();
    let table = calculate_growth_rates(&models, data("western.json"), None)
        .expect("Growth rate calculation failed");

    assert_eq!(table.len(), 1);
    let row = table.find("BT", "FP").expect("Missing BT/FP row");
    assert_eq!(row.a_id, "BT");
    assert_eq!(row.b_id, "FP");
    assert_eq!(row.interaction, InteractionType::Parasitism);
    assert_close(row.a_alone, 0.4);
    assert_close(row.b_alone, 0.24);
    assert_close(row.a_together, 0.25);
    assert_close(row.b_together, 0.62);
    assert_close(row.together, 0.87);
    assert_close(row.a_change, -0.375);
    assert_close(row.b_change, 0.38 / 0.24);
}

#[test]
fn test_growth_rates_for_every_pair() {
    let out = output_dir();
    let sources = [data("BT.json"), data("FP.json"), data("EC.json")];
    let models = create_interaction_models(&sources, out.path(), Some(2)).unwrap();
    let table = calculate_growth_rates(&models, data("western.json"), Some(2)).unwrap();

    assert_eq!(table.len(), 3);
    assert!(table.find("BT", "EC").is_some());
    assert!(table.find("FP", "EC").is_some());
    assert!(table.find("FP", "BT").is_some());

    for row in &table {
        assert_close(row.together, row.a_together + row.b_together);
    }

    let csv = table.to_csv_string();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(GROWTH_RATE_COLUMNS.join(",").as_str()));
    assert_eq!(lines.count(), 3);
}

#[test]
fn test_empty_model_list_gives_empty_table() {
    let none: [PathBuf; 0] = [];
    let table = calculate_growth_rates(&none, data("western.json"), None).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.to_csv_string().lines().count(), 1);
}

#[test]
fn test_missing_medium_fails_the_jobs() {
    let out = output_dir();
    let models =
        create_interaction_models(&[data("BT.json"), data("FP.json")], out.path(), None).unwrap();
    let err = calculate_growth_rates(&models, data("missing-medium.json"), None).unwrap_err();
    assert_eq!(err.io_category(), Some(IoCategory::NotFound));
}

#[test]
fn test_source_model_is_not_a_community() {
    let err = calculate_growth_rates(&[data("BT.json")], data("western.json"), None).unwrap_err();
    assert!(matches!(err, InteractionError::InvalidModel { .. }));
}
