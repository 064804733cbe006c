//! Integration tests for the `run` command.
use lngopt::cli::{RunOpts, handle_run_command};
use lngopt::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

const OUTPUT_FILE_NAMES: [&str; 6] = [
    "unit_economics.csv",
    "destination_allocation.csv",
    "demand_hierarchy.csv",
    "buyer_caps.csv",
    "buyer_allocation.csv",
    "pnl_summary.csv",
];

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("LNGOPT_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    for file_name in OUTPUT_FILE_NAMES {
        assert!(output_dir.join(file_name).is_file(), "{file_name} not written");
    }
    assert!(output_dir.join("lngopt_info.log").is_file());

    // Second time will fail because the output folder is no longer empty
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    );
}
