//! End-to-end tests for the statefill crates.
//!
//! Filled fixtures are compared against golden files with [`compare_or_save_testdata`].

use std::path::PathBuf;

use serde_json::Value;

/// Configuration for the test data comparison utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestdataConfig {
    /// The directory where test data files are stored.
    pub testdata_dir: PathBuf,
}

impl Default for TestdataConfig {
    fn default() -> Self {
        Self {
            testdata_dir: PathBuf::from("tests/testdata"),
        }
    }
}

/// Compares a filled fixture with its golden file, or writes the golden file if it is missing.
///
/// Delete the golden file to regenerate it.
///
/// # Panics
///
/// Panics if the output differs from the golden file, or on any I/O or JSON error.
pub fn compare_or_save_testdata<T>(filename: &str, output: &T)
where
    T: serde::Serialize + for<'a> serde::Deserialize<'a> + PartialEq + std::fmt::Debug,
{
    compare_or_save_testdata_with_config(filename, output, TestdataConfig::default());
}

/// Same as [`compare_or_save_testdata`], with a custom testdata directory.
pub fn compare_or_save_testdata_with_config<T>(filename: &str, output: &T, config: TestdataConfig)
where
    T: serde::Serialize + for<'a> serde::Deserialize<'a> + PartialEq + std::fmt::Debug,
{
    use std::fs;

    let testdata_file = config.testdata_dir.join(filename);

    if !config.testdata_dir.exists() {
        fs::create_dir_all(&config.testdata_dir).unwrap();
    }

    let mut value: Value = serde_json::to_value(output).unwrap();
    value.sort_all_objects();
    let output_json = serde_json::to_string_pretty(&value).unwrap();

    if !testdata_file.exists() {
        fs::write(&testdata_file, &output_json).unwrap();
        println!("Saved testdata to {}", testdata_file.display());
        return;
    }

    let expected_json = fs::read_to_string(&testdata_file).unwrap();
    let expected: T = serde_json::from_str(&expected_json).unwrap();
    if *output != expected {
        panic!("Fixture does not match testdata.\nExpected:\n{expected_json}\n\nActual:\n{output_json}");
    }
}

#[cfg(test)]
mod state_tests;
