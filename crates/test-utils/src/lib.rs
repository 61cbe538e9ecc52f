//! Shared test utilities for the bcm-projections workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional test data and external tools
//! - Output tree inspection
//! - Watershed boundary fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_commands, fixtures};
//! ```

pub mod fixtures;
pub mod paths;
pub mod tree;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use paths::*;
pub use tree::*;

/// Macro to skip a test if the required file is not found.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_real_projection_file() {
///     let path = require_test_file!("CA_BCM_GISS_rcp26_Monthly_aet_2010.nc");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro to skip a test unless every named executable is on `PATH`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_commands;
///
/// #[tokio::test]
/// async fn test_with_gdal() {
///     require_commands!("gdal_translate", "gdalwarp");
///     // Test code invoking the tools...
/// }
/// ```
#[macro_export]
macro_rules! require_commands {
    ($($name:expr),+ $(,)?) => {{
        $(
            if !$crate::command_available($name) {
                eprintln!("SKIPPED: '{}' not found on PATH.", $name);
                return;
            }
        )+
    }};
}
