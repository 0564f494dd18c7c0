//! Dead Code Enforcement
//!
//! Enforces that production code does not contain #[allow(dead_code)] attributes.
//! Test code is exempt from this restriction.

use std::fs;
use std::path::Path;

use crate::workspace_files::find_rust_files;

/// A dead code allowance violation found in production code
#[derive(Debug)]
struct DeadCodeViolation {
    file_path: String,
    line_number: usize,
    context: String,
}

/// Checker for dead code allowance violations in production code
struct DeadCodeChecker {
    violations: Vec<DeadCodeViolation>,
    files_checked: usize,
}

impl DeadCodeChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    /// Check if a file path represents test code
    fn is_test_file(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();

        path_str.contains("hubsim-tests")
            || path_str.contains("/tests/")
            || path_str.contains("/benches/")
            || path_str.ends_with("tests.rs")
    }

    /// Records every dead code allowance in `content`
    fn scan(&mut self, file_path: &str, content: &str) {
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("#[allow(") && trimmed.contains("dead_code") {
                self.violations.push(DeadCodeViolation {
                    file_path: file_path.to_string(),
                    line_number: index + 1,
                    context: trimmed.to_string(),
                });
            }
        }
    }

    /// Check all files in the workspace
    fn check_workspace(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for file in find_rust_files()? {
            if self.is_test_file(&file) {
                continue;
            }

            let content = fs::read_to_string(&file)?;
            self.files_checked += 1;
            self.scan(&file.to_string_lossy(), &content);
        }

        Ok(())
    }

    /// Report violations and return whether the check passed
    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Dead code enforcement: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        println!("Dead code enforcement violations found:");
        for violation in &self.violations {
            println!("{}:{}", violation.file_path, violation.line_number);
            println!("  {}", violation.context);
        }
        println!();
        println!("Unused code should be removed or used, not silenced.");

        false
    }
}
