//! Naming Convention Checker
//!
//! Focuses only on the most important violations: banned prefixes, suffixes
//! and generic module names.

use std::fs;
use std::path::Path;

use crate::workspace_files::find_rust_files;

/// A naming violation found in the code
#[derive(Debug)]
struct NamingViolation {
    file_path: String,
    line_number: usize,
    violation_type: &'static str,
    message: String,
}

/// Simple naming convention checker focused on critical violations
struct NamingChecker {
    violations: Vec<NamingViolation>,
    files_checked: usize,
}

impl NamingChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    fn record(&mut self, file_path: &Path, line_number: usize, kind: &'static str, message: String) {
        self.violations.push(NamingViolation {
            file_path: file_path.display().to_string(),
            line_number,
            violation_type: kind,
            message,
        });
    }

    /// Check for banned function prefixes
    fn check_function_prefixes(&mut self, file_path: &Path, content: &str) {
        let banned_patterns = [
            ("get_", "Use the noun directly: device.id() not device.get_id()"),
            (
                "set_",
                "Use descriptive verbs: clock.advance() not clock.set_tick()",
            ),
        ];

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.starts_with("//") {
                continue;
            }

            let is_function = ["pub fn ", "pub async fn ", "fn ", "async fn ", "pub(crate) fn "]
                .iter()
                .any(|start| trimmed.starts_with(start));
            if !is_function {
                continue;
            }

            for &(prefix, correction) in &banned_patterns {
                if trimmed.contains(&format!("fn {prefix}")) {
                    self.record(
                        file_path,
                        line_num + 1,
                        "BANNED_FUNCTION_PREFIX",
                        format!("Function uses banned prefix '{prefix}'. {correction}"),
                    );
                }
            }
        }
    }

    /// Check for banned type suffixes
    fn check_type_naming(&mut self, file_path: &Path, content: &str) {
        let banned_suffixes = [
            ("Factory", "Use a simple new() function"),
            ("Service", "Usually adds no semantic value - prefer direct naming"),
            ("Manager", "Name what it IS, not its role"),
            ("Helper", "Name what it does"),
        ];

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            let words: Vec<&str> = trimmed.split_whitespace().collect();
            let keyword_index = if words.first() == Some(&"pub") { 1 } else { 0 };

            let is_type = matches!(
                words.get(keyword_index),
                Some(&"struct") | Some(&"enum") | Some(&"trait")
            );
            if !is_type {
                continue;
            }

            let Some(name_part) = words.get(keyword_index + 1) else {
                continue;
            };
            let type_name = name_part
                .split(['<', '{', '(', ';', ':'])
                .next()
                .unwrap_or("")
                .trim();

            for &(suffix, message) in &banned_suffixes {
                if type_name.ends_with(suffix) {
                    self.record(
                        file_path,
                        line_num + 1,
                        "BANNED_TYPE_SUFFIX",
                        format!("Type '{type_name}' uses banned '{suffix}' suffix. {message}"),
                    );
                }
            }
        }
    }

    /// Check for banned module names
    fn check_module_names(&mut self, file_path: &Path) {
        let Some(file_name) = file_path.file_name() else {
            return;
        };
        let name = file_name.to_string_lossy();

        for pattern in ["utils", "common", "helpers", "misc", "stuff"] {
            if name == format!("{pattern}.rs") {
                self.record(
                    file_path,
                    1,
                    "BANNED_MODULE_NAME",
                    format!("Module name '{pattern}' is too generic, name what it contains"),
                );
            }
        }
    }

    /// Check all files in the workspace
    fn check_workspace(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for file in find_rust_files()? {
            let content = fs::read_to_string(&file)?;
            self.files_checked += 1;

            self.check_module_names(&file);
            self.check_function_prefixes(&file, &content);
            self.check_type_naming(&file, &content);
        }

        Ok(())
    }

    /// Report violations and return whether the check passed
    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Naming conventions: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        println!("Naming convention violations found:");
        for violation in &self.violations {
            println!(
                "{}:{} [{}] {}",
                violation.file_path,
                violation.line_number,
                violation.violation_type,
                violation.message
            );
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banned_function_prefix_detected() {
        let mut checker = NamingChecker::new();
        checker.check_function_prefixes(
            Path::new("sample.rs"),
            "pub fn get_state(&self) {}\nfn state(&self) {}\n// fn get_commented() {}\n",
        );

        assert_eq!(checker.violations.len(), 1);
        assert_eq!(checker.violations[0].line_number, 1);
    }

    #[test]
    fn test_banned_type_suffix_detected() {
        let mut checker = NamingChecker::new();
        checker.check_type_naming(
            Path::new("sample.rs"),
            "pub struct DeviceManager {\nstruct TickClock;\npub trait BackoffService {\n",
        );

        assert_eq!(checker.violations.len(), 2);
        assert_eq!(checker.violations[0].line_number, 1);
        assert_eq!(checker.violations[1].line_number, 3);
    }

    #[test]
    fn test_generic_module_name_detected() {
        let mut checker = NamingChecker::new();
        checker.check_module_names(Path::new("src/utils.rs"));
        checker.check_module_names(Path::new("src/medium.rs"));

        assert_eq!(checker.violations.len(), 1);
    }

    #[test]
    fn naming_conventions() {
        let mut checker = NamingChecker::new();

        checker
            .check_workspace()
            .expect("Failed to check workspace");

        assert!(
            checker.report_violations(),
            "Naming convention violations found - see output above"
        );
    }
}
