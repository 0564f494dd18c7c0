//! Source file discovery shared by the style checks.

use std::fs;
use std::path::{Path, PathBuf};

/// Crate directories scanned by the style checks start with this prefix.
const CRATE_PREFIX: &str = "hubsim-";

/// Finds every Rust file in the workspace crates.
pub fn find_rust_files() -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(Path::new(".."))? {
        let path = entry?.path();
        let is_crate = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(CRATE_PREFIX));

        if is_crate && path.is_dir() {
            find_rust_files_recursive(&path, &mut files, 0)?;
        }
    }

    Ok(files)
}

fn find_rust_files_recursive(
    dir: &Path,
    files: &mut Vec<PathBuf>,
    depth: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Prevent infinite recursion
    if depth > 8 {
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        // Skip hidden directories and target directory
        if let Some(name) = path.file_name()
            && (name.to_string_lossy().starts_with('.') || name == "target")
        {
            continue;
        }

        if path.is_dir() {
            find_rust_files_recursive(&path, files, depth + 1)?;
        } else if let Some(extension) = path.extension()
            && extension == "rs"
        {
            files.push(path);
        }
    }

    Ok(())
}
