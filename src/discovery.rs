//! Project and input discovery
//!
//! Locates the project root the fixed report paths are relative to, and the
//! suite reports inside it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "qareport.toml";

/// Build file marking the root of the service under test
const PROJECT_MARKER: &str = "pom.xml";

/// Nearest ancestor of `start` holding a config file or a build file.
///
/// Falls back to `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    for marker in [CONFIG_FILE, PROJECT_MARKER] {
        if let Some(dir) = start.ancestors().find(|dir| dir.join(marker).is_file()) {
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}

/// Config file inside `root`, if one exists
pub fn find_config(root: &Path) -> Option<PathBuf> {
    let path = root.join(CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Suite report files in `reports_dir` whose names match `pattern`, in
/// lexicographic path order
pub fn discover_suite_reports(reports_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = glob::Pattern::escape(&reports_dir.to_string_lossy()) + "/" + pattern;

    let mut files = Vec::new();
    for entry in glob::glob(&full_pattern)
        .with_context(|| format!("Invalid suite pattern: {}", pattern))?
    {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable path"),
        }
    }
    files.sort();

    tracing::info!(
        dir = %reports_dir.display(),
        count = files.len(),
        "discovered suite reports"
    );

    Ok(files)
}
