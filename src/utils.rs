//! Utility functions for log formatting and file system checks.

use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to the previous
/// character boundary, since product pages are full of multi-byte glyphs) and
/// get an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure the directory that will hold `file` exists.
///
/// A bare file name (no directory part) refers to the working directory,
/// which needs no creating.
#[instrument(level = "debug", skip_all, fields(path = %file.display()))]
pub async fn ensure_parent_dir(file: &Path) -> std::io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Parent directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}
