//! Line-oriented playlist parser (`.m3u` / `.m3u8`).

use super::location::resolve_entry;
use multiscreen_common::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Read and parse a line-list playlist.
///
/// `path` must be absolute so relative entries resolve to absolute paths.
/// Read or decode failures are reported as [`Error::ParseFailure`].
pub fn parse_line_list(path: &Path) -> Result<Vec<String>> {
    let bytes =
        std::fs::read(path).map_err(|e| Error::parse_failure(path, format!("read failed: {e}")))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| Error::parse_failure(path, format!("not valid UTF-8: {e}")))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("/"));
    let entries = parse_line_list_str(&content, base_dir);

    debug!("Parsed {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Parse line-list content, anchoring relative entries at `base_dir`.
///
/// Blank lines and lines starting with `#` (including `#EXTINF` directives)
/// contribute nothing.
pub fn parse_line_list_str(content: &str, base_dir: &Path) -> Vec<String> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| resolve_entry(line, base_dir, false))
        .collect()
}
