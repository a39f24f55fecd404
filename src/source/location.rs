//! Normalization of playlist entries into playable locations.
//!
//! A location is either an absolute filesystem path or a remote URL kept
//! verbatim. Relative entries are anchored at the playlist's directory.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

/// Parse `entry` as a URL with a real scheme.
///
/// Single-letter schemes are drive letters (`C:/videos/a.mp4`), not URLs.
pub fn parse_url(entry: &str) -> Option<Url> {
    match Url::parse(entry) {
        Ok(url) if url.scheme().len() > 1 => Some(url),
        _ => None,
    }
}

/// Schemes treated as streams even without a `//` authority.
const STREAM_SCHEMES: &[&str] = &[
    "http", "https", "rtsp", "rtsps", "rtmp", "rtmps", "rtp", "srt", "udp", "tcp", "mms", "mmsh",
    "ftp", "ytdl",
];

/// Whether `url` points at the network rather than at a local name that
/// merely contains a colon (`ab:clip.mp4`).
fn is_network_url(url: &Url) -> bool {
    url.scheme() != "file" && (url.has_host() || STREAM_SCHEMES.contains(&url.scheme()))
}

/// Whether `entry` names a remote stream rather than a local file.
pub fn is_remote(entry: &str) -> bool {
    parse_url(entry).is_some_and(|url| is_network_url(&url))
}

/// Strip the separator that file-URL conversion leaves in front of a drive
/// letter (`/C:/a b.mp4` -> `C:/a b.mp4`).
pub fn strip_drive_prefix(path: &str, drive_letter_paths: bool) -> &str {
    if !drive_letter_paths {
        return path;
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
    {
        &path[1..]
    } else {
        path
    }
}

/// Convert a `file:` URL into a local path string.
pub fn file_url_to_path(url: &Url, drive_letter_paths: bool) -> String {
    let decoded = percent_decode_str(url.path()).decode_utf8_lossy();
    let path = strip_drive_prefix(&decoded, drive_letter_paths).to_string();
    match url.host_str() {
        Some(host) if !host.is_empty() && host != "localhost" => format!("//{}{}", host, path),
        _ => path,
    }
}

/// Anchor `path` at `base_dir` unless it is already absolute.
pub fn absolutize(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Resolve a playlist entry to a playable location.
///
/// Remote URLs are returned unchanged. `file:` URLs are percent-decoded.
/// Bare paths are percent-decoded only when `decode_bare` is set, since in
/// line-oriented playlists a `%` is an ordinary filename character.
pub fn resolve_entry(entry: &str, base_dir: &Path, decode_bare: bool) -> String {
    let local = match parse_url(entry) {
        Some(url) if url.scheme() == "file" => file_url_to_path(&url, cfg!(windows)),
        Some(url) if is_network_url(&url) => return entry.to_string(),
        _ if decode_bare => percent_decode_str(entry).decode_utf8_lossy().into_owned(),
        _ => entry.to_string(),
    };

    absolutize(Path::new(&local), base_dir)
        .to_string_lossy()
        .into_owned()
}
