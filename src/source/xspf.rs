//! XML tracklist parser (XSPF).
//!
//! Only `playlist/trackList/track/location` is read. Each location is a URL:
//! `file:` or scheme-less locations resolve to local paths, anything else is
//! a remote stream kept verbatim.

use super::location::resolve_entry;
use multiscreen_common::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tracing::{debug, warn};

/// Namespace every XSPF version 0/1 document declares.
pub const XSPF_NAMESPACE: &str = "http://xspf.org/ns/0/";

const LOCATION_PATH: [&str; 4] = ["playlist", "trackList", "track", "location"];

/// Read and parse an XSPF playlist.
///
/// `path` must be absolute so relative locations resolve to absolute paths.
pub fn parse_xml_tracklist(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::parse_failure(path, format!("read failed: {e}")))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("/"));
    let entries = parse_xml_tracklist_str(&content, base_dir)
        .map_err(|message| Error::parse_failure(path, message))?;

    debug!("Parsed {} tracks from {:?}", entries.len(), path);
    Ok(entries)
}

/// Parse XSPF content, anchoring relative locations at `base_dir`.
///
/// Returns a description of the problem for malformed documents.
pub fn parse_xml_tracklist_str(content: &str, base_dir: &Path) -> std::result::Result<Vec<String>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut saw_track_list = false;
    let mut track_location: Option<String> = None;
    let mut location_text = String::new();
    let mut track_index = 0usize;
    let mut entries = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("malformed XML at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() {
                    if name != "playlist" {
                        return Err(format!("root element is <{name}>, expected <playlist>"));
                    }
                    saw_root = true;
                    let namespace = e
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.as_ref() == b"xmlns")
                        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
                    if namespace.as_deref() != Some(XSPF_NAMESPACE) {
                        warn!("XSPF namespace is {:?}, expected {}", namespace, XSPF_NAMESPACE);
                    }
                }
                stack.push(name);
                if at_path(&stack, &LOCATION_PATH[..2]) {
                    saw_track_list = true;
                }
                if at_path(&stack, &LOCATION_PATH) {
                    location_text.clear();
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() {
                    return Err(format!("root element <{name}/> is empty"));
                }
                stack.push(name);
                if at_path(&stack, &LOCATION_PATH[..2]) {
                    saw_track_list = true;
                }
                if at_path(&stack, &LOCATION_PATH[..3]) {
                    track_index += 1;
                    warn!("Track {} has no location, skipping", track_index);
                }
                stack.pop();
            }
            Event::Text(t) => {
                if at_path(&stack, &LOCATION_PATH) {
                    let text = t
                        .unescape()
                        .map_err(|e| format!("bad text in <location>: {e}"))?;
                    location_text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if at_path(&stack, &LOCATION_PATH) {
                    location_text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if at_path(&stack, &LOCATION_PATH) {
                    let location = location_text.trim();
                    if track_location.is_none() && !location.is_empty() {
                        track_location = Some(location.to_string());
                    }
                } else if at_path(&stack, &LOCATION_PATH[..3]) {
                    track_index += 1;
                    match track_location.take() {
                        Some(location) => entries.push(resolve_entry(&location, base_dir, true)),
                        None => warn!("Track {} has no location, skipping", track_index),
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err("no <playlist> element".to_string());
    }
    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    if !saw_track_list {
        return Err("missing <trackList>".to_string());
    }

    Ok(entries)
}

fn at_path(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}
