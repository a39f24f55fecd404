//! Monitor detection through `xrandr --listmonitors` (X11 desktops).

use super::MonitorProvider;
use multiscreen_common::{Error, MonitorGeometry, Result};
use std::path::PathBuf;
use std::process::Command;

/// Enumerates monitors by running `xrandr --listmonitors`.
#[derive(Debug, Clone, Default)]
pub struct XrandrMonitors {
    binary: Option<PathBuf>,
}

impl XrandrMonitors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific xrandr executable instead of searching `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }
}

impl MonitorProvider for XrandrMonitors {
    fn name(&self) -> &'static str {
        "xrandr"
    }

    fn enumerate(&self) -> Result<Vec<MonitorGeometry>> {
        let binary = match &self.binary {
            Some(binary) => binary.clone(),
            None => which::which("xrandr")
                .map_err(|_| Error::MonitorEnumeration("xrandr not found in PATH".to_string()))?,
        };

        let output = Command::new(&binary)
            .arg("--listmonitors")
            .output()
            .map_err(|e| Error::MonitorEnumeration(format!("failed to run xrandr: {e}")))?;

        if !output.status.success() {
            return Err(Error::MonitorEnumeration(format!(
                "xrandr exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_list_monitors(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `xrandr --listmonitors` output.
///
/// ```text
/// Monitors: 2
///  0: +*DP-1 1920/527x1080/296+0+0  DP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
pub fn parse_list_monitors(output: &str) -> Vec<MonitorGeometry> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Monitors:"))
        .filter_map(|line| line.split_whitespace().nth(2))
        .filter_map(parse_geometry_token)
        .collect()
}

/// Parse a `W/mmWxH/mmH+X+Y` token.
fn parse_geometry_token(token: &str) -> Option<MonitorGeometry> {
    let (width_part, rest) = token.split_once('x')?;
    let width: u32 = width_part.split('/').next()?.parse().ok()?;

    let offset_start = rest.find(|c: char| c == '+' || c == '-')?;
    let (height_part, offsets) = rest.split_at(offset_start);
    let height: u32 = height_part.split('/').next()?.parse().ok()?;

    let (x, y) = parse_offsets(offsets)?;
    Some(MonitorGeometry::new(x, y, width, height))
}

/// Parse `+X+Y` / `-X+Y` style offsets.
fn parse_offsets(offsets: &str) -> Option<(i32, i32)> {
    let second = offsets[1..].find(|c: char| c == '+' || c == '-')? + 1;
    let x = offsets[..second].parse().ok()?;
    let y = offsets[second..].parse().ok()?;
    Some((x, y))
}
