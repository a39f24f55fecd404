//! Monitor enumeration and screen lookup.
//!
//! The registry is built once at startup from a [`MonitorProvider`] and is
//! read-only afterwards. Screens are addressed by 1-based index in the
//! provider's order.

pub mod xrandr;

use multiscreen_common::{Error, MonitorGeometry, Result};
use tracing::info;

pub use xrandr::XrandrMonitors;

/// Source of monitor geometry.
pub trait MonitorProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// List monitors in a stable order.
    fn enumerate(&self) -> Result<Vec<MonitorGeometry>>;
}

/// Fixed monitor layout, typically from the `[[monitors]]` config table.
#[derive(Debug, Clone)]
pub struct StaticMonitors {
    monitors: Vec<MonitorGeometry>,
}

impl StaticMonitors {
    pub fn new(monitors: Vec<MonitorGeometry>) -> Self {
        Self { monitors }
    }
}

impl MonitorProvider for StaticMonitors {
    fn name(&self) -> &'static str {
        "static"
    }

    fn enumerate(&self) -> Result<Vec<MonitorGeometry>> {
        Ok(self.monitors.clone())
    }
}

/// Enumerated monitors, indexed from 1.
#[derive(Debug, Clone)]
pub struct MonitorRegistry {
    monitors: Vec<MonitorGeometry>,
}

impl MonitorRegistry {
    /// Enumerate monitors through `provider`.
    ///
    /// Fails with [`Error::MonitorEnumeration`] if the provider fails or
    /// reports no monitors.
    pub fn enumerate(provider: &dyn MonitorProvider) -> Result<Self> {
        let monitors = provider.enumerate().map_err(|e| match e {
            Error::MonitorEnumeration(_) => e,
            other => Error::MonitorEnumeration(format!("{}: {}", provider.name(), other)),
        })?;

        let registry = Self::from_geometries(monitors)?;
        info!(
            "Detected {} monitor(s) via {}",
            registry.len(),
            provider.name()
        );
        Ok(registry)
    }

    /// Build a registry from known geometry.
    pub fn from_geometries(monitors: Vec<MonitorGeometry>) -> Result<Self> {
        if monitors.is_empty() {
            return Err(Error::MonitorEnumeration("no monitors detected".to_string()));
        }
        Ok(Self { monitors })
    }

    /// Geometry of the 1-based `screen`.
    pub fn geometry_for(&self, screen: u32) -> Result<MonitorGeometry> {
        let out_of_range = || Error::ScreenOutOfRange {
            screen,
            count: self.monitors.len(),
        };
        let index = usize::try_from(screen)
            .ok()
            .and_then(|s| s.checked_sub(1))
            .ok_or_else(out_of_range)?;
        self.monitors.get(index).copied().ok_or_else(out_of_range)
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Monitors paired with their 1-based screen index.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &MonitorGeometry)> {
        (1u32..).zip(self.monitors.iter())
    }
}
