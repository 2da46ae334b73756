//! Loose host version parsing for feature gating
//!
//! Host and integration versions arrive in assorted shapes (`8.6`, `9.1.0-rc3`,
//! `8.10.0-dev`). Only the first two numeric components matter; anything from
//! the first `-` on is a pre-release qualifier and is ignored.

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// The `major.minor` part of a version; ordered as a tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
}

impl HostVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// True if this version is at least `minimum`
    pub fn satisfies(&self, minimum: &HostVersion) -> bool {
        self >= minimum
    }
}

impl From<(u32, u32)> for HostVersion {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for HostVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_version(s).map(HostVersion::from)
    }
}

/// Parse a version string into its first two numeric components
pub fn parse_version(version: &str) -> Result<(u32, u32)> {
    let release = version.trim().split('-').next().unwrap_or_default();
    let mut parts = release.split('.');

    let mut component = |name: &str| -> Result<u32> {
        let part = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::config(format!("version '{version}' has no {name} number")))?;
        part.parse::<u32>().map_err(|_| {
            CoreError::config(format!("version '{version}' has a non-numeric {name} part '{part}'"))
        })
    };

    let major = component("major")?;
    let minor = component("minor")?;
    Ok((major, minor))
}
