//! Version-string helpers for the library version embedded in step configs.
//!
//! Strings follow the `"0.1.1.dev0"` pattern: major and minor are required,
//! patch defaults to 0, and an optional `devN` suffix marks a pre-release.

use crate::error::RegistryError;

/// Parsed version: (major, minor, patch, dev). `dev` is `None` for a full
/// release.
pub type Version = (u32, u32, u32, Option<u32>);

/// Parse a version string into its component parts.
/// `"0.1.1.dev0"` parses to `(0, 1, 1, Some(0))`, `"0.2"` to
/// `(0, 2, 0, None)`.
pub fn parse_version(v: &str) -> Result<Version, RegistryError> {
    let bad = || RegistryError::Version(v.to_string());

    let (release, dev) = match v.split_once("dev") {
        Some((head, tail)) => {
            let dev: u32 = tail.parse().map_err(|_| bad())?;
            (head.trim_end_matches('.'), Some(dev))
        }
        None => (v, None),
    };

    let parts: Vec<&str> = release.split('.').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(bad());
    }
    let major: u32 = parts[0].parse().map_err(|_| bad())?;
    let minor: u32 = parts[1].parse().map_err(|_| bad())?;
    let patch: u32 = match parts.get(2) {
        Some(p) => p.parse().map_err(|_| bad())?,
        None => 0,
    };
    Ok((major, minor, patch, dev))
}

/// Whether version string `a` is greater than or equal to `b`.
///
/// `dev` versions are pre-releases of their patch level, so
/// `"0.2" < "0.2.1.dev5" < "0.2.1"`.
pub fn version_greater_or_equal(a: &str, b: &str) -> Result<bool, RegistryError> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;

    let release = |v: Version| (v.0, v.1, v.2);
    if release(a) != release(b) {
        return Ok(release(a) > release(b));
    }
    Ok(match (a.3, b.3) {
        // A full release outranks any pre-release of the same patch level.
        (None, _) => true,
        (Some(_), None) => false,
        (Some(x), Some(y)) => x >= y,
    })
}
