//! # Location Status and Last-Fix Cache
//!
//! The solar calculator is a pure function and never asks the platform
//! for a position. This module holds the two pieces that sit between it
//! and the outside world:
//!
//! - [`LocationStatus`], an explicit tagged variant of the platform
//!   permission/fix state machine (not-determined, denied, acquired,
//!   unavailable) for the presentation layer to branch on
//! - a small JSON cache of the last known fix, so a sunrise countdown
//!   can be shown between location updates and across restarts
//!
//! ## Caching Strategy
//!
//! The cache record carries its own `recorded_at` timestamp; staleness
//! is judged against that instant rather than file metadata, because
//! the age of the *fix* is the domain question. A day-old coordinate is
//! still a fine sunrise predictor, so the default TTL is generous.
//! Cache write failures are non-fatal to callers; a failed read simply
//! means no countdown is shown.

use crate::GeoCoordinate;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// Default fix-cache location. `/tmp` keeps it off permanent storage
/// and clears it on reboot.
pub const DEFAULT_CACHE_PATH: &str = "/tmp/drift_fix.json";

/// Default maximum accepted fix age in seconds (24 hours).
pub const FIX_TTL_SECS: i64 = 86_400;

/// Errors raised by fix-cache operations.
#[derive(Error, Debug)]
pub enum LocationError {
    /// Cache file operations failed (missing, permissions, disk)
    #[error("fix cache IO: {0}")]
    Io(#[from] io::Error),

    /// Cache file exists but is not a valid fix record
    #[error("fix cache format: {0}")]
    Format(#[from] serde_json::Error),

    /// Cached fix is older than the accepted TTL
    #[error("cached fix is stale")]
    Stale,
}

/// Platform location state as the presentation layer sees it.
///
/// The platform permission flow is glue outside this crate; what the
/// dashboard needs is only which of these four cases it is in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocationStatus {
    /// Permission has not been requested yet
    NotDetermined,
    /// Permission was refused; sunrise features stay hidden
    Denied,
    /// Permission granted and a coordinate is known
    Acquired(GeoCoordinate),
    /// Permission granted but no fix could be obtained
    Unavailable,
}

impl LocationStatus {
    /// Coordinate to feed the solar calculator, if any.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match self {
            LocationStatus::Acquired(coordinate) => Some(*coordinate),
            _ => None,
        }
    }

    /// Whether the user has granted location access at all.
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            LocationStatus::Acquired(_) | LocationStatus::Unavailable
        )
    }
}

/// Last known position with the instant it was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedFix {
    pub coordinate: GeoCoordinate,
    pub recorded_at: DateTime<Utc>,
}

/// Load the cached fix from `path`, rejecting records older than
/// `max_age_secs` as of `now`.
pub fn load_fix_from<P: AsRef<Path>>(
    path: P,
    now: DateTime<Utc>,
    max_age_secs: i64,
) -> Result<CachedFix, LocationError> {
    let data = fs::read(path)?;
    let fix: CachedFix = serde_json::from_slice(&data)?;

    let age = now.signed_duration_since(fix.recorded_at);
    if age > Duration::seconds(max_age_secs) {
        return Err(LocationError::Stale);
    }
    Ok(fix)
}

/// Save a fix to `path` for future sessions.
pub fn save_fix_to<P: AsRef<Path>>(path: P, fix: &CachedFix) -> Result<(), LocationError> {
    let data = serde_json::to_vec(fix)?;
    fs::write(path, data)?;
    Ok(())
}

/// Fold a cache lookup into the status the dashboard branches on: a
/// fresh fix is an acquired position, anything else means the platform
/// has to be asked again.
pub fn status_from_cache<P: AsRef<Path>>(path: P, now: DateTime<Utc>) -> LocationStatus {
    match load_fix_from(path, now, FIX_TTL_SECS) {
        Ok(fix) => LocationStatus::Acquired(fix.coordinate),
        Err(_) => LocationStatus::NotDetermined,
    }
}
