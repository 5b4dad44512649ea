//! # Drift Clock Core Library
//!
//! This library provides the calculation core for the drift-clock
//! application, which tracks a user's "non-24-hour" biological day — a
//! personal day cycle that is longer or shorter than the civil 24-hour
//! day and therefore drifts across the clock face over time.
//!
//! ## Design Philosophy
//!
//! ### Pure Calculation Core
//! - **Stateless**: both calculators are pure functions over immutable
//!   inputs. Evaluating the model never mutates anything, so any number
//!   of threads can query it concurrently without locks.
//! - **Recompute, never store**: derived values ([`clock::ClockState`],
//!   progress, countdowns) are recomputed on demand from the parameters
//!   and a query instant. Only [`clock::ClockParameters`] is persisted.
//! - **Fail fast on bad configuration**: invalid parameters are rejected
//!   at construction rather than silently clamped. Defensive clamping is
//!   reserved for derived read-only views so display code never sees an
//!   out-of-range value, even under floating-point edge cases.
//!
//! ### Two Independent Calculators
//! 1. **Biological clock** ([`clock`]): maps a real-world instant to a
//!    biological day index plus an intra-day offset, and inverts that
//!    mapping to find when a target offset next recurs.
//! 2. **Solar events** ([`solar`]): the classic Sunrise Equation — a
//!    geographic coordinate, a calendar date and a time zone in, an
//!    optional sunrise/sunset instant out. "No event today" (polar day
//!    or night) is a normal result, not an error.
//!
//! ### Data Flow
//! 1. **Startup**: settings file → [`clock::ClockParameters`] →
//!    normalized via [`clock::normalize`]
//! 2. **Refresh loop** (owned by the caller): fresh instant →
//!    [`clock::ClockParameters::state_at`] → dashboard values
//! 3. **Sunrise countdown**: cached location fix → [`solar::next_sunrise`]
//!
//! ## Core Types
//!
//! The library root exports the one value type shared by the solar
//! calculator and the location collaborator:
//! - [`GeoCoordinate`]: a latitude/longitude pair in degrees

use serde::{Deserialize, Serialize};

// Module declarations
pub mod clock;
pub mod location;
pub mod settings;
pub mod solar;

// Convenience re-exports for the binary and embedding callers
pub use clock::{ClockError, ClockParameters, ClockState};
pub use location::LocationStatus;
pub use solar::SolarEvent;

/// A geographic position in decimal degrees.
///
/// Latitude is positive north of the equator, longitude positive east
/// of Greenwich. The type has no stored lifecycle: callers pass the
/// latest known coordinate per call, and the calculators never cache or
/// request one themselves.
///
/// # Example
/// ```
/// use drift_clock_lib::GeoCoordinate;
///
/// // Reykjavik
/// let here = GeoCoordinate { latitude: 64.15, longitude: -21.94 };
/// assert!(here.latitude > 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Degrees north (negative = south), expected range [-90, 90]
    pub latitude: f64,
    /// Degrees east (negative = west), expected range [-180, 180]
    pub longitude: f64,
}
