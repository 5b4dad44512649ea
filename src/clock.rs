//! # Biological Clock Model
//!
//! This module implements the cyclic time model at the heart of the
//! tracker. A user's biological day has a fixed length (for example
//! 24 h 48 m) anchored at a reference instant; every real-world instant
//! then maps to a biological day index plus an offset within that day.
//!
//! ## Model Characteristics
//!
//! ### Sawtooth Decomposition
//! For a query instant `t` the model computes
//! `elapsed = t - reference_start`, splits it with a floored division
//! into completed cycles and a remainder, and reports:
//! - **day index**: `reference_day_index + completed` (monotonically
//!   non-decreasing in `t`)
//! - **offset**: the remainder, always in `[0, day_length)` even for
//!   instants before the reference start and even when floating-point
//!   residue lands exactly on a cycle boundary
//!
//! ### Inverse Mapping
//! [`ClockParameters::next_occurrence`] answers "when does biological
//! offset X next occur after instant T", which drives the wake-time
//! countdown. The target is normalized with a floored modulo, so any
//! real-valued offset (negative, or larger than one day) is accepted.
//!
//! ### Validation Policy
//! Construction fails fast on a non-positive day length or negative
//! user-entered time components. Derived read-only views (progress,
//! remaining time) clamp defensively instead, so rendering code never
//! observes an out-of-range value.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the civil day, for drift comparisons.
pub const CIVIL_DAY_SECS: f64 = 86_400.0;

/// Shortest accepted preferred sleep duration (3 h).
pub const SLEEP_MIN_SECS: f64 = 3.0 * 3600.0;

/// Longest accepted preferred sleep duration (14 h).
pub const SLEEP_MAX_SECS: f64 = 14.0 * 3600.0;

/// Preferred sleep durations snap to this step (5 minutes).
pub const SLEEP_STEP_SECS: f64 = 300.0;

/// Sleep duration substituted when the user expressed no preference (7.5 h).
pub const DEFAULT_SLEEP_SECS: f64 = 7.5 * 3600.0;

/// Wake offset substituted when the user expressed no preference (6 h
/// into the biological day).
pub const DEFAULT_WAKE_OFFSET_SECS: f64 = 6.0 * 3600.0;

/// Errors raised by clock-model construction and evaluation.
///
/// The first variant corresponds to malformed stored parameters; the
/// other two to malformed raw user input and are meant to be surfaced
/// for re-prompting rather than treated as fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    /// Day length must be a positive, finite number of seconds
    #[error("day length must be positive, got {0} s")]
    NonPositiveDayLength(f64),

    /// A user-entered time component (hours/minutes/seconds) was negative
    #[error("time components must not be negative")]
    NegativeComponent,

    /// User-entered components sum to a zero-length day
    #[error("day length must be greater than zero")]
    ZeroLengthDay,
}

/// Immutable configuration of one user's biological day cycle.
///
/// This is the only persisted record in the system (see
/// [`crate::settings`]). Everything else is recomputed on demand.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use drift_clock_lib::clock::ClockParameters;
///
/// // A 25-hour biological day anchored at midnight UTC
/// let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
/// let params = ClockParameters::new(25.0 * 3600.0, anchor).unwrap();
/// assert_eq!(params.reference_day_index, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockParameters {
    /// Duration of one biological day in seconds, strictly positive
    pub day_length_secs: f64,
    /// Real-world instant corresponding to offset 0 of the reference day
    pub reference_start: DateTime<Utc>,
    /// Integer label of the biological day containing `reference_start`
    pub reference_day_index: i64,
    /// Intra-day offset (seconds) the user treats as wake time
    pub preferred_wake_offset_secs: Option<f64>,
    /// Preferred sleep duration (seconds); normalized before storage
    pub preferred_sleep_secs: Option<f64>,
}

/// Position within the biological cycle at one query instant.
///
/// Derived and never persisted. The invariant
/// `0 <= offset_secs < day_length_secs` holds for every value this
/// library produces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockState {
    /// Biological day index, non-decreasing as real time advances
    pub day_index: i64,
    /// Seconds since the start of the current biological day
    pub offset_secs: f64,
    /// Cycle length copied from the parameters
    pub day_length_secs: f64,
}

/// Hour/minute/second reading of a biological-day offset.
///
/// Hours can exceed 23 for day lengths beyond 24 h.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockFace {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockParameters {
    /// Create parameters for a cycle of `day_length_secs` seconds
    /// anchored at `reference_start`, with day index 0 and no wake or
    /// sleep preferences.
    ///
    /// Fails with [`ClockError::NonPositiveDayLength`] unless the day
    /// length is finite and strictly positive. Invalid input is never
    /// silently defaulted.
    pub fn new(day_length_secs: f64, reference_start: DateTime<Utc>) -> Result<Self, ClockError> {
        if !day_length_secs.is_finite() || day_length_secs <= 0.0 {
            return Err(ClockError::NonPositiveDayLength(day_length_secs));
        }
        Ok(ClockParameters {
            day_length_secs,
            reference_start,
            reference_day_index: 0,
            preferred_wake_offset_secs: None,
            preferred_sleep_secs: None,
        })
    }

    /// Build parameters from raw user-entered clock components, as the
    /// onboarding form supplies them.
    ///
    /// Any negative component fails with
    /// [`ClockError::NegativeComponent`]; components summing to zero
    /// fail with [`ClockError::ZeroLengthDay`]. Both are re-prompt
    /// conditions for the caller, not process-fatal states.
    ///
    /// # Example
    /// ```
    /// use chrono::Utc;
    /// use drift_clock_lib::clock::ClockParameters;
    ///
    /// let params = ClockParameters::from_clock_time(24, 48, 0, Utc::now()).unwrap();
    /// assert_eq!(params.day_length_secs, 89_280.0);
    /// ```
    pub fn from_clock_time(
        hours: i64,
        minutes: i64,
        seconds: i64,
        reference_start: DateTime<Utc>,
    ) -> Result<Self, ClockError> {
        if hours < 0 || minutes < 0 || seconds < 0 {
            return Err(ClockError::NegativeComponent);
        }
        let total = hours * 3600 + minutes * 60 + seconds;
        if total == 0 {
            return Err(ClockError::ZeroLengthDay);
        }
        Self::new(total as f64, reference_start)
    }

    /// Check the stored-parameter invariant (`day_length_secs` finite
    /// and positive). Deserialized records go through this before use.
    pub fn validate(&self) -> Result<(), ClockError> {
        if !self.day_length_secs.is_finite() || self.day_length_secs <= 0.0 {
            return Err(ClockError::NonPositiveDayLength(self.day_length_secs));
        }
        Ok(())
    }

    /// Map a real-world instant to its biological day index and
    /// intra-day offset.
    ///
    /// Uses a floored division so instants before the reference start
    /// produce negative day indexes with offsets still in
    /// `[0, day_length)`. Floating-point residue at a cycle boundary is
    /// folded back into range in either direction.
    pub fn state_at(&self, instant: DateTime<Utc>) -> Result<ClockState, ClockError> {
        self.validate()?;
        let day_length = self.day_length_secs;
        let elapsed = signed_secs(instant - self.reference_start);

        let mut completed = (elapsed / day_length).floor();
        let mut offset = elapsed - completed * day_length;
        if offset < 0.0 {
            offset += day_length;
            completed -= 1.0;
        }
        if offset >= day_length {
            offset -= day_length;
            completed += 1.0;
        }

        Ok(ClockState {
            day_index: self.reference_day_index + completed as i64,
            offset_secs: offset,
            day_length_secs: day_length,
        })
    }

    /// Next real-world instant at which the cycle reaches
    /// `target_offset_secs`, strictly counting from `after`.
    ///
    /// The target is first normalized into `[0, day_length)` with a
    /// floored modulo, so negative and multi-day inputs are accepted.
    /// The returned instant is always `>= after`, and evaluating
    /// [`Self::state_at`] there yields the normalized target offset
    /// within a microsecond of tolerance.
    pub fn next_occurrence(
        &self,
        target_offset_secs: f64,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ClockError> {
        let state = self.state_at(after)?;
        let day_length = state.day_length_secs;
        let target = target_offset_secs.rem_euclid(day_length);

        let wait = if target > state.offset_secs {
            target - state.offset_secs
        } else {
            // Already past the target today, wrap to the next cycle
            (day_length - state.offset_secs) + target
        };

        Ok(after + secs_duration(wait))
    }

    /// How much longer (positive) or shorter (negative) than the civil
    /// day one biological day runs, in seconds per cycle.
    pub fn daily_drift_secs(&self) -> f64 {
        self.day_length_secs - CIVIL_DAY_SECS
    }
}

impl ClockState {
    /// Fraction of the biological day already elapsed, clamped to [0, 1].
    pub fn progress(&self) -> f64 {
        (self.offset_secs / self.day_length_secs).clamp(0.0, 1.0)
    }

    /// Seconds until the biological day rolls over, clamped to >= 0.
    pub fn remaining_secs(&self) -> f64 {
        (self.day_length_secs - self.offset_secs).max(0.0)
    }

    /// Decompose the offset into a displayable hour/minute/second reading.
    pub fn clock_face(&self) -> ClockFace {
        let total = self.offset_secs.max(0.0) as u64;
        ClockFace {
            hours: (total / 3600) as u32,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
        }
    }
}

/// Normalize a preferred sleep duration: floor to the nearest 5-minute
/// step, then clamp into [3 h, 14 h]. `None` (and non-finite stored
/// values) substitute the 7.5 h default.
///
/// Idempotent: the clamp bounds are themselves multiples of the step,
/// so a second application is a no-op.
pub fn normalize_sleep_secs(preferred: Option<f64>) -> f64 {
    let raw = match preferred {
        Some(secs) if secs.is_finite() => secs,
        _ => DEFAULT_SLEEP_SECS,
    };
    let snapped = (raw / SLEEP_STEP_SECS).floor() * SLEEP_STEP_SECS;
    snapped.clamp(SLEEP_MIN_SECS, SLEEP_MAX_SECS)
}

/// Normalize a preferred wake offset against a given day length: `None`
/// (and non-finite stored values) substitute the 6 h default, then a
/// floored modulo folds the offset into `[0, day_length)`.
pub fn normalize_wake_offset_secs(preferred: Option<f64>, day_length_secs: f64) -> f64 {
    let raw = match preferred {
        Some(secs) if secs.is_finite() => secs,
        _ => DEFAULT_WAKE_OFFSET_SECS,
    };
    raw.rem_euclid(day_length_secs)
}

/// Pure normalization of a full parameter record: both preferences are
/// resolved to concrete in-range values, everything else is untouched.
///
/// Callers apply this before persisting (see [`crate::settings`]); the
/// store itself never rewrites records. Applying it twice yields the
/// same record as applying it once.
pub fn normalize(params: &ClockParameters) -> Result<ClockParameters, ClockError> {
    params.validate()?;
    Ok(ClockParameters {
        preferred_wake_offset_secs: Some(normalize_wake_offset_secs(
            params.preferred_wake_offset_secs,
            params.day_length_secs,
        )),
        preferred_sleep_secs: Some(normalize_sleep_secs(params.preferred_sleep_secs)),
        ..params.clone()
    })
}

/// Signed seconds in a chrono duration, including the sub-second part.
fn signed_secs(delta: Duration) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        // Microsecond count only overflows i64 past ~292,000 years
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Non-negative seconds as a chrono duration with nanosecond rounding.
fn secs_duration(secs: f64) -> Duration {
    Duration::nanoseconds((secs * 1_000_000_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn params_25h() -> ClockParameters {
        ClockParameters::new(25.0 * 3600.0, anchor()).unwrap()
    }

    #[test]
    fn construction_rejects_non_positive_day_length() {
        assert_eq!(
            ClockParameters::new(0.0, anchor()),
            Err(ClockError::NonPositiveDayLength(0.0))
        );
        assert_eq!(
            ClockParameters::new(-60.0, anchor()),
            Err(ClockError::NonPositiveDayLength(-60.0))
        );
        assert!(matches!(
            ClockParameters::new(f64::NAN, anchor()),
            Err(ClockError::NonPositiveDayLength(_))
        ));
    }

    #[test]
    fn clock_time_construction_validates_components() {
        assert_eq!(
            ClockParameters::from_clock_time(-1, 0, 0, anchor()),
            Err(ClockError::NegativeComponent)
        );
        assert_eq!(
            ClockParameters::from_clock_time(24, -5, 0, anchor()),
            Err(ClockError::NegativeComponent)
        );
        assert_eq!(
            ClockParameters::from_clock_time(0, 0, 0, anchor()),
            Err(ClockError::ZeroLengthDay)
        );

        let params = ClockParameters::from_clock_time(25, 30, 15, anchor()).unwrap();
        assert_eq!(params.day_length_secs, 25.0 * 3600.0 + 30.0 * 60.0 + 15.0);
    }

    #[test]
    fn offset_stays_in_range_across_a_sweep() {
        let params = params_25h();

        // Includes instants well before the reference start
        for step in -200..200 {
            let instant = anchor() + Duration::minutes(step * 47);
            let state = params.state_at(instant).unwrap();
            assert!(
                state.offset_secs >= 0.0 && state.offset_secs < params.day_length_secs,
                "offset {} out of range at {}",
                state.offset_secs,
                instant
            );
        }
    }

    #[test]
    fn day_index_is_monotonic() {
        let params = params_25h();
        let mut previous = i64::MIN;

        for step in -100..300 {
            let instant = anchor() + Duration::minutes(step * 93);
            let state = params.state_at(instant).unwrap();
            assert!(
                state.day_index >= previous,
                "day index regressed at step {step}: {} < {previous}",
                state.day_index
            );
            previous = state.day_index;
        }
    }

    #[test]
    fn reference_start_round_trip() {
        let params = params_25h();

        let at_start = params.state_at(anchor()).unwrap();
        assert_eq!(at_start.day_index, params.reference_day_index);
        assert_eq!(at_start.offset_secs, 0.0);

        let one_cycle = params
            .state_at(anchor() + Duration::hours(25))
            .unwrap();
        assert_eq!(one_cycle.day_index, params.reference_day_index + 1);
        assert!(
            one_cycle.offset_secs.abs() < 1e-6,
            "offset after one full cycle should be ~0, got {}",
            one_cycle.offset_secs
        );
    }

    #[test]
    fn instants_before_reference_get_negative_day_indexes() {
        let params = params_25h();
        let state = params.state_at(anchor() - Duration::hours(1)).unwrap();

        assert_eq!(state.day_index, -1);
        assert!(
            (state.offset_secs - 24.0 * 3600.0).abs() < 1e-6,
            "one hour before the anchor should sit 24 h into day -1, got {}",
            state.offset_secs
        );
    }

    #[test]
    fn next_occurrence_is_never_in_the_past() {
        let params = params_25h();

        for step in 0..120 {
            let after = anchor() + Duration::minutes(step * 171);
            for target in [-7200.0, 0.0, 3600.0, 90_000.0, 250_000.0] {
                let next = params.next_occurrence(target, after).unwrap();
                assert!(
                    next >= after,
                    "next occurrence of {target} at {after} returned earlier instant {next}"
                );
            }
        }
    }

    #[test]
    fn next_occurrence_round_trips_through_state_at() {
        let params = params_25h();
        let after = anchor() + Duration::minutes(13_577);

        for target in [-7200.0, 0.0, 3600.0, 89_999.0, 123_456.0] {
            let next = params.next_occurrence(target, after).unwrap();
            let offset = params.state_at(next).unwrap().offset_secs;
            let expected = target.rem_euclid(params.day_length_secs);
            assert!(
                (offset - expected).abs() < 1e-6
                    || (offset - expected).abs() > params.day_length_secs - 1e-6,
                "offset at next occurrence was {offset}, expected {expected}"
            );
        }
    }

    #[test]
    fn next_occurrence_wraps_when_target_already_passed() {
        let params = params_25h();
        // 10 h into biological day 0
        let after = anchor() + Duration::hours(10);

        // Target earlier in the day wraps one full cycle forward
        let next = params.next_occurrence(6.0 * 3600.0, after).unwrap();
        let wait = (next - after).num_seconds();
        assert_eq!(wait, 21 * 3600, "expected 25h - 10h + 6h wait, got {wait} s");

        // A target equal to the current offset also wraps
        let same = params.next_occurrence(10.0 * 3600.0, after).unwrap();
        assert_eq!((same - after).num_seconds(), 25 * 3600);
    }

    #[test]
    fn sleep_normalization_is_idempotent() {
        for raw in [
            None,
            Some(0.0),
            Some(-500.0),
            Some(9_999.0),
            Some(10_800.0),
            Some(27_001.0),
            Some(27_299.0),
            Some(50_400.0),
            Some(99_999.0),
            Some(f64::INFINITY),
        ] {
            let once = normalize_sleep_secs(raw);
            let twice = normalize_sleep_secs(Some(once));
            assert_eq!(once, twice, "normalization of {raw:?} is not idempotent");
            assert!(
                (SLEEP_MIN_SECS..=SLEEP_MAX_SECS).contains(&once),
                "normalized sleep {once} outside bounds"
            );
            assert_eq!(once % SLEEP_STEP_SECS, 0.0, "sleep {once} not on a 5-minute step");
        }
    }

    #[test]
    fn sleep_normalization_defaults_and_floors() {
        assert_eq!(normalize_sleep_secs(None), DEFAULT_SLEEP_SECS);
        // 7 h 33 m floors to 7 h 30 m
        assert_eq!(normalize_sleep_secs(Some(27_180.0)), 27_000.0);
        // Below the floor clamps up, above clamps down
        assert_eq!(normalize_sleep_secs(Some(3_600.0)), SLEEP_MIN_SECS);
        assert_eq!(normalize_sleep_secs(Some(90_000.0)), SLEEP_MAX_SECS);
    }

    #[test]
    fn wake_normalization_folds_into_the_day() {
        let day = 25.0 * 3600.0;
        assert_eq!(normalize_wake_offset_secs(None, day), DEFAULT_WAKE_OFFSET_SECS);
        assert_eq!(normalize_wake_offset_secs(Some(-3600.0), day), day - 3600.0);
        assert_eq!(normalize_wake_offset_secs(Some(day + 60.0), day), 60.0);
    }

    #[test]
    fn full_normalization_is_idempotent() {
        let mut params = params_25h();
        params.preferred_wake_offset_secs = Some(-4.0 * 3600.0);
        params.preferred_sleep_secs = Some(12_345.0);

        let once = normalize(&params).unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.day_length_secs, params.day_length_secs);
        assert_eq!(once.reference_start, params.reference_start);
    }

    #[test]
    fn derived_views_stay_clamped() {
        let params = params_25h();
        let state = params.state_at(anchor() + Duration::hours(20)).unwrap();

        assert!((0.0..=1.0).contains(&state.progress()));
        assert!(state.remaining_secs() >= 0.0);
        assert!(
            (state.remaining_secs() - 5.0 * 3600.0).abs() < 1e-6,
            "20 h into a 25 h day leaves 5 h, got {}",
            state.remaining_secs()
        );

        // A hand-built boundary state must not escape the clamps
        let degenerate = ClockState {
            day_index: 0,
            offset_secs: 90_000.5,
            day_length_secs: 90_000.0,
        };
        assert_eq!(degenerate.progress(), 1.0);
        assert_eq!(degenerate.remaining_secs(), 0.0);
    }

    #[test]
    fn clock_face_decomposes_the_offset() {
        let state = ClockState {
            day_index: 3,
            offset_secs: 26.0 * 3600.0 + 5.0 * 60.0 + 9.0,
            day_length_secs: 30.0 * 3600.0,
        };
        let face = state.clock_face();
        assert_eq!((face.hours, face.minutes, face.seconds), (26, 5, 9));
    }

    #[test]
    fn drift_is_relative_to_the_civil_day() {
        let params = params_25h();
        assert_eq!(params.daily_drift_secs(), 3600.0);

        let short = ClockParameters::new(23.5 * 3600.0, anchor()).unwrap();
        assert_eq!(short.daily_drift_secs(), -1800.0);
    }

    #[test]
    fn parameters_survive_a_serde_round_trip() {
        let mut params = params_25h();
        params.preferred_sleep_secs = Some(27_000.0);

        let encoded = toml::to_string(&params).unwrap();
        let decoded: ClockParameters = toml::from_str(&encoded).unwrap();
        assert_eq!(params, decoded);

        // Optional fields may be absent entirely
        let minimal: ClockParameters = toml::from_str(
            "day_length_secs = 90000.0\n\
             reference_start = \"2024-03-01T00:00:00Z\"\n\
             reference_day_index = 0\n",
        )
        .unwrap();
        assert_eq!(minimal.preferred_wake_offset_secs, None);
        assert_eq!(minimal.preferred_sleep_secs, None);
    }
}
