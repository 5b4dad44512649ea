//! Sunrise/sunset instants via the classic Sunrise Equation
//! (Ed Williams' Aviation Formulary / NOAA variant).
//!
//! Accuracy: a few minutes, which is ample for a dashboard countdown.
//! All intermediate angles are kept in degrees and folded into range
//! with floored modulos; polar day and polar night surface as `None`,
//! never as an error.

use crate::GeoCoordinate;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, Offset, TimeZone};

/// Zenith angle for official sunrise/sunset: 90° plus refraction and
/// the solar disc radius.
const ZENITH_DEG: f64 = 90.833;

/// Which horizon crossing to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolarEvent {
    Sunrise,
    Sunset,
}

/// Compute the instant of sunrise or sunset for `date` at `coordinate`,
/// expressed in the supplied time zone.
///
/// Returns `None` when the sun never crosses the zenith circle on that
/// date at that latitude (polar day or polar night). The zone's UTC
/// offset is evaluated at local day-start so daylight-saving
/// transitions on the date itself do not skew the result, and the final
/// day adjustment loops rather than assuming a single ±1 step.
pub fn solar_event<Tz: TimeZone>(
    coordinate: GeoCoordinate,
    date: NaiveDate,
    tz: &Tz,
    event: SolarEvent,
) -> Option<DateTime<Tz>> {
    let day_of_year = date.ordinal() as f64;
    let lng_hour = coordinate.longitude / 15.0;
    let base_hour = match event {
        SolarEvent::Sunrise => 6.0,
        SolarEvent::Sunset => 18.0,
    };
    let approx_time = day_of_year + (base_hour - lng_hour) / 24.0;

    // Sun's mean anomaly, then true ecliptic longitude
    let mean_anomaly = 0.9856 * approx_time - 3.289;
    let true_longitude = normalize_degrees(
        mean_anomaly
            + 1.916 * sin_deg(mean_anomaly)
            + 0.020 * sin_deg(2.0 * mean_anomaly)
            + 282.634,
    );

    // Right ascension, pulled into the same quadrant as the true longitude
    let mut right_ascension = normalize_degrees(atan_deg(0.91764 * tan_deg(true_longitude)));
    let lng_quadrant = (true_longitude / 90.0).floor() * 90.0;
    let ra_quadrant = (right_ascension / 90.0).floor() * 90.0;
    right_ascension += lng_quadrant - ra_quadrant;
    let right_ascension_hours = right_ascension / 15.0;

    // Solar declination
    let sin_declination = 0.39782 * sin_deg(true_longitude);
    let cos_declination = sin_declination.asin().cos();

    // Local hour angle at the zenith crossing
    let cos_hour_angle = (cos_deg(ZENITH_DEG)
        - sin_declination * sin_deg(coordinate.latitude))
        / (cos_declination * cos_deg(coordinate.latitude));
    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        // No crossing today at this latitude
        return None;
    }

    let mut hour_angle = acos_deg(cos_hour_angle);
    if event == SolarEvent::Sunrise {
        hour_angle = 360.0 - hour_angle;
    }
    let hour_angle_hours = hour_angle / 15.0;

    let local_mean_time =
        hour_angle_hours + right_ascension_hours - 0.06571 * approx_time - 6.622;
    let universal_hours = normalize_hours(local_mean_time - lng_hour);

    // Zone offset at local day-start of the queried date
    let day_start = local_day_start(tz, date)?;
    let offset_hours = day_start.offset().fix().local_minus_utc() as f64 / 3600.0;

    let mut local_hours = universal_hours + offset_hours;
    let mut day = date;
    while local_hours < 0.0 {
        local_hours += 24.0;
        day = day.pred_opt()?;
    }
    while local_hours >= 24.0 {
        local_hours -= 24.0;
        day = day.succ_opt()?;
    }

    let day_start = local_day_start(tz, day)?;
    Some(day_start + Duration::milliseconds((local_hours * 3_600_000.0).round() as i64))
}

/// First sunrise strictly after `after`, in `after`'s own time zone.
///
/// Checks the calendar day containing `after`, then the following day.
/// `None` means neither day has a sunrise (polar conditions).
pub fn next_sunrise<Tz: TimeZone>(
    coordinate: GeoCoordinate,
    after: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tz = after.timezone();
    let today = after.date_naive();

    if let Some(sunrise) = solar_event(coordinate, today, &tz, SolarEvent::Sunrise) {
        if sunrise > *after {
            return Some(sunrise);
        }
    }

    let tomorrow = today.succ_opt()?;
    solar_event(coordinate, tomorrow, &tz, SolarEvent::Sunrise)
}

/// Start of the civil day in `tz`. A daylight-saving gap can swallow
/// midnight, in which case the first existing whole hour stands in.
fn local_day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let mut naive = date.and_hms_opt(0, 0, 0)?;
    for _ in 0..4 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(instant) => return Some(instant),
            LocalResult::Ambiguous(earlier, _) => return Some(earlier),
            LocalResult::None => naive = naive + Duration::hours(1),
        }
    }
    None
}

/// Floored modulo into [0, 360) degrees.
fn normalize_degrees(value: f64) -> f64 {
    value.rem_euclid(360.0)
}

/// Floored modulo into [0, 24) hours.
fn normalize_hours(value: f64) -> f64 {
    value.rem_euclid(24.0)
}

fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_deg(deg: f64) -> f64 {
    deg.to_radians().cos()
}

fn tan_deg(deg: f64) -> f64 {
    deg.to_radians().tan()
}

fn atan_deg(value: f64) -> f64 {
    value.atan().to_degrees()
}

fn acos_deg(value: f64) -> f64 {
    value.acos().to_degrees()
}
