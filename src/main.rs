//! # Drift Clock Application Entry Point
//!
//! This binary is a thin dispatcher over `drift_clock_lib`: it loads
//! the persisted clock parameters, evaluates the model at "now" (or at
//! a pinned instant for diagnostics), and prints a textual dashboard
//! with the biological clock face, the daily drift, the next wake
//! instant, and, when a location fix is cached, the next sunrise.


use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use drift_clock_lib::{clock, location, settings, solar};
use std::env;

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path =
        flag_value(&args, "--config").unwrap_or_else(|| settings::DEFAULT_PATH.to_string());

    // Diagnostics can pin the evaluation instant with --at <rfc3339>
    let now = match flag_value(&args, "--at") {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("invalid --at instant: {raw}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let params = load_parameters(&config_path, now)?;

    let state = params.state_at(now)?;
    let face = state.clock_face();
    println!(
        "Biological day {} at {:02}:{:02}:{:02} ({}% through a {} cycle)",
        state.day_index,
        face.hours,
        face.minutes,
        face.seconds,
        (state.progress() * 100.0).round() as i64,
        fmt_duration(params.day_length_secs),
    );
    println!(
        "Drift: {} per civil day, next rollover in {}",
        fmt_drift(params.daily_drift_secs()),
        fmt_duration(state.remaining_secs()),
    );

    let wake_offset = clock::normalize_wake_offset_secs(
        params.preferred_wake_offset_secs,
        params.day_length_secs,
    );
    let wake = params.next_occurrence(wake_offset, now)?;
    println!(
        "Next wake at {} (in {})",
        wake.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        fmt_duration((wake - now).num_seconds() as f64),
    );

    // Sunrise countdown only when a usable fix is cached; the solar
    // calculator itself never asks the platform for a position
    match location::load_fix_from(location::DEFAULT_CACHE_PATH, now, location::FIX_TTL_SECS) {
        Ok(fix) => {
            let local_now = now.with_timezone(&Local);
            match solar::next_sunrise(fix.coordinate, &local_now) {
                Some(sunrise) => {
                    println!("Next sunrise at {}", sunrise.format("%Y-%m-%d %H:%M"))
                }
                None => println!("No sunrise within two days at this latitude"),
            }
        }
        Err(err) => {
            eprintln!("No usable location fix ({err}); skipping the sunrise countdown");
        }
    }

    Ok(())
}

/// Load and normalize stored parameters, falling back to a starter
/// cycle when no settings file exists yet. Malformed settings are an
/// error, not a fallback.
fn load_parameters(path: &str, now: DateTime<Utc>) -> anyhow::Result<clock::ClockParameters> {
    match settings::load_from_path(path) {
        Ok(Some(params)) => {
            Ok(clock::normalize(&params).context("stored parameters failed validation")?)
        }
        Ok(None) => {
            eprintln!("No settings found at {path}; using a starter 24h30m cycle");
            starter_parameters(now)
        }
        Err(err) => Err(err).with_context(|| format!("could not load settings from {path}")),
    }
}

/// A 24 h 30 m cycle anchored at the most recent UTC midnight, the
/// onboarding default before the user has measured their own day.
fn starter_parameters(now: DateTime<Utc>) -> anyhow::Result<clock::ClockParameters> {
    let reference_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .context("midnight of the current date")?
        .and_utc();
    let params = clock::ClockParameters::from_clock_time(24, 30, 0, reference_start)?;
    Ok(clock::normalize(&params)?)
}

/// Value following `flag` in the argument list, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

/// Compact "3h05m" / "42m" rendering for countdowns and cycle lengths.
fn fmt_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// Signed drift rendering, for example "+30m" or "-1h12m".
fn fmt_drift(secs: f64) -> String {
    let sign = if secs < 0.0 { "-" } else { "+" };
    format!("{sign}{}", fmt_duration(secs.abs()))
}
