//! # Settings Persistence
//!
//! Loads and saves the one persisted record in the system, the user's
//! [`ClockParameters`], as a TOML file.
//!
//! The store is deliberately dumb: `load` returns exactly what is on
//! disk (or `None` when nothing is), `save` writes exactly what it is
//! given, and neither ever rewrites or defaults a record. Callers run
//! [`crate::clock::normalize`] before saving, which keeps normalization
//! a pure, separately testable step instead of a storage side effect.

use crate::clock::{ClockError, ClockParameters};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// Default settings file location, relative to the working directory.
pub const DEFAULT_PATH: &str = "drift-config.toml";

/// Errors raised while reading or writing the settings file.
///
/// A missing file is not an error (it is the `Ok(None)` load result);
/// everything else is surfaced rather than silently defaulted.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file operations failed (permissions, disk space)
    #[error("settings IO: {0}")]
    Io(#[from] io::Error),

    /// Settings file exists but is not valid TOML for this schema
    #[error("settings parse: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parameters could not be encoded to TOML
    #[error("settings encode: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Stored record violates the parameter invariants
    #[error("stored parameters invalid: {0}")]
    Invalid(#[from] ClockError),
}

/// Load parameters from the default location.
pub fn load() -> Result<Option<ClockParameters>, SettingsError> {
    load_from_path(DEFAULT_PATH)
}

/// Load parameters from `path`.
///
/// Returns `Ok(None)` when no file exists. A file that exists but does
/// not parse, or parses to an invalid record (non-positive day length),
/// is an error the caller must handle explicitly.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<ClockParameters>, SettingsError> {
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let params: ClockParameters = toml::from_str(&contents)?;
    params.validate()?;
    Ok(Some(params))
}

/// Save parameters to the default location.
pub fn save(params: &ClockParameters) -> Result<(), SettingsError> {
    save_to_path(DEFAULT_PATH, params)
}

/// Save parameters to `path` as pretty-printed TOML.
pub fn save_to_path<P: AsRef<Path>>(
    path: P,
    params: &ClockParameters,
) -> Result<(), SettingsError> {
    let contents = toml::to_string_pretty(params)?;
    fs::write(path, contents)?;
    Ok(())
}
