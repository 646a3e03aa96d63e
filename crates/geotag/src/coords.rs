//! Degrees/minutes/seconds to signed decimal degree conversion
//!
//! EXIF stores a GPS coordinate as a hemisphere reference letter plus three
//! unsigned rationals. The query API uses the same shape, joined with
//! underscores (`N_40_30_0`). Both paths funnel through [`to_decimal`] so an
//! indexed position and a query bound computed from the same tuple compare
//! exactly equal.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'N' => Some(Hemisphere::North),
            'S' => Some(Hemisphere::South),
            'E' => Some(Hemisphere::East),
            'W' => Some(Hemisphere::West),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }

    /// South and West map to negative decimal degrees
    pub fn is_negative(&self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }

    pub fn is_latitude(&self) -> bool {
        matches!(self, Hemisphere::North | Hemisphere::South)
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl std::str::FromStr for Hemisphere {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Hemisphere::from_letter(letter)
                .with_context(|| format!("Invalid hemisphere: {}. Valid options: N, S, E, W", s)),
            _ => bail!("Invalid hemisphere: {:?}. Expected a single letter", s),
        }
    }
}

/// Convert a hemisphere and DMS components to signed decimal degrees.
///
/// The arithmetic order is fixed (`degrees + minutes/60 + seconds/3600`, then
/// sign) so results are reproducible bit for bit. Non-finite input propagates
/// as NaN/infinity; callers validate upstream.
pub fn to_decimal(hemisphere: Hemisphere, degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    if hemisphere.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// A single coordinate in degrees/minutes/seconds form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dms {
    pub hemisphere: Hemisphere,
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    pub fn new(hemisphere: Hemisphere, degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            hemisphere,
            degrees,
            minutes,
            seconds,
        }
    }

    pub fn to_decimal(&self) -> f64 {
        to_decimal(self.hemisphere, self.degrees, self.minutes, self.seconds)
    }
}

impl std::fmt::Display for Dms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.hemisphere, self.degrees, self.minutes, self.seconds
        )
    }
}

impl std::str::FromStr for Dms {
    type Err = anyhow::Error;

    /// Parse the underscore-joined query form, e.g. `W_73_57_0`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 4 {
            bail!(
                "Invalid coordinate {:?}: expected hemisphere_degrees_minutes_seconds",
                s
            );
        }

        let hemisphere: Hemisphere = parts[0].parse()?;
        let mut components = [0.0f64; 3];
        for (slot, raw) in components.iter_mut().zip(&parts[1..]) {
            let value: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid number {:?} in coordinate {:?}", raw, s))?;
            if !value.is_finite() || value < 0.0 {
                bail!("Coordinate components must be finite and non-negative: {:?}", s);
            }
            *slot = value;
        }

        Ok(Dms::new(hemisphere, components[0], components[1], components[2]))
    }
}

/// A validated geographic position in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    /// Build a position, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude out of range [-90, 90]: {}", latitude);
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude out of range [-180, 180]: {}", longitude);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a position from a latitude and a longitude in DMS form.
    /// The hemisphere letters must sit on the right axis.
    pub fn from_dms(latitude: &Dms, longitude: &Dms) -> Result<Self> {
        if !latitude.hemisphere.is_latitude() {
            bail!("Latitude reference must be N or S, got {}", latitude.hemisphere);
        }
        if longitude.hemisphere.is_latitude() {
            bail!("Longitude reference must be E or W, got {}", longitude.hemisphere);
        }
        Self::new(latitude.to_decimal(), longitude.to_decimal())
    }
}
