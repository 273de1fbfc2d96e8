//! Typed settings for a [`FrameRelay`], as deserialized by whatever loads them.

use crate::datum::Datum;
use crate::engineering::Orientation;
use crate::error::{GeonavError, Result};
use crate::geodetic::Wgs84;
use crate::relay::{FrameRelay, RelaySettings};
use crate::sample::FrameId;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Datum yaw above this (in radians) is reported as ignored.
const IGNORED_YAW_TOLERANCE: f64 = 0.01;

/// Relay settings.
///
/// Every field has a default, so a partial document deserializes. Only `datum` has no sensible
/// default, and leaving it out is an error unless `allow_zero_datum` is set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Config {
    /// `[latitude°, longitude°, yaw rad]`.
    pub datum: Option<Vec<f64>>,
    /// Pin every output (and the static transform) to the datum's horizontal plane.
    pub zero_altitude: bool,
    /// Whether the transport layer should publish [`Datum::static_transform`].
    pub broadcast_utm_transform: bool,
    /// Hz. Used by the transport layer only.
    pub frequency: f64,
    pub world_frame_id: String,
    pub utm_frame_id: String,
    pub base_link_frame_id: String,
    pub tf_prefix: Option<String>,
    /// Fall back to a datum at 0°N 0°E rather than failing when `datum` is missing or
    /// malformed.
    pub allow_zero_datum: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datum: None,
            zero_altitude: false,
            broadcast_utm_transform: false,
            frequency: 10.,
            world_frame_id: "odom".to_owned(),
            utm_frame_id: "utm".to_owned(),
            base_link_frame_id: "base_link".to_owned(),
            tf_prefix: None,
            allow_zero_datum: false,
        }
    }
}

/// A parsed `datum` setting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatumConfig {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Accepted for compatibility and otherwise ignored: the world frame is always aligned with
    /// the UTM grid.
    pub yaw_rad: f64,
}

impl DatumConfig {
    /// Parses `[latitude°, longitude°, yaw rad, ...]`.
    ///
    /// Anything past the third value is a leftover of an older format and is ignored with a
    /// warning.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let [latitude_deg, longitude_deg, yaw_rad, rest @ ..] = values else {
            return Err(GeonavError::MalformedDatumConfig(format!(
                "expected [latitude, longitude, yaw], got {} value(s)",
                values.len()
            )));
        };
        if !rest.is_empty() {
            warn!(
                extra = rest.len(),
                "datum has more than three values; the format is [latitude, longitude, yaw] and extra values are ignored"
            );
        }
        if ![latitude_deg, longitude_deg, yaw_rad]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(GeonavError::MalformedDatumConfig(format!(
                "non-finite datum [{latitude_deg}, {longitude_deg}, {yaw_rad}]"
            )));
        }
        if yaw_rad.abs() > IGNORED_YAW_TOLERANCE {
            warn!(yaw = *yaw_rad, "datum yaw is ignored; world axes stay aligned with UTM");
        }
        Ok(Self {
            latitude_deg: *latitude_deg,
            longitude_deg: *longitude_deg,
            yaw_rad: *yaw_rad,
        })
    }

    /// Builds the datum at this position, at zero altitude and aligned with the UTM grid.
    pub fn to_datum(&self) -> Result<Datum> {
        let position = Wgs84::from_degrees_and_meters(self.latitude_deg, self.longitude_deg, 0.)?;
        Datum::new(position, Orientation::aligned())
    }
}

impl Config {
    /// Parses [`Config::datum`], applying the `allow_zero_datum` fallback.
    pub fn datum_config(&self) -> Result<DatumConfig> {
        let parsed = match &self.datum {
            Some(values) => DatumConfig::from_values(values),
            None => Err(GeonavError::MalformedDatumConfig(
                "no datum configured".to_owned(),
            )),
        };
        match parsed {
            Err(GeonavError::MalformedDatumConfig(reason)) if self.allow_zero_datum => {
                warn!(%reason, "falling back to a datum at 0°N 0°E; positions will be meaningless");
                Ok(DatumConfig::default())
            }
            other => other,
        }
    }

    pub fn datum(&self) -> Result<Datum> {
        self.datum_config()?.to_datum()
    }

    /// Frame ids and flags for the relay, with `tf_prefix` applied.
    pub fn relay_settings(&self) -> Result<RelaySettings> {
        let prefix = self.tf_prefix.as_deref();
        let frame = |name: &str| FrameId::new(name).map(|id| id.with_prefix(prefix));
        Ok(RelaySettings {
            world_frame_id: frame(&self.world_frame_id)?,
            utm_frame_id: frame(&self.utm_frame_id)?,
            base_link_frame_id: frame(&self.base_link_frame_id)?,
            zero_altitude: self.zero_altitude,
        })
    }

    /// A relay with its datum already set.
    pub fn build_relay(&self) -> Result<FrameRelay> {
        Ok(FrameRelay::with_datum(self.relay_settings()?, self.datum()?))
    }
}
