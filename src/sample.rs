//! Stamped navigation samples flowing into and out of the [`FrameRelay`](crate::FrameRelay).

use crate::coordinate_systems::{Utm, World};
use crate::covariance::Covariance;
use crate::engineering::{Orientation, Pose};
use crate::error::{GeonavError, Result};
use crate::geodetic::Components;
use crate::{Matrix6, Vector3};
use chrono::{DateTime, Utc};
use std::fmt;
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The name of a coordinate frame, as used in `frame_id`/`child_frame_id` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct FrameId(String);

impl FrameId {
    /// Fails with [`GeonavError::InvalidFrameId`] for empty (or all-whitespace) names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GeonavError::InvalidFrameId(name));
        }
        Ok(Self(name))
    }

    /// Resolves this name against a tf prefix, giving `prefix/name`.
    ///
    /// Leading slashes on the name are dropped, trailing ones on the prefix too. An empty or
    /// missing prefix leaves the name unchanged.
    #[must_use]
    pub fn with_prefix(&self, prefix: Option<&str>) -> Self {
        let prefix = prefix.map(|p| p.trim_end_matches('/')).unwrap_or_default();
        let name = self.0.trim_start_matches('/');
        if prefix.is_empty() {
            return Self(self.0.clone());
        }
        Self(format!("{prefix}/{name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FrameId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FrameId {
    type Error = GeonavError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FrameId> for String {
    fn from(value: FrameId) -> Self {
        value.0
    }
}

/// Linear and angular velocity with their covariance.
///
/// The relay never looks inside; it is carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// m/s
    pub linear: Vector3,
    /// rad/s
    pub angular: Vector3,
    pub covariance: Matrix6,
}

/// A geodetic fix with orientation, as produced by a GPS/INS.
///
/// The orientation is relative to local east-north-up, which the relay treats as the UTM grid
/// axes (grid convergence is not applied).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavSample {
    /// The frame of the sensor that produced this sample.
    pub frame_id: FrameId,
    pub stamp: DateTime<Utc>,
    /// Not yet validated; the relay rejects non-finite values.
    pub position: Components,
    pub orientation: Orientation<Utm>,
    pub covariance: Covariance<Utm>,
    pub twist: Twist,
}

impl NavSample {
    /// A sample at `position` with aligned orientation, zero covariance and zero twist.
    pub fn new(frame_id: FrameId, stamp: DateTime<Utc>, position: Components) -> Self {
        Self {
            frame_id,
            stamp,
            position,
            orientation: Orientation::aligned(),
            covariance: Covariance::zero(),
            twist: Twist::default(),
        }
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation<Utm>) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_covariance(mut self, covariance: Covariance<Utm>) -> Self {
        self.covariance = covariance;
        self
    }

    #[must_use]
    pub fn with_twist(mut self, twist: Twist) -> Self {
        self.twist = twist;
        self
    }
}

/// A stamped pose with covariance, expressed in `In`.
///
/// `frame_id` names `In`; `child_frame_id` names the body whose pose this is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct PoseSample<In> {
    pub frame_id: FrameId,
    pub child_frame_id: FrameId,
    pub stamp: DateTime<Utc>,
    pub pose: Pose<In>,
    pub covariance: Covariance<In>,
    pub twist: Twist,
}

/// The two samples emitted for every accepted [`NavSample`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelayOutput {
    pub utm: PoseSample<Utm>,
    pub world: PoseSample<World>,
}
