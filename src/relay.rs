//! Turns geodetic navigation samples into UTM and world pose samples.

use crate::coordinate_systems::{Sensor, Utm, World};
use crate::datum::{Datum, DatumRegistry, StaticTransform};
use crate::engineering::Pose;
use crate::error::{GeonavError, Result};
use crate::geodetic::{Components, Wgs84};
use crate::math::RigidBodyTransform;
use crate::sample::{FrameId, NavSample, PoseSample, RelayOutput};
use crate::Coordinate;
use tracing::{debug, warn};
use uom::si::{angle::degree, length::meter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame names and output options for a [`FrameRelay`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelaySettings {
    /// `frame_id` of world samples, and parent of the static transform.
    pub world_frame_id: FrameId,
    /// `frame_id` of UTM samples, and child of the static transform.
    pub utm_frame_id: FrameId,
    /// The robot body frame. Outputs are not moved to it: they describe the sensor that
    /// produced the sample, which is assumed to sit at the robot's origin.
    pub base_link_frame_id: FrameId,
    /// Drop the vertical component of every output position.
    pub zero_altitude: bool,
}

/// Relays [`NavSample`]s into the UTM grid and into the world frame anchored at a [`Datum`].
///
/// Until a datum is set, every sample is refused with [`GeonavError::DatumNotSet`]. Relaying takes
/// `&self` and does not lock, so one relay can serve many threads.
#[derive(Debug)]
pub struct FrameRelay {
    settings: RelaySettings,
    datum: DatumRegistry,
}

impl FrameRelay {
    /// A relay that has no datum yet.
    #[must_use]
    pub fn new(settings: RelaySettings) -> Self {
        Self {
            settings,
            datum: DatumRegistry::new(),
        }
    }

    /// A relay that is ready to convert samples.
    #[must_use]
    pub fn with_datum(settings: RelaySettings, datum: Datum) -> Self {
        Self {
            settings,
            datum: DatumRegistry::from(datum),
        }
    }

    /// The frame names and options this relay was built with.
    #[must_use]
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Sets the datum once; see [`DatumRegistry::set`].
    pub fn set_datum(&self, datum: Datum) -> Result<()> {
        self.datum.set(datum)
    }

    /// Moves the world frame to a new datum.
    pub fn redatum(&mut self, datum: Datum) {
        self.datum.redatum(datum);
    }

    /// The current datum, or [`GeonavError::DatumNotSet`].
    pub fn datum(&self) -> Result<&Datum> {
        self.datum.get()
    }

    /// The world↔UTM transform to publish alongside relayed samples.
    pub fn static_transform(&self) -> Result<StaticTransform> {
        Ok(self.datum()?.static_transform(
            self.settings.zero_altitude,
            &self.settings.world_frame_id,
            &self.settings.utm_frame_id,
        ))
    }

    /// Converts one sample into its UTM and world counterparts.
    ///
    /// Both outputs carry the sample's stamp, orientation and twist unchanged, and the sample's
    /// covariance rotated onto the world axes. A sample with a non-finite position is refused
    /// with [`GeonavError::NonFiniteInput`].
    pub fn relay(&self, sample: &NavSample) -> Result<RelayOutput> {
        let datum = self.datum()?;

        if !sample.position.is_finite() {
            let Components {
                latitude,
                longitude,
                altitude,
            } = sample.position;
            warn!(frame = %sample.frame_id, "bad GPS fix, not transforming");
            return Err(GeonavError::NonFiniteInput {
                latitude_deg: latitude.get::<degree>(),
                longitude_deg: longitude.get::<degree>(),
                altitude_m: altitude.get::<meter>(),
            });
        }

        let position = Wgs84::build(sample.position)?;
        let utm = position.to_utm()?;
        debug!(
            latitude = position.latitude().get::<degree>(),
            longitude = position.longitude().get::<degree>(),
            altitude = position.altitude().get::<meter>(),
            %utm,
            "relaying fix"
        );

        let covariance = sample.covariance * datum.utm_to_world().rotation();

        let mut utm_pose = Pose::new(utm.to_coordinate(), sample.orientation);
        if self.settings.zero_altitude {
            utm_pose = utm_pose.flattened();
        }

        let in_datum_zone = if utm.zone() == datum.zone() {
            utm
        } else {
            debug!(
                sample_zone = %utm.zone(),
                datum_zone = %datum.zone(),
                "reprojecting into the datum zone"
            );
            position.to_utm_in_zone(datum.zone())?
        };
        // SAFETY: the sensor frame is the one located at the sample's pose.
        let utm_to_sensor: RigidBodyTransform<Utm, Sensor> = unsafe {
            Pose::new(in_datum_zone.to_coordinate(), sample.orientation).map_as_zero_in()
        };
        let world_to_sensor = datum.world_to_utm() * utm_to_sensor;
        let mut world_position = world_to_sensor.inverse_transform(Coordinate::<Sensor>::origin());
        if self.settings.zero_altitude {
            world_position = world_position.flattened();
        }
        let world_pose = Pose::new(
            world_position,
            sample.orientation.with_same_components_in::<World>(),
        );

        Ok(RelayOutput {
            utm: PoseSample {
                frame_id: self.settings.utm_frame_id.clone(),
                child_frame_id: sample.frame_id.clone(),
                stamp: sample.stamp,
                pose: utm_pose,
                covariance: covariance.with_same_components_in::<Utm>(),
                twist: sample.twist,
            },
            world: PoseSample {
                frame_id: self.settings.world_frame_id.clone(),
                child_frame_id: sample.frame_id.clone(),
                stamp: sample.stamp,
                pose: world_pose,
                covariance,
                twist: sample.twist,
            },
        })
    }

    /// Relays every sample, skipping (and logging) the ones that cannot be relayed.
    pub fn relay_all<'a>(&self, samples: impl IntoIterator<Item = &'a NavSample>) -> Vec<RelayOutput> {
        samples
            .into_iter()
            .filter_map(|sample| match self.relay(sample) {
                Ok(output) => Some(output),
                Err(error) => {
                    warn!(%error, stamp = %sample.stamp, "dropping sample");
                    None
                }
            })
            .collect()
    }
}
