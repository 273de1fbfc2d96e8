//! The datum: the fixed geodetic point where the world frame is anchored.

use crate::coordinate_systems::{Utm, World};
use crate::engineering::{Orientation, Pose};
use crate::error::{GeonavError, Result};
use crate::geodetic::Wgs84;
use crate::math::RigidBodyTransform;
use crate::sample::FrameId;
use crate::utm::{UtmCoordinate, UtmZone};
use crate::Vector3;
use nalgebra::Translation3;
use std::sync::OnceLock;
use tracing::info;
use uom::si::{angle::degree, length::meter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A geodetic reference point together with the world frame it defines.
///
/// The world frame has its origin at the datum's UTM position (altitude included) and its axes
/// turned by the datum's orientation relative to the UTM grid. A `Datum` never changes once
/// constructed; re-datuming means building a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Datum {
    position: Wgs84,
    utm: UtmCoordinate,
    orientation: Orientation<Utm>,
    utm_to_world: RigidBodyTransform<Utm, World>,
}

impl Datum {
    /// Projects `position` onto the UTM grid and places the world frame there.
    ///
    /// Fails with [`GeonavError::InvalidLatitude`] outside the UTM band.
    pub fn new(position: Wgs84, orientation: Orientation<Utm>) -> Result<Self> {
        let utm = position.to_utm()?;
        let pose = Pose::new(utm.to_coordinate(), orientation);
        // SAFETY: the world frame is defined to sit at exactly this pose.
        let utm_to_world = unsafe { pose.map_as_zero_in::<World>() };

        let (yaw, pitch, roll) = orientation.to_tait_bryan_angles();
        info!(
            latitude = position.latitude().get::<degree>(),
            longitude = position.longitude().get::<degree>(),
            altitude = position.altitude().get::<meter>(),
            "datum set"
        );
        info!(
            zone = %utm.zone(),
            easting = utm.easting().get::<meter>(),
            northing = utm.northing().get::<meter>(),
            altitude = utm.altitude().get::<meter>(),
            "datum on UTM grid"
        );
        info!(
            roll = roll.get::<degree>(),
            pitch = pitch.get::<degree>(),
            yaw = yaw.get::<degree>(),
            "datum orientation"
        );

        Ok(Self {
            position,
            utm,
            orientation,
            utm_to_world,
        })
    }

    /// The geodetic position the datum was set at.
    #[must_use]
    pub fn position(&self) -> Wgs84 {
        self.position
    }

    /// The datum's position on the UTM grid, which is the world origin.
    #[must_use]
    pub fn utm(&self) -> UtmCoordinate {
        self.utm
    }

    #[must_use]
    pub fn zone(&self) -> UtmZone {
        self.utm.zone()
    }

    /// The orientation of the world axes relative to the UTM grid.
    #[must_use]
    pub fn orientation(&self) -> Orientation<Utm> {
        self.orientation
    }

    /// The pose of the world frame on the UTM grid; converts UTM values into world values.
    #[must_use]
    pub fn utm_to_world(&self) -> RigidBodyTransform<Utm, World> {
        self.utm_to_world
    }

    /// Converts world values into UTM values.
    #[must_use]
    pub fn world_to_utm(&self) -> RigidBodyTransform<World, Utm> {
        self.utm_to_world.inverse()
    }

    /// The world↔UTM relationship in the form a transform broadcaster publishes it: the pose of
    /// the `utm_frame` origin in `world_frame`.
    ///
    /// With `zero_altitude`, the vertical offset between the two frames is dropped.
    #[must_use]
    pub fn static_transform(
        &self,
        zero_altitude: bool,
        world_frame: &FrameId,
        utm_frame: &FrameId,
    ) -> StaticTransform {
        let mut transform = self.world_to_utm();
        if zero_altitude {
            let t = transform.inner.translation.vector;
            transform.inner.translation = Translation3::from(Vector3::new(t.x, t.y, 0.));
        }
        StaticTransform {
            parent_frame_id: world_frame.clone(),
            child_frame_id: utm_frame.clone(),
            transform,
        }
    }
}

/// A transform that does not change over time, with its frame names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticTransform {
    pub parent_frame_id: FrameId,
    pub child_frame_id: FrameId,
    pub transform: RigidBodyTransform<World, Utm>,
}

/// Holds the datum for a relay: unset until the first [`set`](DatumRegistry::set), then read
/// concurrently without locking.
///
/// A shared reference can only ever set the datum once. Replacing it needs `&mut`, which
/// guarantees no conversion is reading the old datum at the same time.
#[derive(Debug, Default)]
pub struct DatumRegistry {
    datum: OnceLock<Datum>,
}

impl DatumRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the datum if none is set yet, otherwise fails with
    /// [`GeonavError::DatumAlreadySet`].
    pub fn set(&self, datum: Datum) -> Result<()> {
        self.datum
            .set(datum)
            .map_err(|_| GeonavError::DatumAlreadySet)
    }

    /// Replaces the datum unconditionally.
    pub fn redatum(&mut self, datum: Datum) {
        self.datum = OnceLock::from(datum);
    }

    /// Fails with [`GeonavError::DatumNotSet`] until a datum has been set.
    pub fn get(&self) -> Result<&Datum> {
        self.datum.get().ok_or(GeonavError::DatumNotSet)
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.datum.get().is_some()
    }
}

impl From<Datum> for DatumRegistry {
    fn from(datum: Datum) -> Self {
        Self {
            datum: OnceLock::from(datum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Datum, DatumRegistry};
    use crate::engineering::{Orientation, Pose};
    use crate::error::GeonavError;
    use crate::geodetic::Wgs84;
    use crate::sample::FrameId;
    use crate::{coordinate, Coordinate};
    use approx::assert_relative_eq;
    use uom::si::f64::{Angle, Length};
    use uom::si::{angle::degree, length::meter};

    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }

    fn datum_at(lat: f64, lon: f64, alt: f64) -> Datum {
        Datum::new(
            Wgs84::from_degrees_and_meters(lat, lon, alt).unwrap(),
            Orientation::aligned(),
        )
        .unwrap()
    }

    #[test]
    fn datum_position_is_world_origin() {
        let datum = datum_at(45., -93., 12.);
        let at_datum = datum.utm().to_coordinate();
        assert_relative_eq!(
            datum.utm_to_world().transform(at_datum),
            Coordinate::origin(),
            epsilon = m(1e-9)
        );
        assert_relative_eq!(
            datum.world_to_utm().transform(Coordinate::origin()),
            at_datum,
            epsilon = m(1e-9)
        );
        assert_eq!(datum.zone().to_string(), "15T");
    }

    #[test]
    fn rotated_datum_turns_world_axes() {
        let position = Wgs84::from_degrees_and_meters(45., -93., 0.).unwrap();
        let facing_north = Orientation::from_tait_bryan_angles(
            Angle::new::<degree>(90.),
            Angle::new::<degree>(0.),
            Angle::new::<degree>(0.),
        );
        let datum = Datum::new(position, facing_north).unwrap();
        let utm = datum.utm();

        // 10m north of the datum is straight ahead along world X
        let ahead = coordinate!(
            e = utm.easting(),
            n = utm.northing() + m(10.),
            u = m(0.);
            in crate::systems::Utm
        );
        assert_relative_eq!(
            datum.utm_to_world().transform(ahead),
            coordinate!(e = m(10.), n = m(0.), u = m(0.); in crate::systems::World),
            epsilon = m(1e-6)
        );
        let origin = Pose::new(Coordinate::origin(), Orientation::aligned());
        assert_relative_eq!(
            datum.world_to_utm().transform(origin).orientation(),
            facing_north
        );
    }

    #[test]
    fn rejects_position_off_the_grid() {
        let position = Wgs84::from_degrees_and_meters(85., 0., 0.).unwrap();
        assert!(matches!(
            Datum::new(position, Orientation::aligned()),
            Err(GeonavError::InvalidLatitude { .. })
        ));
    }

    #[test]
    fn static_transform_publishes_utm_in_world() {
        let datum = datum_at(45., -93., 12.);
        let world = FrameId::new("odom").unwrap();
        let utm = FrameId::new("utm").unwrap();

        let tf = datum.static_transform(false, &world, &utm);
        assert_eq!(tf.parent_frame_id, world);
        assert_eq!(tf.child_frame_id, utm);
        let [e, n, u] = tf.transform.translation().to_cartesian();
        assert_relative_eq!(e.get::<meter>(), -500_000., epsilon = 1e-6);
        assert!(n.get::<meter>() < -4_900_000.);
        assert_relative_eq!(u.get::<meter>(), -12., epsilon = 1e-9);

        let flat = datum.static_transform(true, &world, &utm);
        let [fe, fn_, fu] = flat.transform.translation().to_cartesian();
        assert_eq!((fe, fn_), (e, n));
        assert_eq!(fu, m(0.));
    }

    #[test]
    fn registry_state_machine() {
        let mut registry = DatumRegistry::new();
        assert!(!registry.is_set());
        assert_eq!(registry.get(), Err(GeonavError::DatumNotSet));

        let first = datum_at(45., -93., 0.);
        registry.set(first).unwrap();
        assert_eq!(registry.get(), Ok(&first));

        let second = datum_at(46., -93., 0.);
        assert_eq!(registry.set(second), Err(GeonavError::DatumAlreadySet));
        assert_eq!(registry.get(), Ok(&first));

        registry.redatum(second);
        assert_eq!(registry.get(), Ok(&second));
        assert!(DatumRegistry::from(first).is_set());
    }

    #[test]
    fn identical_inputs_give_identical_datums() {
        assert_eq!(datum_at(-33.9, 151.2, 40.), datum_at(-33.9, 151.2, 40.));
    }
}
