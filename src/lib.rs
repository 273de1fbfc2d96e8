//! This library relays geodetic navigation fixes (latitude, longitude, altitude plus orientation
//! and uncertainty) into a projected [UTM](UtmCoordinate) grid and into a local "world" frame
//! anchored at a fixed reference point, the [`Datum`].
//!
//! Positions and transforms are typed by the frame they live in. A [`Coordinate`] or [`Vector`] is
//! generic over a [`CoordinateSystem`] ([`Utm`](systems::Utm), [`World`](systems::World),
//! [`Sensor`](systems::Sensor), or one of your own made with [`system!`]), so a UTM coordinate
//! cannot be mistaken for a world one. Moving between frames goes through the constructs in
//! [`math`] ([rigid body transforms](math::RigidBodyTransform) and
//! [rotations](math::Rotation)) or their friendlier [`engineering`] counterparts
//! ([`Pose`](engineering::Pose) and [`Orientation`](engineering::Orientation)).
//! Pose uncertainty travels alongside as a [`Covariance`], tagged with the frame whose axes it is
//! expressed along.
//!
//! The [`FrameRelay`] ties these together: it holds the datum and turns each [`NavSample`] into a
//! UTM [`PoseSample`] and a world [`PoseSample`].
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use geonav::{geodetic::Components, Config, FrameId, NavSample};
//! use uom::si::f64::{Angle, Length};
//! use uom::si::{angle::degree, length::meter};
//!
//! // usually deserialized from a settings file
//! let config = Config {
//!     datum: Some(vec![45., -93., 0.]),
//!     ..Config::default()
//! };
//! let relay = config.build_relay()?;
//!
//! // a fix roughly 111m north of the datum
//! let fix = NavSample::new(
//!     FrameId::new("gps")?,
//!     Utc::now(),
//!     Components {
//!         latitude: Angle::new::<degree>(45.001),
//!         longitude: Angle::new::<degree>(-93.),
//!         altitude: Length::new::<meter>(2.),
//!     },
//! );
//!
//! let out = relay.relay(&fix)?;
//! assert_eq!(out.utm.frame_id.as_str(), "utm");
//! assert_eq!(out.world.frame_id.as_str(), "odom");
//!
//! let north = out.world.pose.position().enu_north().get::<meter>();
//! assert!((north - 111.).abs() < 1.);
//! # Ok::<(), geonav::GeonavError>(())
//! ```

#[macro_use]
mod coordinate_systems;

mod config;
mod coordinates;
mod covariance;
mod datum;
mod error;
mod relay;
mod sample;
mod util;
mod utm;
mod vectors;

pub mod engineering;
pub mod geodetic;
pub mod math;

pub(crate) type Point3 = nalgebra::Point3<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;
pub(crate) type UnitQuaternion = nalgebra::UnitQuaternion<f64>;
pub(crate) type Isometry3 = nalgebra::Isometry3<f64>;
pub(crate) type Matrix3 = nalgebra::Matrix3<f64>;
pub type Matrix6 = nalgebra::Matrix6<f64>;

/// Well-known coordinate systems and conventions.
pub mod systems {
    pub use super::coordinate_systems::{
        EnuComponents, EnuLike, EquivalentTo, HasComponents, RightHandedXyzLike, Sensor, Utm,
        World, XyzComponents,
    };
    pub use super::geodetic::Wgs84;
}
pub use config::{Config, DatumConfig};
pub use coordinate_systems::CoordinateSystem;
pub use coordinates::Coordinate;
pub use covariance::Covariance;
pub use datum::{Datum, DatumRegistry, StaticTransform};
pub use error::{GeonavError, Result};
pub use relay::{FrameRelay, RelaySettings};
pub use sample::{FrameId, NavSample, PoseSample, RelayOutput, Twist};
pub use utm::{UtmCoordinate, UtmZone};
pub use vectors::Vector;
