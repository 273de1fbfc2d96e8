use uom::si::f64::Length;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::{Coordinate, Vector};

/// A coordinate system (or "frame") that [`Coordinate`]s, [`Vector`]s, poses and transforms can
/// be expressed in.
///
/// Prefer defining new systems with the [`system!`](crate::system) macro.
pub trait CoordinateSystem {
    /// The meaning of the three cartesian axes of this system.
    type Convention;
}

/// Associates a convention with the named components used to build values in it.
pub trait HasComponents {
    type Components: Into<[Length; 3]>;
}

/// Declares that two coordinate systems are the same frame, defined in different places.
///
/// # Safety
///
/// Implementing this trait allows values to move between `Self` and `OtherCoordinateSystem`
/// without any change to their components. It must only be implemented when the two systems
/// share origin and axes.
pub unsafe trait EquivalentTo<OtherCoordinateSystem> {}

unsafe impl<System> EquivalentTo<System> for System {}

/// East-North-Up axes on a locally flat patch of the earth.
///
/// Both the UTM grid and the datum-anchored world frame use this convention: X is (grid) east,
/// Y is (grid) north, and Z is up along the local vertical.
pub struct EnuLike;

#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct EnuComponents {
    pub east: Length,
    pub north: Length,
    pub up: Length,
}

impl From<EnuComponents> for [Length; 3] {
    fn from(c: EnuComponents) -> [Length; 3] {
        [c.east, c.north, c.up]
    }
}

impl HasComponents for EnuLike {
    type Components = EnuComponents;
}

/// A right-handed cartesian system with no further semantics attached to its axes.
///
/// Sensor and vehicle body frames use this convention (typically X forward, Y left, Z up).
pub struct RightHandedXyzLike;

#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct XyzComponents {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl From<XyzComponents> for [Length; 3] {
    fn from(c: XyzComponents) -> [Length; 3] {
        [c.x, c.y, c.z]
    }
}

impl HasComponents for RightHandedXyzLike {
    type Components = XyzComponents;
}

/// Defines a new coordinate system type.
///
/// ```
/// use geonav::{system, Coordinate};
/// use uom::si::{f64::Length, length::meter};
///
/// system!(pub struct MastNav using ENU);
/// system!(struct GpsAntenna using right-handed XYZ);
///
/// let zero = Length::new::<meter>(0.);
/// let up = Coordinate::<MastNav>::from_cartesian(zero, zero, Length::new::<meter>(2.));
/// assert_eq!(up.enu_up(), Length::new::<meter>(2.));
/// ```
#[macro_export]
macro_rules! system {
    ($(#[$attr:meta])* $vis:vis struct $name:ident using right-handed XYZ) => {
        $crate::system!($(#[$attr])* $vis struct $name as RightHandedXyzLike);
    };
    ($(#[$attr:meta])* $vis:vis struct $name:ident using ENU) => {
        $crate::system!($(#[$attr])* $vis struct $name as EnuLike);
    };
    {
        $(#[$attr:meta])*
        $vis:vis struct $name:ident
        as $convention:ident
    } => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::CoordinateSystem for $name {
            type Convention = $crate::systems::$convention;
        }
    };
}

system! {
    /// The UTM grid: easting, northing, and altitude above the ellipsoid.
    ///
    /// Note that a `Coordinate<Utm>` does not carry its zone. Values from different zones must
    /// not be mixed; see [`UtmCoordinate`](crate::UtmCoordinate) for the zone-tagged form.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Utm using ENU
}

system! {
    /// The local tangent frame anchored at the [datum](crate::Datum), often called `odom`.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct World using ENU
}

system! {
    /// The body frame of the navigation sensor that produced a sample.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Sensor using right-handed XYZ
}
