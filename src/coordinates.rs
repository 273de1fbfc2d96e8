use crate::coordinate_systems::{CoordinateSystem, EnuLike, HasComponents, RightHandedXyzLike};
use crate::math::RigidBodyTransform;
use crate::systems::EquivalentTo;
use crate::vectors::Vector;
use crate::{engineering, Point3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines a point (ie, position) in the coordinate system specified by `In`.
///
/// Depending on the convention of the coordinate system (eg, [`EnuLike`] or
/// [`RightHandedXyzLike`]), you'll have different appropriately-named accessors for the
/// coordinate's cartesian components like [`Coordinate::enu_north`] or [`Coordinate::x`].
///
/// <div class="warning">
///
/// When deserializing, the coordinate system of the deserialized value is _not_ checked.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require In: Serialize/Deserialize since we skip it anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coordinate<In> {
    /// X, Y, Z in meters
    pub(crate) point: Point3,
    #[cfg_attr(feature = "serde", serde(skip))]
    system: PhantomData<In>,
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for Coordinate<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Coordinate<In> {}

/// Constructs a [`Coordinate`] from named components.
///
/// ```
/// use geonav::{coordinate, systems::Utm};
/// use uom::si::{f64::Length, length::meter};
///
/// fn m(meters: f64) -> Length {
///     Length::new::<meter>(meters)
/// }
///
/// let antenna = coordinate!(e = m(481_581.), n = m(4_983_132.), u = m(10.); in Utm);
/// assert_eq!(antenna.enu_north(), m(4_983_132.));
/// ```
#[macro_export]
macro_rules! coordinate {
    ($x:tt = $xx:expr, $y:tt = $yy:expr, $z:tt = $zz:expr $(,)?) => {
        $crate::coordinate!($x = $xx, $y = $yy, $z = $zz; in _)
    };
    (e = $e:expr, n = $n:expr, u = $u:expr; in $in:ty) => {
        $crate::Coordinate::<$in>::build($crate::systems::EnuComponents {
            east: $e.into(),
            north: $n.into(),
            up: $u.into(),
        })
    };
    (x = $x:expr, y = $y:expr, z = $z:expr; in $in:ty) => {
        $crate::Coordinate::<$in>::build($crate::systems::XyzComponents {
            x: $x.into(),
            y: $y.into(),
            z: $z.into(),
        })
    };
}

impl<In> Coordinate<In> {
    pub(crate) fn from_nalgebra_point(p: Point3) -> Self {
        Self {
            point: p,
            system: PhantomData,
        }
    }

    /// Constructs a coordinate from the named components of `In`'s convention.
    pub fn build(components: <In::Convention as HasComponents>::Components) -> Self
    where
        In: CoordinateSystem,
        In::Convention: HasComponents,
    {
        let [x, y, z] = components.into();
        Self::from_cartesian(x, y, z)
    }

    /// Constructs a coordinate at the given (x, y, z) cartesian point in the [`CoordinateSystem`]
    /// `In`.
    ///
    /// The meaning of `x`, `y`, and `z` is dictated by the [`CoordinateSystem::Convention`] of
    /// `In`. For example, in [`EnuLike`], `x` is East, `y` is North, and `z` is Up.
    pub fn from_cartesian(
        x: impl Into<Length>,
        y: impl Into<Length>,
        z: impl Into<Length>,
    ) -> Self {
        Self::from_nalgebra_point(Point3::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        ))
    }

    /// Returns the origin of `In`.
    #[must_use]
    pub fn origin() -> Self {
        Self {
            point: Point3::origin(),
            system: PhantomData,
        }
    }

    /// Constructs a transform into [`CoordinateSystem`] `To` whose origin is this coordinate and
    /// whose axes are aligned with those of `In`.
    ///
    /// # Safety
    ///
    /// See [`engineering::Pose::map_as_zero_in`].
    #[doc(alias = "as_transform_to")]
    #[must_use]
    pub unsafe fn map_as_zero_in<To>(self) -> RigidBodyTransform<In, To> {
        unsafe {
            engineering::Pose::new(self, engineering::Orientation::aligned()).map_as_zero_in()
        }
    }

    /// Re-interprets the components of this coordinate as being in `NewIn`.
    ///
    /// This performs no transformation. Only use this where two frames share their axes _by
    /// construction_ and the caller has accounted for any difference in origin, as the relay
    /// does when it reuses a UTM-frame quantity for the world frame.
    #[must_use]
    pub fn with_same_components_in<NewIn>(self) -> Coordinate<NewIn> {
        Coordinate {
            point: self.point,
            system: PhantomData::<NewIn>,
        }
    }

    /// Casts the coordinate system type parameter to the equivalent system `NewIn`.
    ///
    /// See [`EquivalentTo`] for details on when this is useful (and safe).
    #[must_use]
    pub fn cast<NewIn>(self) -> Coordinate<NewIn>
    where
        In: EquivalentTo<NewIn>,
    {
        self.with_same_components_in::<NewIn>()
    }

    /// Returns true if none of the components is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.point.iter().all(|c| c.is_finite())
    }

    /// Returns a copy of this coordinate with its third (vertical) component set to zero.
    #[must_use]
    pub fn flattened(&self) -> Self {
        let mut point = self.point;
        point.z = 0.;
        Self::from_nalgebra_point(point)
    }
}

impl<In> Default for Coordinate<In> {
    fn default() -> Self {
        Self::origin()
    }
}

macro_rules! accessors {
    {
        $convention:ident
        using $x:ident, $y:ident, $z:ident
    } => {
        impl<In> Coordinate<In> where In: CoordinateSystem<Convention = $convention> {
            #[must_use]
            pub fn $x(&self) -> Length { Length::new::<meter>(self.point.x) }
            #[must_use]
            pub fn $y(&self) -> Length { Length::new::<meter>(self.point.y) }
            #[must_use]
            pub fn $z(&self) -> Length { Length::new::<meter>(self.point.z) }
        }
    };
}

accessors!(RightHandedXyzLike using x, y, z);
accessors!(EnuLike using enu_east, enu_north, enu_up);

impl<In> Coordinate<In> {
    /// Returns the cartesian components of this coordinate in meters.
    #[doc(alias = "components")]
    #[must_use]
    pub fn to_cartesian(&self) -> [Length; 3] {
        [
            Length::new::<meter>(self.point.x),
            Length::new::<meter>(self.point.y),
            Length::new::<meter>(self.point.z),
        ]
    }

    #[doc(alias = "norm")]
    #[must_use]
    pub fn distance_from_origin(&self) -> Length {
        Length::new::<meter>(self.point.coords.norm())
    }

    #[must_use]
    pub fn distance_from(&self, other: &Coordinate<In>) -> Length {
        (*other - *self).magnitude()
    }
}

impl<In> PartialEq<Self> for Coordinate<In> {
    fn eq(&self, other: &Self) -> bool {
        self.point.eq(&other.point)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Coordinate<In> {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // NOTE: meters; millimeter precision is plenty for vehicle navigation
        Length::new::<meter>(0.001)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // NOTE: per-component, not the magnitude of the difference
        self.point.abs_diff_eq(&other.point, epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Coordinate<In> {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(Point3::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.point.relative_eq(
            &other.point,
            epsilon.get::<meter>(),
            max_relative.get::<meter>(),
        )
    }
}

impl<In> Display for Coordinate<In> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.point)
    }
}

impl<In> Neg for Coordinate<In> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            point: -self.point,
            system: self.system,
        }
    }
}

impl<In> Sub<Self> for Coordinate<In> {
    type Output = Vector<In>;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector::from_nalgebra_vector(self.point - rhs.point)
    }
}

impl<In> Add<Vector<In>> for Coordinate<In> {
    type Output = Coordinate<In>;

    fn add(self, rhs: Vector<In>) -> Self::Output {
        Coordinate {
            point: self.point + rhs.inner,
            system: self.system,
        }
    }
}

impl<In> AddAssign<Vector<In>> for Coordinate<In> {
    fn add_assign(&mut self, rhs: Vector<In>) {
        self.point += rhs.inner;
    }
}

impl<In> Sub<Vector<In>> for Coordinate<In> {
    type Output = Coordinate<In>;

    fn sub(self, rhs: Vector<In>) -> Self::Output {
        Coordinate {
            point: self.point - rhs.inner,
            system: self.system,
        }
    }
}

impl<In> SubAssign<Vector<In>> for Coordinate<In> {
    fn sub_assign(&mut self, rhs: Vector<In>) {
        self.point -= rhs.inner;
    }
}

#[cfg(test)]
mod tests {
    use super::Length;
    use crate::coordinate_systems::{Sensor, Utm, World};
    use crate::coordinates::Coordinate;
    use crate::Point3;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn m(meters: f64) -> Length {
        Length::new::<uom::si::length::meter>(meters)
    }

    #[rstest]
    #[case(Point3::new(500., 0., 0.), m(500.))]
    #[case(Point3::new(0., -300., 0.), m(300.))]
    #[case(Point3::new(0., 0., 200.), m(200.))]
    #[case(Point3::new(3., 4., 0.), m(5.))]
    fn distance_to_origin(#[case] point: Point3, #[case] expected: Length) {
        let coordinate = Coordinate::<World>::from_nalgebra_point(point);
        assert_eq!(coordinate.distance_from_origin(), expected);
    }

    #[test]
    fn enu_accessors_follow_convention() {
        let c = coordinate!(e = m(1.), n = m(2.), u = m(3.); in Utm);
        assert_eq!(c.enu_east(), m(1.));
        assert_eq!(c.enu_north(), m(2.));
        assert_eq!(c.enu_up(), m(3.));
        assert_eq!(c.to_cartesian(), [m(1.), m(2.), m(3.)]);

        let s = coordinate!(x = m(1.), y = m(2.), z = m(3.); in Sensor);
        assert_eq!([s.x(), s.y(), s.z()], [m(1.), m(2.), m(3.)]);
    }

    #[test]
    fn finiteness_checks_every_component() {
        assert!(Coordinate::<Utm>::from_cartesian(m(1.), m(2.), m(3.)).is_finite());
        assert!(!Coordinate::<Utm>::from_cartesian(m(f64::NAN), m(2.), m(3.)).is_finite());
        assert!(!Coordinate::<Utm>::from_cartesian(m(1.), m(2.), m(f64::INFINITY)).is_finite());
    }

    #[test]
    fn flattened_only_drops_altitude() {
        let c = coordinate!(e = m(1.), n = m(2.), u = m(3.); in World);
        assert_eq!(c.flattened(), coordinate!(e = m(1.), n = m(2.), u = m(0.); in World));
    }

    #[test]
    fn arithmetic_with_vectors() {
        let a = coordinate!(e = m(10.), n = m(-5.), u = m(3.5); in World);
        let b = coordinate!(e = m(4.), n = m(1.), u = m(0.5); in World);
        let delta = a - b;
        assert_relative_eq!(b + delta, a);
        assert_relative_eq!(a - delta, b);
        assert_relative_eq!(-a, coordinate!(e = m(-10.), n = m(5.), u = m(-3.5); in World));
        assert_relative_eq!(a.distance_from(&b).get::<uom::si::length::meter>(), 9.);
    }
}
