use crate::coordinate_systems::{CoordinateSystem, EnuLike, HasComponents, RightHandedXyzLike};
use crate::coordinates::Coordinate;
use crate::systems::EquivalentTo;
use crate::Vector3;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines a displacement (ie, direction and magnitude) in the coordinate system specified by
/// `In`.
///
/// Unlike a [`Coordinate`], a vector is unaffected by the translation part of a transform; only
/// rotations change its components.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Vector<In> {
    /// X, Y, Z in meters
    pub(crate) inner: Vector3,
    #[cfg_attr(feature = "serde", serde(skip))]
    system: PhantomData<In>,
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for Vector<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Vector<In> {}

/// Constructs a [`Vector`] from named components.
///
/// ```
/// use geonav::{vector, systems::World};
/// use uom::si::{f64::Length, length::meter};
///
/// let zero = Length::new::<meter>(0.);
/// let unit = Length::new::<meter>(1.);
/// let north = vector!(e = zero, n = unit, u = zero; in World);
/// assert_eq!(north.magnitude(), unit);
/// ```
#[macro_export]
macro_rules! vector {
    ($x:tt = $xx:expr, $y:tt = $yy:expr, $z:tt = $zz:expr $(,)?) => {
        $crate::vector!($x = $xx, $y = $yy, $z = $zz; in _)
    };
    (e = $e:expr, n = $n:expr, u = $u:expr; in $in:ty) => {
        $crate::Vector::<$in>::build($crate::systems::EnuComponents {
            east: $e.into(),
            north: $n.into(),
            up: $u.into(),
        })
    };
    (x = $x:expr, y = $y:expr, z = $z:expr; in $in:ty) => {
        $crate::Vector::<$in>::build($crate::systems::XyzComponents {
            x: $x.into(),
            y: $y.into(),
            z: $z.into(),
        })
    };
}

impl<In> Vector<In> {
    pub(crate) fn from_nalgebra_vector(value: Vector3) -> Self {
        Self {
            inner: value,
            system: PhantomData,
        }
    }

    /// Constructs a vector from the named components of `In`'s convention.
    pub fn build(components: <In::Convention as HasComponents>::Components) -> Self
    where
        In: CoordinateSystem,
        In::Convention: HasComponents,
    {
        let [x, y, z] = components.into();
        Self::from_cartesian(x, y, z)
    }

    /// Constructs a vector with the given (x, y, z) cartesian components in `In`.
    pub fn from_cartesian(
        x: impl Into<Length>,
        y: impl Into<Length>,
        z: impl Into<Length>,
    ) -> Self {
        Self::from_nalgebra_vector(Vector3::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        ))
    }

    /// Re-interprets the components of this vector as being in `NewIn`.
    ///
    /// This performs no transformation.
    #[must_use]
    pub fn with_same_components_in<NewIn>(self) -> Vector<NewIn> {
        Vector {
            inner: self.inner,
            system: PhantomData::<NewIn>,
        }
    }

    /// Casts the coordinate system type parameter to the equivalent system `NewIn`.
    #[must_use]
    pub fn cast<NewIn>(self) -> Vector<NewIn>
    where
        In: EquivalentTo<NewIn>,
    {
        self.with_same_components_in::<NewIn>()
    }

    #[must_use]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.inner.dot(&rhs.inner)
    }

    /// Linearly interpolate between this vector and another vector.
    #[must_use]
    pub fn lerp(&self, rhs: &Self, t: f64) -> Self {
        Self::from_nalgebra_vector(self.inner.lerp(&rhs.inner, t))
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::from_nalgebra_vector(Vector3::zeros())
    }

    #[must_use]
    pub fn magnitude(&self) -> Length {
        Length::new::<meter>(self.inner.norm())
    }

    #[doc(alias = "components")]
    #[must_use]
    pub fn to_cartesian(&self) -> [Length; 3] {
        [
            Length::new::<meter>(self.inner.x),
            Length::new::<meter>(self.inner.y),
            Length::new::<meter>(self.inner.z),
        ]
    }
}

impl<In> From<Coordinate<In>> for Vector<In> {
    fn from(value: Coordinate<In>) -> Self {
        Self::from_nalgebra_vector(value.point.coords)
    }
}

impl<In> Default for Vector<In> {
    fn default() -> Self {
        Self::zero()
    }
}

macro_rules! accessors {
    {
        $convention:ident
        using $x:ident, $y:ident, $z:ident
    } => {
        impl<In> Vector<In> where In: CoordinateSystem<Convention = $convention> {
            #[must_use]
            pub fn $x(&self) -> Length { Length::new::<meter>(self.inner.x) }
            #[must_use]
            pub fn $y(&self) -> Length { Length::new::<meter>(self.inner.y) }
            #[must_use]
            pub fn $z(&self) -> Length { Length::new::<meter>(self.inner.z) }
        }
    };
}

accessors!(RightHandedXyzLike using x, y, z);
accessors!(EnuLike using enu_east, enu_north, enu_up);

impl<In> Neg for Vector<In> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::from_nalgebra_vector(-self.inner)
    }
}

impl<In> Add<Self> for Vector<In> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_vector(self.inner + rhs.inner)
    }
}

impl<In> AddAssign<Self> for Vector<In> {
    fn add_assign(&mut self, rhs: Self) {
        self.inner += rhs.inner;
    }
}

impl<In> Sub<Self> for Vector<In> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_vector(self.inner - rhs.inner)
    }
}

impl<In> SubAssign<Self> for Vector<In> {
    fn sub_assign(&mut self, rhs: Self) {
        self.inner -= rhs.inner;
    }
}

impl<In> Mul<f64> for Vector<In> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::from_nalgebra_vector(self.inner * rhs)
    }
}

impl<In> Div<f64> for Vector<In> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::from_nalgebra_vector(self.inner / rhs)
    }
}

impl<In> PartialEq<Self> for Vector<In> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<In> Display for Vector<In> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Vector<In> {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        Length::new::<meter>(0.001)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Vector<In> {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(Vector3::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(
            &other.inner,
            epsilon.get::<meter>(),
            max_relative.get::<meter>(),
        )
    }
}
