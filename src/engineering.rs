//! Positions and orientations of objects, expressed in engineering language.
//!
//! [`Pose`] is where an object (a vehicle, a GPS antenna, the world frame's origin) is and how it
//! is turned, in some [`CoordinateSystem`]. [`Orientation`] is the turned-ness alone. Both convert
//! between systems through [`RigidBodyTransform`]s, and [`Pose::map_as_zero_in`] turns a pose into
//! the transform that defines a new frame at that pose, which is how the datum's world frame is
//! placed on the UTM grid.
//!
//! By convention an object's body X axis points forward, Y left, and Z up. The orientation is the
//! rotation that carries the reference axes onto the body axes; quaternions use the same
//! convention as ROS `geometry_msgs/Quaternion`.

use crate::coordinates::Coordinate;
use crate::math::{RigidBodyTransform, Rotation};
use crate::systems::EquivalentTo;
use crate::{Point3, UnitQuaternion, Vector};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::Mul;
use uom::si::f64::{Angle, Length};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::CoordinateSystem;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ObjectCoordinateSystem;

/// The orientation (yaw, pitch, _and_ roll) of an object in [`CoordinateSystem`] `In`.
///
/// <div class="warning">
///
/// When deserializing, the coordinate system of the deserialized value is _not_ checked.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Orientation<In> {
    pub(crate) inner: Rotation<In, ObjectCoordinateSystem>,
}

impl<In> Clone for Orientation<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Orientation<In> {}

impl<In> PartialEq<Self> for Orientation<In> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<In> Orientation<In> {
    /// Constructs an orientation from intrinsic yaw, pitch, and roll Tait-Bryan angles.
    ///
    /// Yaw turns about `In`'s Z axis (so in an ENU frame, 0° faces east and 90° faces north),
    /// pitch about the yawed Y axis, and roll about the resulting X axis.
    #[doc(alias = "from_ypr")]
    pub fn from_tait_bryan_angles(
        yaw: impl Into<Angle>,
        pitch: impl Into<Angle>,
        roll: impl Into<Angle>,
    ) -> Self {
        Self {
            // SAFETY: the object's body frame is defined by this very orientation.
            inner: unsafe { Rotation::from_tait_bryan_angles(yaw, pitch, roll) },
        }
    }

    /// Constructs an orientation from the quaternion `w + ix + jy + kz` that rotates `In`'s axes
    /// onto the object's body axes.
    ///
    /// The quaternion is normalized; it must be finite and non-zero.
    #[doc(alias = "from_versor")]
    pub fn from_quaternion(w: f64, i: f64, j: f64, k: f64) -> Self {
        Self {
            inner: Rotation::from_nalgebra(UnitQuaternion::new_normalize(
                nalgebra::Quaternion::new(w, i, j, k),
            )),
        }
    }

    /// Returns `(w, i, j, k)` as accepted by [`Orientation::from_quaternion`].
    #[must_use]
    pub fn to_quaternion(&self) -> (f64, f64, f64, f64) {
        let q = self.inner.inner.quaternion();
        (q.w, q.i, q.j, q.k)
    }

    /// An orientation whose body axes coincide with `In`'s axes.
    #[must_use]
    pub fn aligned() -> Self {
        Self {
            inner: Rotation::from_nalgebra(UnitQuaternion::identity()),
        }
    }

    /// Returns the `(yaw, pitch, roll)` of this orientation.
    #[must_use]
    pub fn to_tait_bryan_angles(&self) -> (Angle, Angle, Angle) {
        self.inner.to_tait_bryan_angles()
    }

    /// Constructs the rotation into a new system `To` in which this orientation is
    /// [`Orientation::aligned`].
    ///
    /// # Safety
    ///
    /// See [`Pose::map_as_zero_in`]. In addition, this asserts that `In` and `To` share an
    /// origin.
    #[doc(alias = "as_transform_to")]
    #[must_use]
    pub unsafe fn map_as_zero_in<To>(self) -> Rotation<In, To> {
        Rotation {
            inner: self.inner.inner,
            from: self.inner.from,
            to: PhantomData::<To>,
        }
    }

    /// Re-interprets this orientation as being relative to the axes of `NewIn`.
    ///
    /// No rotation is applied. This is only meaningful when the two systems share their axes, as
    /// the UTM grid and the datum-anchored world frame do when the datum is unrotated.
    #[must_use]
    pub fn with_same_components_in<NewIn>(self) -> Orientation<NewIn> {
        Orientation {
            inner: Rotation::from_nalgebra(self.inner.inner),
        }
    }

    /// Casts the coordinate system type parameter to the equivalent system `NewIn`.
    #[must_use]
    pub fn cast<NewIn>(self) -> Orientation<NewIn>
    where
        In: EquivalentTo<NewIn>,
    {
        self.with_same_components_in()
    }
}

impl<In> Default for Orientation<In> {
    fn default() -> Self {
        Self::aligned()
    }
}

impl<In> Display for Orientation<In> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (yaw, pitch, roll) = self.to_tait_bryan_angles();
        write!(
            f,
            "yaw {:.4}rad, pitch {:.4}rad, roll {:.4}rad",
            yaw.value, pitch.value, roll.value
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Orientation<In> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Rotation::<In, ObjectCoordinateSystem>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Orientation<In> {
    fn default_max_relative() -> Self::Epsilon {
        Rotation::<In, ObjectCoordinateSystem>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

// Orientation<From> * Rotation<From, To> -> Orientation<To>
impl<From, To> Mul<Rotation<From, To>> for Orientation<From> {
    type Output = Orientation<To>;

    fn mul(self, rhs: Rotation<From, To>) -> Self::Output {
        rhs.inverse() * self
    }
}

// Rotation<From, To> * Orientation<To> -> Orientation<From>
impl<From, To> Mul<Orientation<To>> for Rotation<From, To> {
    type Output = Orientation<From>;

    fn mul(self, rhs: Orientation<To>) -> Self::Output {
        Orientation {
            inner: self * rhs.inner,
        }
    }
}

// Orientation<From> * RigidBodyTransform<From, To> -> Orientation<To>
//
// orientations have no position, so only the rotation part applies
impl<From, To> Mul<RigidBodyTransform<From, To>> for Orientation<From> {
    type Output = Orientation<To>;

    fn mul(self, rhs: RigidBodyTransform<From, To>) -> Self::Output {
        self * rhs.rotation()
    }
}

impl<From, To> Mul<Orientation<To>> for RigidBodyTransform<From, To> {
    type Output = Orientation<From>;

    fn mul(self, rhs: Orientation<To>) -> Self::Output {
        self.rotation() * rhs
    }
}

/// The position and orientation of an object in [`CoordinateSystem`] `In`.
///
/// <div class="warning">
///
/// When deserializing, the coordinate system of the deserialized value is _not_ checked.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Pose<In> {
    pub(crate) inner: RigidBodyTransform<In, ObjectCoordinateSystem>,
}

impl<In> Clone for Pose<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Pose<In> {}

impl<In> PartialEq<Self> for Pose<In> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<In> Pose<In> {
    #[must_use]
    pub fn new(position: Coordinate<In>, orientation: Orientation<In>) -> Self {
        Self {
            // SAFETY: the object's body frame is defined by this very pose.
            inner: unsafe {
                RigidBodyTransform::new(Vector::from(position), orientation.map_as_zero_in())
            },
        }
    }

    /// Constructs the transform into a new system `To` whose origin is this pose's position and
    /// whose axes are this pose's body axes.
    ///
    /// Applying the transform to [`Pose::position`] yields [`Coordinate::origin`] in `To`, and
    /// applying it to [`Pose::orientation`] yields [`Orientation::aligned`].
    ///
    /// ```
    /// use geonav::{coordinate, engineering::{Orientation, Pose}, systems::{Utm, World}};
    /// use uom::si::{f64::Length, length::meter};
    ///
    /// fn m(meters: f64) -> Length {
    ///     Length::new::<meter>(meters)
    /// }
    ///
    /// let datum = Pose::new(
    ///     coordinate!(e = m(500_000.), n = m(4_982_950.), u = m(0.); in Utm),
    ///     Orientation::aligned(),
    /// );
    /// // SAFETY: the world frame is defined to sit at the datum.
    /// let utm_to_world = unsafe { datum.map_as_zero_in::<World>() };
    /// assert_eq!(
    ///     utm_to_world.transform(datum.position()),
    ///     coordinate!(e = m(0.), n = m(0.), u = m(0.); in World),
    /// );
    /// ```
    ///
    /// # Safety
    ///
    /// This asserts that `To` really is the frame located at this pose. Getting that wrong lets
    /// values move into `To` without the correct conversion, defeating the frame types.
    #[doc(alias = "as_transform_to")]
    #[doc(alias = "defines_pose_of")]
    #[must_use]
    pub unsafe fn map_as_zero_in<To>(self) -> RigidBodyTransform<In, To> {
        RigidBodyTransform {
            inner: self.inner.inner,
            from: self.inner.from,
            to: PhantomData::<To>,
        }
    }

    /// Re-interprets this pose's position and orientation as being in `NewIn`, unchanged.
    #[must_use]
    pub fn with_same_components_in<NewIn>(self) -> Pose<NewIn> {
        Pose {
            inner: RigidBodyTransform::from_nalgebra(self.inner.inner),
        }
    }

    /// Casts the coordinate system type parameter to the equivalent system `NewIn`.
    #[must_use]
    pub fn cast<NewIn>(self) -> Pose<NewIn>
    where
        In: EquivalentTo<NewIn>,
    {
        self.with_same_components_in()
    }

    #[must_use]
    pub fn position(&self) -> Coordinate<In> {
        Coordinate::from_nalgebra_point(Point3::from(self.inner.translation().inner))
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation<In> {
        Orientation {
            inner: self.inner.rotation(),
        }
    }

    /// Returns this pose moved to `position`, keeping its orientation.
    #[must_use]
    pub fn with_position(self, position: Coordinate<In>) -> Self {
        Self::new(position, self.orientation())
    }

    /// Returns this pose with the vertical component of its position set to zero.
    #[must_use]
    pub fn flattened(self) -> Self {
        self.with_position(self.position().flattened())
    }

    #[must_use]
    pub fn distance_from_origin(&self) -> Length {
        self.inner.translation().magnitude()
    }
}

impl<In> Default for Pose<In> {
    fn default() -> Self {
        Self::new(Coordinate::default(), Orientation::default())
    }
}

impl<In> Display for Pose<In> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "at {} facing {}", self.position(), self.orientation())
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Pose<In> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        RigidBodyTransform::<In, ObjectCoordinateSystem>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Pose<In> {
    fn default_max_relative() -> Self::Epsilon {
        RigidBodyTransform::<In, ObjectCoordinateSystem>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

// Pose<From> * RigidBodyTransform<From, To> -> Pose<To>
impl<From, To> Mul<RigidBodyTransform<From, To>> for Pose<From> {
    type Output = Pose<To>;

    fn mul(self, rhs: RigidBodyTransform<From, To>) -> Self::Output {
        // rhs.inverse() * self, without materializing the inverse
        Pose {
            inner: RigidBodyTransform::from_nalgebra(rhs.inner.inv_mul(&self.inner.inner)),
        }
    }
}

// RigidBodyTransform<From, To> * Pose<To> -> Pose<From>
impl<From, To> Mul<Pose<To>> for RigidBodyTransform<From, To> {
    type Output = Pose<From>;

    fn mul(self, rhs: Pose<To>) -> Self::Output {
        Pose {
            inner: self * rhs.inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Orientation, Pose};
    use crate::coordinate_systems::{Sensor, Utm, World};
    use crate::math::RigidBodyTransform;
    use crate::{coordinate, Coordinate};
    use approx::assert_relative_eq;
    use rstest::rstest;
    use uom::si::f64::{Angle, Length};
    use uom::si::{angle::degree, length::meter};

    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }
    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    #[rstest]
    #[case(0., 0., 0.)]
    #[case(90., 0., 0.)]
    #[case(-135., 10., -5.)]
    #[case(12., -45., 170.)]
    fn quaternion_matches_tait_bryan(#[case] yaw: f64, #[case] pitch: f64, #[case] roll: f64) {
        let from_angles = Orientation::<Utm>::from_tait_bryan_angles(d(yaw), d(pitch), d(roll));
        let (w, i, j, k) = from_angles.to_quaternion();
        assert_relative_eq!(Orientation::<Utm>::from_quaternion(w, i, j, k), from_angles);

        let (y, p, r) = from_angles.to_tait_bryan_angles();
        assert_relative_eq!(y.get::<degree>(), yaw, epsilon = 1e-9);
        assert_relative_eq!(p.get::<degree>(), pitch, epsilon = 1e-9);
        assert_relative_eq!(r.get::<degree>(), roll, epsilon = 1e-9);
    }

    #[test]
    fn quaternion_follows_ros_convention() {
        // a 90° yaw in ROS is (x, y, z, w) = (0, 0, sin 45°, cos 45°)
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let facing_north = Orientation::<Utm>::from_quaternion(half, 0., 0., half);
        let (yaw, pitch, roll) = facing_north.to_tait_bryan_angles();
        assert_relative_eq!(yaw.get::<degree>(), 90., epsilon = 1e-9);
        assert_relative_eq!(pitch.get::<degree>(), 0., epsilon = 1e-9);
        assert_relative_eq!(roll.get::<degree>(), 0., epsilon = 1e-9);

        // unnormalized input is normalized
        let scaled = Orientation::<Utm>::from_quaternion(3. * half, 0., 0., 3. * half);
        assert_relative_eq!(scaled, facing_north);
    }

    #[test]
    fn pose_to_transform_maps_pose_to_zero() {
        let pose = Pose::new(
            coordinate!(e = m(10.), n = m(-4.), u = m(2.); in Utm),
            Orientation::from_tait_bryan_angles(d(30.), d(5.), d(-2.)),
        );
        // SAFETY: test frame defined at the pose
        let utm_to_sensor = unsafe { pose.map_as_zero_in::<Sensor>() };
        assert_relative_eq!(
            utm_to_sensor.transform(pose.position()),
            Coordinate::<Sensor>::origin()
        );
        assert_relative_eq!(
            utm_to_sensor.transform(pose.orientation()),
            Orientation::<Sensor>::aligned()
        );
        assert_relative_eq!(utm_to_sensor.transform(pose), Pose::<Sensor>::default());
    }

    #[test]
    fn pose_through_datum_transform() {
        // world frame sits at (100, 200, 0) on the grid, rotated 90° about up
        let datum = Pose::new(
            coordinate!(e = m(100.), n = m(200.), u = m(0.); in Utm),
            Orientation::from_tait_bryan_angles(d(90.), d(0.), d(0.)),
        );
        // SAFETY: world is defined at the datum
        let utm_to_world: RigidBodyTransform<Utm, World> = unsafe { datum.map_as_zero_in() };

        let vehicle = Pose::new(
            coordinate!(e = m(100.), n = m(210.), u = m(3.); in Utm),
            Orientation::from_tait_bryan_angles(d(90.), d(0.), d(0.)),
        );
        let in_world = utm_to_world.transform(vehicle);
        assert_relative_eq!(
            in_world.position(),
            coordinate!(e = m(10.), n = m(0.), u = m(3.); in World)
        );
        assert_relative_eq!(in_world.orientation(), Orientation::aligned());
        assert_relative_eq!(utm_to_world.inverse_transform(in_world), vehicle);
    }

    #[test]
    fn flattened_keeps_orientation() {
        let orientation = Orientation::<World>::from_tait_bryan_angles(d(10.), d(0.), d(0.));
        let pose = Pose::new(coordinate!(e = m(1.), n = m(2.), u = m(3.); in World), orientation);
        let flat = pose.flattened();
        assert_eq!(flat.position(), coordinate!(e = m(1.), n = m(2.), u = m(0.); in World));
        assert_relative_eq!(flat.orientation(), orientation);
    }
}
