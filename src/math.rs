//! Rigid transforms between coordinate systems, expressed in mathematical language.
//!
//! [`RigidBodyTransform`] is the isometry (rotation plus translation) relating two
//! [`CoordinateSystem`]s, and [`Rotation`] is the translation-free special case. Both multiply
//! like matrices: `a * b` composes, [`inverse`](RigidBodyTransform::inverse) (or unary `-`)
//! inverts, and multiplying a [`Coordinate`] or [`Vector`] by a transform moves it into the
//! transform's target system.
//!
//! For the engineering view of the same quantities (positions and orientations of objects), see
//! [`mod engineering`](crate::engineering).

use crate::coordinates::Coordinate;
use crate::systems::EquivalentTo;
use crate::vectors::Vector;
use crate::{Isometry3, Matrix3, UnitQuaternion};
use nalgebra::Translation3;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::{Mul, Neg};
use uom::si::angle::radian;
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::{engineering, CoordinateSystem};

/// A pure rotation between two [`CoordinateSystem`]s.
///
/// The easiest way to get one is from an [`engineering::Orientation`] via
/// [`map_as_zero_in`](engineering::Orientation::map_as_zero_in).
///
/// <div class="warning">
///
/// The rotation goes on the _right_ of the value it converts from `From` into `To`
/// (`Coordinate<From> * Rotation<From, To>`), and on the _left_ for the way back. This keeps the
/// eliminated frame adjacent in every product, like the shared dimension of a matrix multiply.
///
/// </div>
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Rotation<From, To> {
    /// Stored as the rotation of `To`'s axes expressed in `From`, so conversions `From -> To`
    /// apply the _inverse_ of `inner` and conversions `To -> From` apply it directly.
    pub(crate) inner: UnitQuaternion,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) from: PhantomData<From>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) to: PhantomData<To>,
}

// manual impls of Clone and Copy to avoid requiring From/To: Copy + Clone
impl<From, To> Clone for Rotation<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for Rotation<From, To> {}

impl<From, To> PartialEq<Self> for Rotation<From, To> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<From, To> Display for Rotation<From, To> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Quaternion: {}", self.inner)
    }
}

impl<From, To> Rotation<From, To> {
    pub(crate) fn from_nalgebra(inner: UnitQuaternion) -> Self {
        Self {
            inner,
            from: PhantomData::<From>,
            to: PhantomData::<To>,
        }
    }

    /// Constructs the rotation of `To` within `From` from intrinsic yaw, pitch, and roll
    /// [Tait-Bryan angles](https://en.wikipedia.org/wiki/Euler_angles#Tait%E2%80%93Bryan_angles).
    ///
    /// Yaw turns about Z, then pitch about the new Y, then roll about the newest X. Positive angles
    /// follow the right-hand rule.
    ///
    /// # Safety
    ///
    /// Calling this asserts that the angles really do relate `From` and `To`, and that no
    /// translation is needed between them. A wrong rotation lets values change frame type without
    /// their components being adjusted.
    #[doc(alias = "from_ypr")]
    #[must_use]
    pub unsafe fn from_tait_bryan_angles(
        yaw: impl Into<Angle>,
        pitch: impl Into<Angle>,
        roll: impl Into<Angle>,
    ) -> Self {
        // nalgebra's from_euler_angles is the 3-2-1 (z-y'-x'') sequence
        Self::from_nalgebra(UnitQuaternion::from_euler_angles(
            roll.into().get::<radian>(),
            pitch.into().get::<radian>(),
            yaw.into().get::<radian>(),
        ))
    }

    /// Returns the `(yaw, pitch, roll)` angles accepted by [`Rotation::from_tait_bryan_angles`].
    #[must_use]
    pub fn to_tait_bryan_angles(&self) -> (Angle, Angle, Angle) {
        let (roll, pitch, yaw) = self.inner.euler_angles();
        (
            Angle::new::<radian>(yaw),
            Angle::new::<radian>(pitch),
            Angle::new::<radian>(roll),
        )
    }

    /// Constructs a rotation from a (not necessarily normalized) quaternion `w + ix + jy + kz`
    /// that rotates points in `From` into `To`.
    ///
    /// # Safety
    ///
    /// As for [`Rotation::from_tait_bryan_angles`]. The quaternion must also be non-zero.
    #[doc(alias = "from_versor")]
    #[must_use]
    pub unsafe fn from_quaternion(w: f64, i: f64, j: f64, k: f64) -> Self {
        debug_assert_ne!([w, i, j, k], [0.0; 4], "quaternion must be non-zero");
        let from_to = UnitQuaternion::new_normalize(nalgebra::Quaternion::new(w, i, j, k));
        Self::from_nalgebra(from_to.inverse())
    }

    /// Returns `(w, i, j, k)` of the unit quaternion that rotates points in `From` into `To`.
    #[doc(alias = "to_versor")]
    #[must_use]
    pub fn to_quaternion(&self) -> (f64, f64, f64, f64) {
        let q = self.inner.inverse().into_inner();
        (q.w, q.i, q.j, q.k)
    }

    /// Asserts that `From` and `To` share their axes.
    ///
    /// # Safety
    ///
    /// If the axes differ, this moves values between the frames without rotating them.
    #[must_use]
    pub unsafe fn identity() -> Self {
        Self::from_nalgebra(UnitQuaternion::identity())
    }

    /// Returns the rotation in the opposite direction.
    #[doc(alias = "invert")]
    #[must_use]
    pub fn inverse(&self) -> Rotation<To, From> {
        Rotation::from_nalgebra(self.inner.inverse())
    }

    /// The angle of this rotation about its axis, in [0, π].
    #[must_use]
    pub fn angle(&self) -> Angle {
        // atan2 stays well-conditioned near the identity, unlike acos(w)
        let q = self.inner.quaternion();
        Angle::new::<radian>(2. * q.imag().norm().atan2(q.w.abs()))
    }

    /// Returns the 3×3 matrix that maps components in `From` onto components in `To`.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3 {
        self.inner.inverse().to_rotation_matrix().into_inner()
    }

    /// Casts `To` to the equivalent system `AlsoTo`.
    #[must_use]
    pub fn cast_type_of_to<AlsoTo>(self) -> Rotation<From, AlsoTo>
    where
        To: EquivalentTo<AlsoTo>,
    {
        Rotation::from_nalgebra(self.inner)
    }

    /// Converts a value in `From` into `To`.
    #[doc(alias = "apply")]
    pub fn transform<T>(&self, in_from: T) -> <T as Mul<Self>>::Output
    where
        T: Mul<Self>,
    {
        in_from * *self
    }

    /// Converts a value in `To` back into `From`.
    #[doc(alias = "undo")]
    pub fn inverse_transform<T>(&self, in_to: T) -> <Self as Mul<T>>::Output
    where
        Self: Mul<T>,
    {
        *self * in_to
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> AbsDiffEq<Self> for Rotation<From, To> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        UnitQuaternion::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> RelativeEq for Rotation<From, To> {
    fn default_max_relative() -> Self::Epsilon {
        UnitQuaternion::default_max_relative()
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

impl<From, To> Neg for Rotation<From, To> {
    type Output = Rotation<To, From>;

    fn neg(self) -> Self::Output {
        self.inverse()
    }
}

// Rotation<From, Over> * Rotation<Over, To> -> Rotation<From, To>
impl<From, Over, To> Mul<Rotation<Over, To>> for Rotation<From, Over> {
    type Output = Rotation<From, To>;

    fn mul(self, rhs: Rotation<Over, To>) -> Self::Output {
        Rotation::from_nalgebra(self.inner * rhs.inner)
    }
}

/// A rigid (rotation plus translation, no scale or shear) transform between two
/// [`CoordinateSystem`]s.
///
/// `RigidBodyTransform<From, To>` holds the pose of `To`'s origin and axes as seen from `From`.
/// So `RigidBodyTransform<Utm, World>` places the world frame on the UTM grid, and converts
/// UTM coordinates into world coordinates when applied:
///
/// ```
/// use geonav::{coordinate, math::RigidBodyTransform, systems::{Utm, World}, Vector};
/// use geonav::engineering::Orientation;
/// use uom::si::{f64::Length, length::meter};
///
/// fn m(meters: f64) -> Length {
///     Length::new::<meter>(meters)
/// }
///
/// // SAFETY: this is where we define the world frame to be.
/// let utm_to_world = unsafe {
///     RigidBodyTransform::<Utm, World>::new(
///         Vector::from_cartesian(m(500_000.), m(4_982_950.), m(0.)),
///         Orientation::<Utm>::aligned().map_as_zero_in(),
///     )
/// };
///
/// let antenna = coordinate!(e = m(500_010.), n = m(4_982_950.), u = m(2.); in Utm);
/// let in_world = utm_to_world.transform(antenna);
/// assert_eq!(in_world, coordinate!(e = m(10.), n = m(0.), u = m(2.); in World));
/// ```
///
/// Composition follows the same operand order as [`Rotation`]: `RigidBodyTransform<A, B> *
/// RigidBodyTransform<B, C>` is `RigidBodyTransform<A, C>`. It is associative (up to floating
/// point) but not commutative.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RigidBodyTransform<From, To> {
    /// The isometry taking `To` coordinates into `From`; see `Rotation::inner`.
    pub(crate) inner: Isometry3,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) from: PhantomData<From>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) to: PhantomData<To>,
}

impl<From, To> Clone for RigidBodyTransform<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for RigidBodyTransform<From, To> {}

impl<From, To> RigidBodyTransform<From, To> {
    pub(crate) fn from_nalgebra(inner: Isometry3) -> Self {
        Self {
            inner,
            from: PhantomData::<From>,
            to: PhantomData::<To>,
        }
    }

    /// Constructs a transform from the position of `To`'s origin in `From` and the rotation of
    /// `To`'s axes.
    ///
    /// The quaternion inside `rotation` is unit by construction and stays unit under
    /// composition and inversion.
    ///
    /// # Safety
    ///
    /// As for [`engineering::Pose::map_as_zero_in`]: an incorrect transform allows moving between
    /// frame types without performing the right conversion.
    #[must_use]
    pub unsafe fn new(translation: Vector<From>, rotation: Rotation<From, To>) -> Self {
        Self::from_nalgebra(Isometry3::from_parts(
            Translation3::from(translation.inner),
            rotation.inner,
        ))
    }

    /// Asserts that `From` and `To` are the same frame.
    ///
    /// # Safety
    ///
    /// See [`Rotation::identity`].
    #[must_use]
    pub unsafe fn identity() -> Self {
        Self::from_nalgebra(Isometry3::identity())
    }

    /// Chains `rhs` after this transform, giving a transform straight from `From` to `NewTo`.
    ///
    /// Equivalent to `self * rhs`.
    #[doc(alias = "compose")]
    pub fn and_then<NewTo, Transform>(self, rhs: Transform) -> RigidBodyTransform<From, NewTo>
    where
        Self: Mul<Transform, Output = RigidBodyTransform<From, NewTo>>,
    {
        self * rhs
    }

    /// Returns the transform in the opposite direction.
    ///
    /// The rotation is inverted and the translation becomes the negated translation expressed in
    /// the rotated axes.
    #[doc(alias = "invert")]
    #[must_use]
    pub fn inverse(&self) -> RigidBodyTransform<To, From> {
        RigidBodyTransform::from_nalgebra(self.inner.inverse())
    }

    /// Position of `To`'s origin, in `From`.
    #[must_use]
    pub fn translation(&self) -> Vector<From> {
        Vector::from_nalgebra_vector(self.inner.translation.vector)
    }

    /// Rotation of `To`'s axes with respect to `From`'s.
    #[must_use]
    pub fn rotation(&self) -> Rotation<From, To> {
        Rotation::from_nalgebra(self.inner.rotation)
    }

    /// Casts `To` to the equivalent system `AlsoTo`.
    #[must_use]
    pub fn cast_type_of_to<AlsoTo>(self) -> RigidBodyTransform<From, AlsoTo>
    where
        To: EquivalentTo<AlsoTo>,
    {
        RigidBodyTransform::from_nalgebra(self.inner)
    }

    /// Converts a value in `From` into `To`.
    ///
    /// Coordinates are rotated and translated; vectors are only rotated.
    #[doc(alias = "apply")]
    pub fn transform<T>(&self, in_from: T) -> <T as Mul<Self>>::Output
    where
        T: Mul<Self>,
    {
        in_from * *self
    }

    /// Converts a value in `To` back into `From`, without materializing the inverse.
    #[doc(alias = "undo")]
    pub fn inverse_transform<T>(&self, in_to: T) -> <Self as Mul<T>>::Output
    where
        Self: Mul<T>,
    {
        *self * in_to
    }
}

impl<From, To> PartialEq<Self> for RigidBodyTransform<From, To> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<From, To> Display for RigidBodyTransform<From, To> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position: {}, Orientation: {}",
            self.translation(),
            self.rotation()
        )
    }
}

impl<From, To> Neg for RigidBodyTransform<From, To> {
    type Output = RigidBodyTransform<To, From>;

    fn neg(self) -> Self::Output {
        self.inverse()
    }
}

// `From -> To` conversions apply the inverse of `inner`, `To -> From` apply it directly.

impl<From, To> Mul<Rotation<From, To>> for Coordinate<From> {
    type Output = Coordinate<To>;

    fn mul(self, rhs: Rotation<From, To>) -> Self::Output {
        Coordinate::from_nalgebra_point(rhs.inner.inverse_transform_point(&self.point))
    }
}

impl<From, To> Mul<Coordinate<To>> for Rotation<From, To> {
    type Output = Coordinate<From>;

    fn mul(self, rhs: Coordinate<To>) -> Self::Output {
        Coordinate::from_nalgebra_point(self.inner.transform_point(&rhs.point))
    }
}

impl<From, To> Mul<Rotation<From, To>> for Vector<From> {
    type Output = Vector<To>;

    fn mul(self, rhs: Rotation<From, To>) -> Self::Output {
        Vector::from_nalgebra_vector(rhs.inner.inverse_transform_vector(&self.inner))
    }
}

impl<From, To> Mul<Vector<To>> for Rotation<From, To> {
    type Output = Vector<From>;

    fn mul(self, rhs: Vector<To>) -> Self::Output {
        Vector::from_nalgebra_vector(self.inner.transform_vector(&rhs.inner))
    }
}

impl<From, To> Mul<RigidBodyTransform<From, To>> for Coordinate<From> {
    type Output = Coordinate<To>;

    fn mul(self, rhs: RigidBodyTransform<From, To>) -> Self::Output {
        Coordinate::from_nalgebra_point(rhs.inner.inverse_transform_point(&self.point))
    }
}

impl<From, To> Mul<Coordinate<To>> for RigidBodyTransform<From, To> {
    type Output = Coordinate<From>;

    fn mul(self, rhs: Coordinate<To>) -> Self::Output {
        Coordinate::from_nalgebra_point(self.inner.transform_point(&rhs.point))
    }
}

impl<From, To> Mul<RigidBodyTransform<From, To>> for Vector<From> {
    type Output = Vector<To>;

    fn mul(self, rhs: RigidBodyTransform<From, To>) -> Self::Output {
        Vector::from_nalgebra_vector(rhs.inner.inverse_transform_vector(&self.inner))
    }
}

impl<From, To> Mul<Vector<To>> for RigidBodyTransform<From, To> {
    type Output = Vector<From>;

    fn mul(self, rhs: Vector<To>) -> Self::Output {
        Vector::from_nalgebra_vector(self.inner.transform_vector(&rhs.inner))
    }
}

// RigidBodyTransform<From, Over> * RigidBodyTransform<Over, To> -> RigidBodyTransform<From, To>
impl<From, Over, To> Mul<RigidBodyTransform<Over, To>> for RigidBodyTransform<From, Over> {
    type Output = RigidBodyTransform<From, To>;

    fn mul(self, rhs: RigidBodyTransform<Over, To>) -> Self::Output {
        RigidBodyTransform::from_nalgebra(self.inner * rhs.inner)
    }
}

// RigidBodyTransform<From, Over> * Rotation<Over, To> -> RigidBodyTransform<From, To>
impl<From, Over, To> Mul<Rotation<Over, To>> for RigidBodyTransform<From, Over> {
    type Output = RigidBodyTransform<From, To>;

    fn mul(self, rhs: Rotation<Over, To>) -> Self::Output {
        RigidBodyTransform::from_nalgebra(self.inner * rhs.inner)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> AbsDiffEq<Self> for RigidBodyTransform<From, To> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Isometry3::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<From, To> RelativeEq for RigidBodyTransform<From, To> {
    fn default_max_relative() -> Self::Epsilon {
        Isometry3::default_max_relative()
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

#[cfg(test)]
pub(crate) mod tests {
    use super::{RigidBodyTransform, Rotation};
    use crate::coordinate_systems::{Sensor, Utm, World};
    use crate::{coordinate, vector, Coordinate, Vector};
    use approx::assert_relative_eq;
    use quickcheck::{quickcheck, Arbitrary, Gen};
    use uom::si::f64::{Angle, Length};
    use uom::si::{angle::degree, length::meter};

    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }
    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    /// A finite f64 folded into `[-bound, bound)`.
    pub(crate) fn bounded(g: &mut Gen, bound: f64) -> f64 {
        loop {
            let f = f64::arbitrary(g);
            if f.is_finite() {
                break f.rem_euclid(2. * bound) - bound;
            }
        }
    }

    impl<From: 'static, To: 'static> Arbitrary for RigidBodyTransform<From, To> {
        fn arbitrary(g: &mut Gen) -> Self {
            let translation = Vector::from_cartesian(
                m(bounded(g, 1e4)),
                m(bounded(g, 1e4)),
                m(bounded(g, 1e3)),
            );
            // SAFETY: arbitrary frames for property tests
            unsafe {
                Self::new(
                    translation,
                    Rotation::from_tait_bryan_angles(
                        d(bounded(g, 180.)),
                        d(bounded(g, 89.)),
                        d(bounded(g, 180.)),
                    ),
                )
            }
        }
    }

    quickcheck! {
        fn inverse_law(t: RigidBodyTransform<Utm, Sensor>) -> () {
            let round = t * t.inverse();
            assert!(round.translation().magnitude().get::<meter>() < 1e-9);
            assert!(round.rotation().angle().get::<uom::si::angle::radian>() < 1e-9);

            let round = t.inverse() * t;
            assert!(round.translation().magnitude().get::<meter>() < 1e-9);
            assert!(round.rotation().angle().get::<uom::si::angle::radian>() < 1e-9);
        }

        fn composition_is_associative(
            a: RigidBodyTransform<Utm, World>,
            b: RigidBodyTransform<World, Sensor>,
            c: RigidBodyTransform<Sensor, Utm>
        ) -> () {
            assert_relative_eq!((a * b) * c, a * (b * c), epsilon = 1e-6);
        }

        fn composition_matches_sequential_application(
            a: RigidBodyTransform<Utm, World>,
            b: RigidBodyTransform<World, Sensor>
        ) -> () {
            let p = coordinate!(e = m(12.), n = m(-7.), u = m(3.); in Utm);
            assert_relative_eq!(p * a * b, p * a.and_then(b), epsilon = m(1e-6));
            assert_relative_eq!((a * b).inverse_transform(p * a * b), p, epsilon = m(1e-6));
        }
    }

    #[test]
    fn inverse_of_translation_only() {
        // SAFETY: test frames
        let t = unsafe {
            RigidBodyTransform::<Utm, World>::new(
                vector!(e = m(10.), n = m(20.), u = m(30.); in Utm),
                Rotation::identity(),
            )
        };
        assert_relative_eq!(
            t.inverse().translation(),
            vector!(e = m(-10.), n = m(-20.), u = m(-30.); in World)
        );
        assert_eq!(-t, t.inverse());
    }

    #[test]
    fn composition_is_not_commutative() {
        // SAFETY: test frames
        let (shift, turn) = unsafe {
            (
                RigidBodyTransform::<Utm, Utm>::new(
                    vector!(e = m(1.), n = m(0.), u = m(0.); in Utm),
                    Rotation::identity(),
                ),
                RigidBodyTransform::<Utm, Utm>::new(
                    Vector::zero(),
                    Rotation::from_tait_bryan_angles(d(90.), d(0.), d(0.)),
                ),
            )
        };
        let a = shift * turn;
        let b = turn * shift;
        assert!((a.translation() - b.translation()).magnitude() > m(1.));
    }

    #[test]
    fn rotation_applies_to_vectors_but_translation_does_not() {
        // sensor frame yawed 90° left of world, 5m east of the world origin
        // SAFETY: test frames
        let world_to_sensor = unsafe {
            RigidBodyTransform::<World, Sensor>::new(
                vector!(e = m(5.), n = m(0.), u = m(0.); in World),
                Rotation::from_tait_bryan_angles(d(90.), d(0.), d(0.)),
            )
        };

        let ahead_of_sensor = coordinate!(e = m(5.), n = m(1.), u = m(0.); in World);
        assert_relative_eq!(
            world_to_sensor.transform(ahead_of_sensor),
            coordinate!(x = m(1.), y = m(0.), z = m(0.); in Sensor)
        );

        let north = vector!(e = m(0.), n = m(2.), u = m(0.); in World);
        assert_relative_eq!(
            world_to_sensor.transform(north),
            vector!(x = m(2.), y = m(0.), z = m(0.); in Sensor)
        );
        assert_relative_eq!(
            world_to_sensor.inverse_transform(Coordinate::<Sensor>::origin()),
            coordinate!(e = m(5.), n = m(0.), u = m(0.); in World)
        );
    }

    #[test]
    fn quaternion_and_angles_round_trip() {
        // SAFETY: test frames
        let r = unsafe { Rotation::<World, Sensor>::from_tait_bryan_angles(d(30.), d(-20.), d(5.)) };
        let (w, i, j, k) = r.to_quaternion();
        let back = unsafe { Rotation::<World, Sensor>::from_quaternion(2. * w, 2. * i, 2. * j, 2. * k) };
        assert_relative_eq!(r, back, epsilon = 1e-12);

        let (yaw, pitch, roll) = back.to_tait_bryan_angles();
        assert_relative_eq!(yaw.get::<degree>(), 30., epsilon = 1e-9);
        assert_relative_eq!(pitch.get::<degree>(), -20., epsilon = 1e-9);
        assert_relative_eq!(roll.get::<degree>(), 5., epsilon = 1e-9);
        assert_relative_eq!((r * r.inverse()).angle().get::<degree>(), 0., epsilon = 1e-9);
    }

    #[test]
    fn matrix_maps_from_components_to_to_components() {
        // SAFETY: test frames
        let r = unsafe { Rotation::<World, Sensor>::from_tait_bryan_angles(d(90.), d(0.), d(0.)) };
        let north = vector!(e = m(0.), n = m(1.), u = m(0.); in World);
        let mapped = r.to_matrix() * north.inner;
        assert_relative_eq!(mapped, r.transform(north).inner, epsilon = 1e-12);
    }
}
