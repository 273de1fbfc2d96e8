//! 6×6 pose covariance and its propagation through frame rotations.

use crate::math::Rotation;
use crate::{Matrix3, Matrix6};
use std::marker::PhantomData;
use std::ops::Mul;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Uncertainty of a pose, expressed along the axes of `In`.
///
/// Rows and columns are ordered x, y, z (m²) then roll, pitch, yaw (rad²), matching ROS
/// `geometry_msgs/PoseWithCovariance`.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Covariance<In> {
    pub(crate) inner: Matrix6,
    #[cfg_attr(feature = "serde", serde(skip))]
    system: PhantomData<In>,
}

impl<In> Clone for Covariance<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Covariance<In> {}

impl<In> Covariance<In> {
    /// Wraps a matrix whose rows and columns are ordered x, y, z, roll, pitch, yaw.
    #[must_use]
    pub fn from_nalgebra(inner: Matrix6) -> Self {
        Self {
            inner,
            system: PhantomData,
        }
    }

    /// A covariance with no uncertainty at all (and no information about correlations).
    #[must_use]
    pub fn zero() -> Self {
        Self::from_nalgebra(Matrix6::zeros())
    }

    /// A diagonal covariance from per-axis variances.
    #[must_use]
    pub fn from_variances(position: [f64; 3], orientation: [f64; 3]) -> Self {
        let [x, y, z] = position;
        let [roll, pitch, yaw] = orientation;
        Self::from_nalgebra(Matrix6::from_diagonal(&nalgebra::Vector6::new(
            x, y, z, roll, pitch, yaw,
        )))
    }

    /// Reads the 36 values of a row-major 6×6 matrix, as carried on the wire by ROS.
    #[must_use]
    pub fn from_row_slice(values: &[f64; 36]) -> Self {
        Self::from_nalgebra(Matrix6::from_row_slice(values))
    }

    /// The inverse of [`Covariance::from_row_slice`].
    #[must_use]
    pub fn to_row_major(&self) -> [f64; 36] {
        let mut out = [0.; 36];
        for (row, chunk) in out.chunks_exact_mut(6).enumerate() {
            for (col, value) in chunk.iter_mut().enumerate() {
                *value = self.inner[(row, col)];
            }
        }
        out
    }

    /// The x/y/z block.
    #[must_use]
    pub fn position_block(&self) -> Matrix3 {
        self.inner.fixed_view::<3, 3>(0, 0).into()
    }

    /// The roll/pitch/yaw block.
    #[must_use]
    pub fn orientation_block(&self) -> Matrix3 {
        self.inner.fixed_view::<3, 3>(3, 3).into()
    }

    /// The underlying matrix, along the axes of `In`.
    #[must_use]
    pub fn as_matrix(&self) -> &Matrix6 {
        &self.inner
    }

    /// Returns true if no entry differs from its mirror across the diagonal by more than
    /// `epsilon`.
    #[must_use]
    pub fn is_symmetric(&self, epsilon: f64) -> bool {
        (self.inner - self.inner.transpose()).amax() <= epsilon
    }

    /// Expresses this covariance along the axes of `To`.
    ///
    /// Computes `R6 · C · R6ᵀ` with `R6 = diag(R, R)` and `R` the 3×3 matrix of `rotation`. This
    /// is an orthonormal similarity, so symmetry and eigenvalues are preserved.
    ///
    /// <div class="warning">
    ///
    /// The roll/pitch/yaw block is rotated with the same `R` as the position block. That is
    /// exact for small-angle errors about the body axes but only an approximation for
    /// Tait-Bryan angle variances.
    ///
    /// </div>
    ///
    /// ```
    /// use geonav::engineering::Orientation;
    /// use geonav::systems::{Utm, World};
    /// use geonav::Covariance;
    /// use uom::si::{angle::degree, f64::Angle};
    ///
    /// // world X points along grid north
    /// let heading = Orientation::<Utm>::from_tait_bryan_angles(
    ///     Angle::new::<degree>(90.),
    ///     Angle::new::<degree>(0.),
    ///     Angle::new::<degree>(0.),
    /// );
    /// // SAFETY: the world frame is defined by this orientation.
    /// let utm_to_world = unsafe { heading.map_as_zero_in::<World>() };
    ///
    /// let grid = Covariance::<Utm>::from_variances([4., 1., 9.], [0., 0., 0.]);
    /// let world = grid.rotated_by(utm_to_world);
    ///
    /// // the uncertain grid east axis is now world Y
    /// let position = world.position_block();
    /// assert!((position[(0, 0)] - 1.).abs() < 1e-12);
    /// assert!((position[(1, 1)] - 4.).abs() < 1e-12);
    /// assert!((position[(2, 2)] - 9.).abs() < 1e-12);
    /// assert!(world.is_symmetric(1e-12));
    /// ```
    #[must_use]
    pub fn rotated_by<To>(&self, rotation: Rotation<In, To>) -> Covariance<To> {
        let r = rotation.to_matrix();
        let mut r6 = Matrix6::zeros();
        r6.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        r6.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
        Covariance::from_nalgebra(r6 * self.inner * r6.transpose())
    }

    /// Re-labels this covariance as being along the axes of `NewIn`, unchanged.
    #[must_use]
    pub fn with_same_components_in<NewIn>(self) -> Covariance<NewIn> {
        Covariance::from_nalgebra(self.inner)
    }
}

impl<In> Default for Covariance<In> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<In> PartialEq<Self> for Covariance<In> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

// Covariance<From> * Rotation<From, To> -> Covariance<To>
impl<From, To> Mul<Rotation<From, To>> for Covariance<From> {
    type Output = Covariance<To>;

    fn mul(self, rhs: Rotation<From, To>) -> Self::Output {
        self.rotated_by(rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Covariance<In> {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Matrix6::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Covariance<In> {
    fn default_max_relative() -> Self::Epsilon {
        Matrix6::default_max_relative()
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
mod tests {
    use super::Covariance;
    use crate::coordinate_systems::{Utm, World};
    use crate::math::tests::bounded;
    use crate::math::Rotation;
    use crate::Matrix6;
    use approx::assert_relative_eq;
    use quickcheck::{quickcheck, Arbitrary, Gen};
    use uom::si::{angle::degree, f64::Angle};

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn yaw(degrees: f64) -> Rotation<Utm, World> {
        // SAFETY: test frames
        unsafe { Rotation::from_tait_bryan_angles(d(degrees), d(0.), d(0.)) }
    }

    #[derive(Debug, Clone)]
    struct SymmetricPsd(Covariance<Utm>);

    impl Arbitrary for SymmetricPsd {
        fn arbitrary(g: &mut Gen) -> Self {
            let a = Matrix6::from_fn(|_, _| bounded(g, 10.));
            Self(Covariance::from_nalgebra(a * a.transpose()))
        }
    }

    #[derive(Debug, Clone)]
    struct AnyRotation(Rotation<Utm, World>);

    impl Arbitrary for AnyRotation {
        fn arbitrary(g: &mut Gen) -> Self {
            // SAFETY: test frames
            Self(unsafe {
                Rotation::from_tait_bryan_angles(
                    d(bounded(g, 180.)),
                    d(bounded(g, 90.)),
                    d(bounded(g, 180.)),
                )
            })
        }
    }

    fn sorted_eigenvalues(m: &Matrix6) -> Vec<f64> {
        let mut values: Vec<f64> = m.symmetric_eigen().eigenvalues.iter().copied().collect();
        values.sort_by(f64::total_cmp);
        values
    }

    quickcheck! {
        fn rotation_preserves_eigenvalues_and_symmetry(cov: SymmetricPsd, rotation: AnyRotation) -> () {
            let rotated = cov.0 * rotation.0;
            assert!(rotated.is_symmetric(1e-9));
            let before = sorted_eigenvalues(cov.0.as_matrix());
            let after = sorted_eigenvalues(rotated.as_matrix());
            for (b, a) in before.iter().zip(&after) {
                assert_relative_eq!(b, a, epsilon = 1e-8, max_relative = 1e-9);
            }
        }

        fn rotating_back_restores_original(cov: SymmetricPsd, rotation: AnyRotation) -> () {
            let back = (cov.0 * rotation.0) * rotation.0.inverse();
            assert_relative_eq!(back, cov.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn identity_rotation_is_a_no_op() {
        let cov = Covariance::<Utm>::from_variances([1., 2., 3.], [0.1, 0.2, 0.3]);
        assert_relative_eq!(cov * yaw(0.), cov.with_same_components_in::<World>());
    }

    #[test]
    fn quarter_turn_swaps_horizontal_variances() {
        let cov = Covariance::<Utm>::from_variances([4., 1., 9.], [0.01, 0.04, 0.09]);
        let rotated = cov * yaw(90.);
        let position = rotated.position_block();
        assert_relative_eq!(position[(0, 0)], 1., epsilon = 1e-12);
        assert_relative_eq!(position[(1, 1)], 4., epsilon = 1e-12);
        assert_relative_eq!(position[(2, 2)], 9., epsilon = 1e-12);

        // the orientation block goes through the same 3×3 rotation, so roll and pitch variances
        // swap as well
        let orientation = rotated.orientation_block();
        assert_relative_eq!(orientation[(0, 0)], 0.04, epsilon = 1e-12);
        assert_relative_eq!(orientation[(1, 1)], 0.01, epsilon = 1e-12);
        assert_relative_eq!(orientation[(2, 2)], 0.09, epsilon = 1e-12);
    }

    #[test]
    fn cross_blocks_stay_zero_for_block_diagonal_input() {
        let rotated = Covariance::<Utm>::from_variances([4., 1., 9.], [1., 2., 3.]) * yaw(33.);
        let m = rotated.as_matrix();
        assert_relative_eq!(m.fixed_view::<3, 3>(0, 3).amax(), 0., epsilon = 1e-12);
        assert_relative_eq!(m.fixed_view::<3, 3>(3, 0).amax(), 0., epsilon = 1e-12);
    }

    #[test]
    fn row_major_interchange() {
        let values: [f64; 36] = std::array::from_fn(|i| i as f64);
        let cov = Covariance::<Utm>::from_row_slice(&values);
        assert_eq!(cov.as_matrix()[(0, 1)], 1.);
        assert_eq!(cov.as_matrix()[(1, 0)], 6.);
        assert_eq!(cov.to_row_major(), values);
        assert!(!cov.is_symmetric(1e-9));
        assert!(Covariance::<Utm>::zero().is_symmetric(0.));
    }
}
