use crate::error::{GeonavError, Result};
use crate::util::BoundedAngle;
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// WGS84 defining parameters, NIMA TR8350.2 table 3.1
#[doc(alias = "equatorial radius")]
#[doc(alias = "a")]
pub(crate) const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
#[doc(alias = "1/f")]
const FLATTENING_FACTOR: f64 = 298.257_223_563;
#[doc(alias = "f")]
pub(crate) const FLATTENING: f64 = 1.0 / FLATTENING_FACTOR;
// e^2 = 1 - b^2/a^2 = 2f - f^2
#[doc(alias = "e^2")]
pub(crate) const ECCENTRICITY_SQ: f64 = 2.0 * FLATTENING - FLATTENING * FLATTENING;

// degree to radian conversion may land a hair past the pole
const POLE_SLACK_RAD: f64 = 1e-12;

/// A location on (or above) the earth in the [World Geodetic System
/// '84](https://en.wikipedia.org/wiki/World_Geodetic_System#WGS_84).
///
/// This is the frame GPS receivers report in. Use [`Wgs84::to_utm`] to move it onto the
/// projected UTM grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wgs84 {
    // NOTE: uom does not say how angles are normalized, so the accessors normalize on the way out
    pub(crate) latitude: Angle,
    pub(crate) longitude: Angle,
    altitude: Length,
}

impl Wgs84 {
    /// Constructs a geodetic position from latitude, longitude, and altitude.
    ///
    /// The latitude must be in [-90°,90°], otherwise [`GeonavError::InvalidLatitude`] is
    /// returned. Latitudes are never wrapped, so 405° is rejected rather than read as 45°. The altitude is height above the WGS84
    /// reference ellipsoid.
    pub fn build(
        Components {
            latitude,
            longitude,
            altitude,
        }: Components,
    ) -> Result<Self> {
        Ok(Self::builder()
            .latitude(latitude)?
            .longitude(longitude)
            .altitude(altitude)
            .build())
    }

    /// Provides a constructor for a [`Wgs84`] position.
    pub fn builder() -> Builder<MissingLatitude, MissingLongitude, MissingAltitude> {
        Builder {
            under_construction: Wgs84 {
                latitude: Angle::ZERO,
                longitude: Angle::ZERO,
                altitude: Length::ZERO,
            },
            has: (PhantomData, PhantomData, PhantomData),
        }
    }

    /// Assembles a position whose latitude is already known to be in [-90°, 90°].
    pub(crate) fn from_validated_parts(latitude: Angle, longitude: Angle, altitude: Length) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Constructs a geodetic position from plain degrees and meters.
    pub fn from_degrees_and_meters(
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
    ) -> Result<Self> {
        Self::build(Components {
            latitude: Angle::new::<degree>(latitude_deg),
            longitude: Angle::new::<degree>(longitude_deg),
            altitude: Length::new::<meter>(altitude_m),
        })
    }

    /// Computes the [great-circle distance] between two locations on the surface of the earth.
    ///
    /// This treats the earth as a sphere with the equatorial radius, so it is an approximation.
    ///
    /// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
    #[doc(alias = "great_circle_distance")]
    #[must_use]
    pub fn haversine_distance_on_surface(&self, other: &Wgs84) -> Length {
        let lat_a = self.latitude.get::<radian>();
        let lat_b = other.latitude.get::<radian>();
        let delta_lat = lat_b - lat_a;
        let delta_lon = other.longitude.get::<radian>() - self.longitude.get::<radian>();

        let inner = 1. - delta_lat.cos() + lat_a.cos() * lat_b.cos() * (1. - delta_lon.cos());
        let central_angle = 2. * (inner / 2.).sqrt().asin();
        Length::new::<meter>(central_angle * SEMI_MAJOR_AXIS)
    }

    /// Returns the latitude, north of the equator, in [-90°, 90°].
    #[must_use]
    pub fn latitude(&self) -> Angle {
        self.latitude
    }

    /// Returns the longitude east of the reference meridian, in [-180°, 180°).
    #[must_use]
    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.longitude).to_signed_range())
    }

    /// Returns the height above the WGS84 ellipsoid.
    ///
    /// Note that this is neither height above mean sea level nor above ground.
    #[must_use]
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    /// Returns a copy of this position with its altitude replaced.
    #[must_use]
    pub fn with_altitude(mut self, altitude: impl Into<Length>) -> Self {
        self.altitude = altitude.into();
        self
    }
}

impl Display for Wgs84 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude();
        let ns = if lat.is_sign_negative() { 'S' } else { 'N' };
        let lon = self.longitude();
        let ew = if lon.is_sign_negative() { 'W' } else { 'E' };
        write!(
            f,
            "{}°{ns}, {}°{ew}, {}m",
            lat.abs().get::<degree>(),
            lon.abs().get::<degree>(),
            self.altitude.get::<meter>()
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Wgs84 {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // meters along the surface; a centimeter is far below GPS noise
        Length::new::<meter>(0.01)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.haversine_distance_on_surface(other) <= epsilon
            && self
                .altitude
                .get::<meter>()
                .abs_diff_eq(&other.altitude.get::<meter>(), epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Wgs84 {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.haversine_distance_on_surface(other) <= epsilon
            && self.altitude.get::<meter>().relative_eq(
                &other.altitude.get::<meter>(),
                epsilon.get::<meter>(),
                max_relative.get::<meter>(),
            )
    }
}

/// Argument type for [`Wgs84::build`], and the unvalidated position carried by a
/// [`NavSample`](crate::NavSample).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[must_use]
pub struct Components {
    pub latitude: Angle,
    pub longitude: Angle,
    /// Height above the WGS84 reference ellipsoid.
    pub altitude: Length,
}

impl Components {
    /// Returns true if none of latitude, longitude and altitude is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude.is_finite()
    }
}

/// Used to indicate that a partially-constructed [`Wgs84`] is missing the latitude component.
pub struct MissingLatitude;
/// Used to indicate that a partially-constructed [`Wgs84`] has the latitude component set.
pub struct HasLatitude;
/// Used to indicate that a partially-constructed [`Wgs84`] is missing the longitude component.
pub struct MissingLongitude;
/// Used to indicate that a partially-constructed [`Wgs84`] has the longitude component set.
pub struct HasLongitude;
/// Used to indicate that a partially-constructed [`Wgs84`] is missing the altitude component.
pub struct MissingAltitude;
/// Used to indicate that a partially-constructed [`Wgs84`] has the altitude component set.
pub struct HasAltitude;

/// Typestate builder for a [`Wgs84`] position.
///
/// Construct one through [`Wgs84::builder`]; [`Builder::build`] only exists once every
/// component has been provided.
#[derive(Debug)]
#[must_use]
pub struct Builder<Latitude, Longitude, Altitude> {
    under_construction: Wgs84,
    has: (
        PhantomData<Latitude>,
        PhantomData<Longitude>,
        PhantomData<Altitude>,
    ),
}

impl<L1, L2, A> Clone for Builder<L1, L2, A> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<L1, L2, A> Copy for Builder<L1, L2, A> {}

impl<L1, L2, A> Builder<L1, L2, A> {
    /// Sets the latitude, rejecting values outside [-90°,90°].
    pub fn latitude(mut self, latitude: impl Into<Angle>) -> Result<Builder<HasLatitude, L2, A>> {
        let latitude = latitude.into();
        let pole = std::f64::consts::FRAC_PI_2 + POLE_SLACK_RAD;
        if !(-pole..=pole).contains(&latitude.get::<radian>()) {
            return Err(GeonavError::InvalidLatitude {
                latitude_deg: latitude.get::<degree>(),
            });
        }
        self.under_construction.latitude = latitude;
        Ok(Builder {
            under_construction: self.under_construction,
            has: (PhantomData::<HasLatitude>, self.has.1, self.has.2),
        })
    }

    pub fn longitude(mut self, longitude: impl Into<Angle>) -> Builder<L1, HasLongitude, A> {
        self.under_construction.longitude = longitude.into();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, PhantomData::<HasLongitude>, self.has.2),
        }
    }

    pub fn altitude(mut self, altitude: impl Into<Length>) -> Builder<L1, L2, HasAltitude> {
        self.under_construction.altitude = altitude.into();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, self.has.1, PhantomData::<HasAltitude>),
        }
    }
}

impl Builder<HasLatitude, HasLongitude, HasAltitude> {
    #[must_use]
    pub fn build(self) -> Wgs84 {
        self.under_construction
    }
}
