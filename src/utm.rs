//! Universal Transverse Mercator projection of [`Wgs84`] positions.
//!
//! The forward and inverse mappings use Krüger's series expanded to sixth order in the third
//! flattening `n`, following C. F. F. Karney, "Transverse Mercator with an accuracy of a few
//! nanometers", J. Geodesy 85 (2011). Within a zone this is accurate to well below a millimeter.

use crate::coordinate_systems::Utm;
use crate::error::{GeonavError, Result};
use crate::geodetic::{Wgs84, ECCENTRICITY_SQ, FLATTENING, SEMI_MAJOR_AXIS};
use crate::util::BoundedAngle;
use crate::Coordinate;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scale factor on the central meridian.
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Southern and northern limits of the UTM grid, in degrees.
const MIN_LATITUDE: f64 = -80.0;
const MAX_LATITUDE: f64 = 84.0;
// degree/radian round trips through uom are not exact
const BAND_SLACK_DEG: f64 = 1e-9;

/// Latitude band letters, 8° each from 80°S; X is stretched to 84°N.
const BANDS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";

/// A UTM zone: the 6° longitude strip number plus the 8° latitude band letter.
///
/// Displays (and parses) in the usual compact form, eg `15T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct UtmZone {
    number: u8,
    band: char,
}

impl UtmZone {
    /// Constructs a zone from its number (1 to 60) and band letter (C to X, without I and O).
    pub fn new(number: u8, band: char) -> Result<Self> {
        let band = band.to_ascii_uppercase();
        if !(1..=60).contains(&number) || !band.is_ascii() || !BANDS.contains(&(band as u8)) {
            return Err(GeonavError::InvalidUtmZone(format!("{number}{band}")));
        }
        Ok(Self { number, band })
    }

    /// Computes the zone a position falls into, including the Norway and Svalbard exceptions.
    ///
    /// Fails with [`GeonavError::InvalidLatitude`] outside [-80°, 84°].
    pub fn containing(position: &Wgs84) -> Result<Self> {
        let lat = position.latitude().get::<degree>();
        if !(MIN_LATITUDE - BAND_SLACK_DEG..=MAX_LATITUDE + BAND_SLACK_DEG).contains(&lat) {
            return Err(GeonavError::InvalidLatitude { latitude_deg: lat });
        }
        let lon = position.longitude().get::<degree>();

        let mut number = (((lon + 180.) / 6.).floor() as i32 + 1).clamp(1, 60) as u8;
        if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
            number = 32;
        }
        if (72.0..84.0).contains(&lat) {
            number = match lon {
                l if (0.0..9.0).contains(&l) => 31,
                l if (9.0..21.0).contains(&l) => 33,
                l if (21.0..33.0).contains(&l) => 35,
                l if (33.0..42.0).contains(&l) => 37,
                _ => number,
            };
        }

        let band_index = (((lat + 80.) / 8.).floor().max(0.) as usize).min(BANDS.len() - 1);
        Ok(Self {
            number,
            band: char::from(BANDS[band_index]),
        })
    }

    #[must_use]
    pub fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub fn band(&self) -> char {
        self.band
    }

    /// Bands N and above lie north of the equator.
    #[must_use]
    pub fn is_northern(&self) -> bool {
        self.band >= 'N'
    }

    /// Longitude of the zone's central meridian.
    #[must_use]
    pub fn central_meridian(&self) -> Angle {
        Angle::new::<degree>(f64::from(self.number - 1) * 6. - 180. + 3.)
    }
}

impl Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.band)
    }
}

impl FromStr for UtmZone {
    type Err = GeonavError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GeonavError::InvalidUtmZone(s.to_owned());
        let s = s.trim();
        let band = s.chars().last().ok_or_else(invalid)?;
        let number = s[..s.len() - band.len_utf8()]
            .parse::<u8>()
            .map_err(|_| invalid())?;
        Self::new(number, band).map_err(|_| invalid())
    }
}

impl TryFrom<String> for UtmZone {
    type Error = GeonavError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<UtmZone> for String {
    fn from(zone: UtmZone) -> Self {
        zone.to_string()
    }
}

/// A position on the UTM grid.
///
/// Unlike [`Coordinate<Utm>`], this carries its [`UtmZone`], which is needed to map it back to
/// [`Wgs84`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtmCoordinate {
    easting: Length,
    northing: Length,
    altitude: Length,
    zone: UtmZone,
}

impl UtmCoordinate {
    /// Assembles a grid position. No check is made that it lies within `zone`.
    pub fn new(
        easting: impl Into<Length>,
        northing: impl Into<Length>,
        altitude: impl Into<Length>,
        zone: UtmZone,
    ) -> Self {
        Self {
            easting: easting.into(),
            northing: northing.into(),
            altitude: altitude.into(),
            zone,
        }
    }

    /// Distance east of the zone's false origin, 500km west of its central meridian.
    #[must_use]
    pub fn easting(&self) -> Length {
        self.easting
    }

    /// Distance north of the equator, offset by 10 000km in the southern hemisphere.
    #[must_use]
    pub fn northing(&self) -> Length {
        self.northing
    }

    /// Height above the ellipsoid, carried over unchanged from the geodetic position.
    #[must_use]
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    #[must_use]
    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    /// Drops the zone, placing this position in the zone-less [`Utm`] frame.
    #[must_use]
    pub fn to_coordinate(&self) -> Coordinate<Utm> {
        Coordinate::from_cartesian(self.easting, self.northing, self.altitude)
    }

    /// Maps this grid position back onto the ellipsoid, using its own zone.
    #[doc(alias = "toGeodetic")]
    #[must_use]
    pub fn to_wgs84(&self) -> Wgs84 {
        let series = Series::get();
        let x = self.easting.get::<meter>() - FALSE_EASTING;
        let mut y = self.northing.get::<meter>();
        if !self.zone.is_northern() {
            y -= FALSE_NORTHING_SOUTH;
        }

        let eta = x / (K0 * series.a);
        let xi = y / (K0 * series.a);

        let (mut xi_p, mut eta_p) = (xi, eta);
        for (j, beta) in series.beta.iter().enumerate() {
            let k = 2. * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let tau_p = xi_p.sin() / (eta_p.sinh().powi(2) + xi_p.cos().powi(2)).sqrt();
        let tau = conformal_to_geodetic_tangent(tau_p);
        let latitude = tau.atan();
        let longitude =
            eta_p.sinh().atan2(xi_p.cos()) + self.zone.central_meridian().get::<radian>();

        // atan never leaves (-pi/2, pi/2), so no latitude validation is needed
        Wgs84::from_validated_parts(
            Angle::new::<radian>(latitude),
            Angle::new::<radian>(longitude),
            self.altitude,
        )
    }
}

impl Display for UtmCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.3}mE {:.3}mN {:.3}m",
            self.zone,
            self.easting.get::<meter>(),
            self.northing.get::<meter>(),
            self.altitude.get::<meter>()
        )
    }
}

impl From<UtmCoordinate> for Coordinate<Utm> {
    fn from(value: UtmCoordinate) -> Self {
        value.to_coordinate()
    }
}

impl Wgs84 {
    /// Projects this position onto the UTM grid in the zone it naturally falls into.
    ///
    /// Fails with [`GeonavError::InvalidLatitude`] outside [-80°, 84°].
    ///
    /// ```
    /// use geonav::geodetic::Wgs84;
    /// use uom::si::length::meter;
    ///
    /// let fix = Wgs84::from_degrees_and_meters(45., -93., 250.)?;
    /// let utm = fix.to_utm()?;
    /// assert_eq!(utm.zone().to_string(), "15T");
    /// // -93° is the central meridian of zone 15
    /// assert!((utm.easting().get::<meter>() - 500_000.).abs() < 1e-6);
    /// assert!((utm.altitude().get::<meter>() - 250.).abs() < 1e-9);
    ///
    /// let polar = Wgs84::from_degrees_and_meters(85., 0., 0.)?;
    /// assert!(polar.to_utm().is_err());
    /// # Ok::<(), geonav::GeonavError>(())
    /// ```
    #[doc(alias = "toUtm")]
    pub fn to_utm(&self) -> Result<UtmCoordinate> {
        let zone = UtmZone::containing(self)?;
        self.to_utm_in_zone(zone)
    }

    /// Projects this position onto the UTM grid of `zone`, even if it lies outside that zone.
    ///
    /// The hemisphere (false northing) follows the zone's band. Accuracy degrades slowly with
    /// distance from the zone's central meridian.
    pub fn to_utm_in_zone(&self, zone: UtmZone) -> Result<UtmCoordinate> {
        let lat_deg = self.latitude().get::<degree>();
        if !(MIN_LATITUDE - BAND_SLACK_DEG..=MAX_LATITUDE + BAND_SLACK_DEG).contains(&lat_deg) {
            return Err(GeonavError::InvalidLatitude {
                latitude_deg: lat_deg,
            });
        }

        let series = Series::get();
        let phi = self.latitude().get::<radian>();
        let lambda = BoundedAngle::new(self.longitude - zone.central_meridian()).to_signed_range();

        let e = ECCENTRICITY_SQ.sqrt();
        let tau = phi.tan();
        let sigma = (e * (e * tau / (1. + tau * tau).sqrt()).atanh()).sinh();
        let tau_p = tau * (1. + sigma * sigma).sqrt() - sigma * (1. + tau * tau).sqrt();

        let xi_p = tau_p.atan2(lambda.cos());
        let eta_p = (lambda.sin() / (tau_p * tau_p + lambda.cos().powi(2)).sqrt()).asinh();

        let (mut xi, mut eta) = (xi_p, eta_p);
        for (j, alpha) in series.alpha.iter().enumerate() {
            let k = 2. * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let easting = K0 * series.a * eta + FALSE_EASTING;
        let mut northing = K0 * series.a * xi;
        if !zone.is_northern() {
            northing += FALSE_NORTHING_SOUTH;
        }

        Ok(UtmCoordinate {
            easting: Length::new::<meter>(easting),
            northing: Length::new::<meter>(northing),
            altitude: self.altitude(),
            zone,
        })
    }
}

/// Solves τ' = τ·√(1+σ²) − σ·√(1+τ²) for τ by Newton iteration (Karney 2011, eqs 19-21).
fn conformal_to_geodetic_tangent(tau_p: f64) -> f64 {
    let e = ECCENTRICITY_SQ.sqrt();
    let mut tau = tau_p;
    for _ in 0..10 {
        let sigma = (e * (e * tau / (1. + tau * tau).sqrt()).atanh()).sinh();
        let tau_i_p = tau * (1. + sigma * sigma).sqrt() - sigma * (1. + tau * tau).sqrt();
        let delta = (tau_p - tau_i_p) / (1. + tau_i_p * tau_i_p).sqrt()
            * (1. + (1. - ECCENTRICITY_SQ) * tau * tau)
            / ((1. - ECCENTRICITY_SQ) * (1. + tau * tau).sqrt());
        tau += delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    tau
}

/// Ellipsoid-dependent series coefficients.
struct Series {
    /// Rectifying radius: 2π·A is the circumference of a meridian ellipse.
    a: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl Series {
    fn get() -> &'static Series {
        static SERIES: std::sync::OnceLock<Series> = std::sync::OnceLock::new();
        SERIES.get_or_init(Series::wgs84)
    }

    fn wgs84() -> Self {
        let n = FLATTENING / (2. - FLATTENING);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let a = SEMI_MAJOR_AXIS / (1. + n) * (1. + n2 / 4. + n4 / 64. + n6 / 256.);

        let alpha = [
            n / 2. - 2. * n2 / 3. + 5. * n3 / 16. + 41. * n4 / 180. - 127. * n5 / 288.
                + 7891. * n6 / 37800.,
            13. * n2 / 48. - 3. * n3 / 5. + 557. * n4 / 1440. + 281. * n5 / 630.
                - 1983433. * n6 / 1935360.,
            61. * n3 / 240. - 103. * n4 / 140. + 15061. * n5 / 26880. + 167603. * n6 / 181440.,
            49561. * n4 / 161280. - 179. * n5 / 168. + 6601661. * n6 / 7257600.,
            34729. * n5 / 80640. - 3418889. * n6 / 1995840.,
            212378941. * n6 / 319334400.,
        ];
        let beta = [
            n / 2. - 2. * n2 / 3. + 37. * n3 / 96. - n4 / 360. - 81. * n5 / 512.
                + 96199. * n6 / 604800.,
            n2 / 48. + n3 / 15. - 437. * n4 / 1440. + 46. * n5 / 105. - 1118711. * n6 / 3870720.,
            17. * n3 / 480. - 37. * n4 / 840. - 209. * n5 / 4480. + 5569. * n6 / 90720.,
            4397. * n4 / 161280. - 11. * n5 / 504. - 830251. * n6 / 7257600.,
            4583. * n5 / 161280. - 108847. * n6 / 3991680.,
            20648693. * n6 / 638668800.,
        ];

        Self { a, alpha, beta }
    }
}

#[cfg(test)]
mod tests {
    use super::{UtmCoordinate, UtmZone};
    use crate::error::GeonavError;
    use crate::geodetic::tests::InUtmBand;
    use crate::geodetic::Wgs84;
    use approx::assert_relative_eq;
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::{angle::degree, length::meter};

    fn wgs(lat: f64, lon: f64, alt: f64) -> Wgs84 {
        Wgs84::from_degrees_and_meters(lat, lon, alt).unwrap()
    }

    fn assert_round_trip(position: Wgs84) {
        let utm = position.to_utm().unwrap();
        let back = utm.to_wgs84();
        assert_relative_eq!(
            back.latitude().get::<degree>(),
            position.latitude().get::<degree>(),
            epsilon = 1e-7
        );
        // compare longitudes modulo the antimeridian
        let dlon = (back.longitude() - position.longitude()).get::<degree>();
        let dlon = (dlon + 180.).rem_euclid(360.) - 180.;
        assert!(dlon.abs() < 1e-7, "longitude off by {dlon}° for {position}");
        assert_eq!(back.altitude(), position.altitude());
    }

    quickcheck! {
        fn round_trip_within_band(position: InUtmBand) -> () {
            assert_round_trip(position.0);
        }
    }

    #[rstest]
    #[case(wgs(-80., 0., 0.))]
    #[case(wgs(84., 179.999, 0.))]
    #[case(wgs(0., -180., 0.))]
    #[case(wgs(-0.000001, 3., 0.))]
    #[case(wgs(60., 5.9, 0.))]
    #[case(wgs(78., 20.9, 0.))]
    fn round_trip_at_edges(#[case] position: Wgs84) {
        assert_round_trip(position);
    }

    #[rstest]
    #[case(wgs(0., -93., 0.), 500_000., 0., "15N")]
    #[case(wgs(0., 3., 0.), 500_000., 0., "31N")]
    #[case(wgs(-0.000_001, 3., 0.), 500_000., 10_000_000., "31M")]
    fn on_central_meridian_at_equator(
        #[case] position: Wgs84,
        #[case] easting: f64,
        #[case] northing: f64,
        #[case] zone: &str,
    ) {
        let utm = position.to_utm().unwrap();
        assert_eq!(utm.zone().to_string(), zone);
        assert_relative_eq!(utm.easting().get::<meter>(), easting, epsilon = 1e-6);
        assert_relative_eq!(utm.northing().get::<meter>(), northing, epsilon = 0.2);
    }

    #[test]
    fn known_projection() {
        // meridian arc length to 45°N is 4 984 944.378 m, scaled by k0
        let utm = wgs(45., -93., 0.).to_utm().unwrap();
        assert_eq!(utm.zone(), "15T".parse().unwrap());
        assert_relative_eq!(utm.easting().get::<meter>(), 500_000., epsilon = 1e-6);
        assert_relative_eq!(utm.northing().get::<meter>(), 4_982_950.400, epsilon = 1e-2);
    }

    #[test]
    fn central_meridian_is_symmetric() {
        let east = wgs(30., -91., 0.).to_utm().unwrap();
        let west = wgs(30., -95., 0.).to_utm().unwrap();
        assert_eq!(east.zone(), west.zone());
        assert_relative_eq!(
            east.easting().get::<meter>() - 500_000.,
            500_000. - west.easting().get::<meter>(),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            east.northing().get::<meter>(),
            west.northing().get::<meter>(),
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case(-80.000_1)]
    #[case(84.000_1)]
    #[case(-89.)]
    #[case(89.)]
    fn rejects_latitude_outside_grid(#[case] latitude: f64) {
        let err = wgs(latitude, 10., 0.).to_utm().unwrap_err();
        assert!(matches!(err, GeonavError::InvalidLatitude { .. }));
    }

    #[rstest]
    #[case(wgs(60., 5., 0.), "32V")]
    #[case(wgs(60., 2.9, 0.), "31V")]
    #[case(wgs(55.9, 5., 0.), "31U")]
    #[case(wgs(75., 8.9, 0.), "31X")]
    #[case(wgs(75., 9., 0.), "33X")]
    #[case(wgs(75., 25., 0.), "35X")]
    #[case(wgs(75., 40., 0.), "37X")]
    #[case(wgs(75., 45., 0.), "38X")]
    #[case(wgs(83.9, -179., 0.), "1X")]
    #[case(wgs(-79.9, 179.9, 0.), "60C")]
    #[case(wgs(45., 267., 0.), "15T")]
    fn zone_exceptions_and_wrapping(#[case] position: Wgs84, #[case] zone: &str) {
        assert_eq!(position.to_utm().unwrap().zone().to_string(), zone);
    }

    #[test]
    fn forced_zone_reprojection_round_trips() {
        let position = wgs(45., -89.5, 3.);
        let forced = position.to_utm_in_zone("15T".parse().unwrap()).unwrap();
        assert_eq!(forced.zone().number(), 15);
        assert!(forced.easting().get::<meter>() > 700_000.);
        let back = forced.to_wgs84();
        assert_relative_eq!(back.latitude().get::<degree>(), 45., epsilon = 1e-7);
        assert_relative_eq!(back.longitude().get::<degree>(), -89.5, epsilon = 1e-7);
    }

    #[rstest]
    #[case("15T", Some((15, 'T')))]
    #[case(" 1c", Some((1, 'C')))]
    #[case("60X", Some((60, 'X')))]
    #[case("61N", None)]
    #[case("0N", None)]
    #[case("15I", None)]
    #[case("15", None)]
    #[case("", None)]
    fn zone_parsing(#[case] input: &str, #[case] expected: Option<(u8, char)>) {
        let parsed = input.parse::<UtmZone>();
        match expected {
            Some((number, band)) => {
                let zone = parsed.unwrap();
                assert_eq!((zone.number(), zone.band()), (number, band));
            }
            None => assert_eq!(parsed, Err(GeonavError::InvalidUtmZone(input.to_owned()))),
        }
    }

    #[test]
    fn zone_properties() {
        let zone: UtmZone = "15T".parse().unwrap();
        assert!(zone.is_northern());
        assert_relative_eq!(zone.central_meridian().get::<degree>(), -93., epsilon = 1e-9);
        assert!(!UtmZone::new(31, 'M').unwrap().is_northern());
    }

    #[test]
    fn display() {
        let utm = UtmCoordinate::new(
            uom::si::f64::Length::new::<meter>(500_000.),
            uom::si::f64::Length::new::<meter>(0.),
            uom::si::f64::Length::new::<meter>(12.5),
            UtmZone::new(15, 'N').unwrap(),
        );
        insta::assert_snapshot!(utm, @"15N 500000.000mE 0.000mN 12.500m");
    }
}
