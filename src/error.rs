use thiserror::Error;

/// Everything that can go wrong while projecting, registering a datum, or relaying a sample.
///
/// None of these are fatal to the process. The relay drops the offending sample and carries on;
/// it is up to the caller to decide whether a configuration error should abort startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeonavError {
    /// The latitude lies outside the band in which the projection is defined ([-80°, 84°] for
    /// UTM, [-90°, 90°] for any geodetic position).
    #[error("latitude {latitude_deg}° is outside the valid band")]
    InvalidLatitude { latitude_deg: f64 },

    /// A frame conversion was requested before any datum was registered.
    #[error("no datum has been set")]
    DatumNotSet,

    /// The one-shot datum registry was written twice through a shared reference.
    #[error("datum has already been set; re-datum requires exclusive access")]
    DatumAlreadySet,

    /// The position of a sample contains NaN or infinity.
    #[error("non-finite position ({latitude_deg}, {longitude_deg}, {altitude_m})")]
    NonFiniteInput {
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
    },

    /// The configured datum could not be parsed.
    #[error("malformed datum configuration: {0}")]
    MalformedDatumConfig(String),

    #[error("invalid frame id {0:?}")]
    InvalidFrameId(String),

    #[error("invalid UTM zone {0:?}")]
    InvalidUtmZone(String),
}

pub type Result<T, E = GeonavError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::GeonavError;

    #[test]
    fn messages_name_the_offending_values() {
        let err = GeonavError::InvalidLatitude { latitude_deg: 85. };
        assert_eq!(err.to_string(), "latitude 85° is outside the valid band");

        let err = GeonavError::NonFiniteInput {
            latitude_deg: f64::NAN,
            longitude_deg: 1.,
            altitude_m: 2.,
        };
        assert_eq!(err.to_string(), "non-finite position (NaN, 1, 2)");

        let err = GeonavError::InvalidUtmZone("61Q".into());
        assert_eq!(err.to_string(), "invalid UTM zone \"61Q\"");
    }
}
