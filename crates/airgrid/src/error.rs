use thiserror::Error;

/// Errors surfaced by every fallible operation in this crate.
///
/// Variants are grouped by behaviour rather than by call site, per the
/// error handling design: a coordinate out of range and a code with a bad
/// hemisphere letter are both "the caller gave us something we can't place
/// on the grid", even though they're caught in different functions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("longitude {0} is out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("altitude {0} is out of range [0, {MAX_ELEVATION}]", MAX_ELEVATION = crate::codec::altitude::MAX_ELEVATION)]
    AltitudeOutOfRange(f64),

    #[error("level {0} is out of range [1, 16]")]
    LevelOutOfRange(u8),

    #[error("bounding box has lon_min >= lon_max or lat_min >= lat_max")]
    InvalidBBox,

    #[error("route requires at least one waypoint")]
    EmptyWaypoints,

    #[error("code is empty")]
    EmptyCode,

    #[error("code length {0} does not correspond to a known level")]
    InvalidCodeLength(usize),

    #[error("code has an invalid hemisphere indicator {0:?}, expected 'N' or 'S'")]
    InvalidHemisphere(char),

    #[error("longitude field {0:?} is not two digits")]
    InvalidLongitudeDigits(String),

    #[error("latitude letter {0:?} is outside A..W")]
    InvalidLatitudeLetter(char),

    #[error("code is truncated: expected a digit at position {0}")]
    TruncatedCode(usize),

    #[error("non-digit character {0:?} at position {1}")]
    InvalidDigit(char, usize),

    #[error("unknown attribute category {0:?}")]
    UnknownCategory(String),

    #[error("unknown grid code {0:?}")]
    UnknownCode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
